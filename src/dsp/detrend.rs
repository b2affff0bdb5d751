//! Baseline removal by centred moving average.

/// Odd moving-average length for `window_seconds` at `fs`.
pub fn window_len(fs: f64, window_seconds: f64) -> usize {
    let k = (fs * window_seconds).round();
    let k = if k.is_finite() && k >= 1.0 { k as usize } else { 1 };
    if k % 2 == 0 {
        k + 1
    } else {
        k
    }
}

/// Subtract a centred moving average from `series`.
///
/// The input is edge-padded with its boundary values so the trend has one
/// value per sample. A window of one sample leaves the series unchanged.
pub fn detrend(series: &[f64], fs: f64, window_seconds: f64) -> Vec<f64> {
    let k = window_len(fs, window_seconds);
    if k <= 1 || series.is_empty() {
        return series.to_vec();
    }
    let trend = moving_average_padded(series, k);
    series.iter().zip(&trend).map(|(x, t)| x - t).collect()
}

/// Centred moving average with `k / 2` replicated samples on each side.
fn moving_average_padded(series: &[f64], k: usize) -> Vec<f64> {
    let pad = k / 2;
    let n = series.len();
    let first = series[0];
    let last = series[n - 1];
    let padded = |j: usize| -> f64 {
        if j < pad {
            first
        } else if j - pad >= n {
            last
        } else {
            series[j - pad]
        }
    };
    let mut sum: f64 = (0..k).map(padded).sum();
    let mut trend = Vec::with_capacity(n);
    trend.push(sum / k as f64);
    for i in 1..n {
        sum += padded(i + k - 1) - padded(i - 1);
        trend.push(sum / k as f64);
    }
    trend
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn window_is_forced_odd() {
        assert_eq!(window_len(30.0, 3.0), 91);
        assert_eq!(window_len(10.0, 3.0), 31);
        assert_eq!(window_len(4.0, 0.5), 3);
        assert_eq!(window_len(30.0, 0.0), 1);
    }
    #[test]
    fn constant_series_becomes_zero() {
        for value in [0.0, 1.0, 117.25, -3.5] {
            let out = detrend(&vec![value; 200], 30.0, 3.0);
            assert!(out.iter().all(|v| v.abs() < 1e-9), "value {value}");
        }
    }
    #[test]
    fn preserves_length() {
        for len in [1usize, 2, 5, 44, 91, 92, 300] {
            for window in [0.0, 0.1, 1.0, 3.0, 20.0] {
                let series: Vec<f64> = (0..len).map(|i| (i as f64 * 0.3).sin()).collect();
                assert_eq!(detrend(&series, 30.0, window).len(), len);
            }
        }
    }
    #[test]
    fn unit_window_is_noop() {
        let series = vec![1.0, 5.0, 2.0];
        assert_eq!(detrend(&series, 30.0, 0.01), series);
    }
    #[test]
    fn removes_linear_drift_in_interior() {
        let fs = 30.0;
        let series: Vec<f64> = (0..300).map(|i| 0.05 * i as f64 / fs + 10.0).collect();
        let out = detrend(&series, fs, 3.0);
        for v in &out[45..255] {
            assert!(v.abs() < 1e-9);
        }
    }
}
