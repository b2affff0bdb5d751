use crate::dsp::stats;
use crate::types::PeakSet;

/// Added to the standard deviation before z-scoring so flat input stays finite.
const Z_SCORE_EPSILON: f64 = 1e-8;

/// Greedy left-to-right local-maximum finder with a refractory period.
///
/// A sample is a candidate when it is strictly above both neighbours and its
/// z-score exceeds `threshold_z`. Once a peak is accepted, candidates closer
/// than `min_distance_seconds * fs` samples are dropped, even if larger.
pub fn detect_peaks(
    series: &[f64],
    fs: f64,
    min_distance_seconds: f64,
    threshold_z: f64,
) -> PeakSet {
    let n = series.len();
    if n < 3 {
        return Vec::new();
    }
    let (Some(mean), Some(std)) = (stats::mean(series), stats::std_dev(series)) else {
        return Vec::new();
    };
    let scale = std + Z_SCORE_EPSILON;
    let z: Vec<f64> = series.iter().map(|v| (v - mean) / scale).collect();
    let min_distance = min_distance_seconds * fs;
    let mut peaks = Vec::new();
    let mut last: Option<usize> = None;
    for i in 1..n - 1 {
        if !(z[i] > z[i - 1] && z[i] > z[i + 1] && z[i] > threshold_z) {
            continue;
        }
        let clear = match last {
            Some(prev) => (i - prev) as f64 >= min_distance,
            None => true,
        };
        if clear {
            peaks.push(i);
            last = Some(i);
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PEAK_MIN_DISTANCE_SECONDS, PEAK_THRESHOLD_Z};
    /// Narrow Gaussian bumps every `period_samples`, first one at `offset`.
    fn pulse_train(len: usize, period_samples: usize, offset: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let phase = (i + period_samples - offset % period_samples) % period_samples;
                let d = phase.min(period_samples - phase) as f64;
                (-(d * d) / 2.0).exp()
            })
            .collect()
    }
    #[test]
    fn pulse_train_spacing_and_count() {
        let fs = 30.0;
        for period_s in [0.5_f64, 0.8, 1.0, 1.5] {
            let period = (period_s * fs).round() as usize;
            let duration = 20.0;
            let series = pulse_train((duration * fs) as usize, period, period / 2);
            let peaks = detect_peaks(&series, fs, PEAK_MIN_DISTANCE_SECONDS, PEAK_THRESHOLD_Z);
            for pair in peaks.windows(2) {
                assert_eq!(pair[1] - pair[0], period);
            }
            let expected = (duration / period_s).floor() as i64;
            assert!(
                (peaks.len() as i64 - expected).abs() <= 1,
                "period {period_s}: {} peaks",
                peaks.len()
            );
        }
    }
    #[test]
    fn refractory_invariant_holds() {
        let fs = 29.97;
        let series: Vec<f64> = (0..900)
            .map(|i| {
                let t = i as f64 / fs;
                (2.0 * std::f64::consts::PI * 1.1 * t).sin()
                    + 0.6 * (2.0 * std::f64::consts::PI * 7.3 * t).sin()
            })
            .collect();
        let min_distance = 0.4;
        let peaks = detect_peaks(&series, fs, min_distance, PEAK_THRESHOLD_Z);
        assert!(!peaks.is_empty());
        for pair in peaks.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!((pair[1] - pair[0]) as f64 >= min_distance * fs);
        }
    }
    #[test]
    fn first_seen_wins_inside_refractory_window() {
        let mut series = vec![0.0; 40];
        series[10] = 1.0;
        series[14] = 3.0;
        series[30] = 1.0;
        let peaks = detect_peaks(&series, 10.0, 0.5, PEAK_THRESHOLD_Z);
        assert_eq!(peaks, vec![10, 30]);
    }
    #[test]
    fn flat_and_tiny_inputs_have_no_peaks() {
        assert!(detect_peaks(&[5.0; 100], 30.0, 0.4, PEAK_THRESHOLD_Z).is_empty());
        assert!(detect_peaks(&[1.0, 2.0], 30.0, 0.4, PEAK_THRESHOLD_Z).is_empty());
        assert!(detect_peaks(&[], 30.0, 0.4, PEAK_THRESHOLD_Z).is_empty());
    }
    #[test]
    fn endpoints_are_never_peaks() {
        let series = [9.0, 0.0, 0.0, 0.0, 9.0];
        assert!(detect_peaks(&series, 30.0, 0.0, PEAK_THRESHOLD_Z).is_empty());
    }
}
