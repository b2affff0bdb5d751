//! Time-domain heart-rate variability from detected pulse peaks.
use crate::dsp::stats;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HrvMetrics {
    /// Root mean square of successive IBI differences (s).
    pub rmssd_s: Option<f64>,
    /// Population standard deviation of the IBIs (s).
    pub sdnn_s: Option<f64>,
    /// Inter-beat intervals (s), one fewer than the peaks.
    pub ibi_s: Vec<f64>,
}

impl HrvMetrics {
    pub fn mean_ibi_s(&self) -> Option<f64> {
        stats::mean(&self.ibi_s)
    }
    /// Heart rate implied by the mean interval, useful as a cross-check of
    /// the spectral estimate.
    pub fn mean_hr_bpm(&self) -> Option<f64> {
        self.mean_ibi_s()
            .filter(|ibi| *ibi > 0.0)
            .map(|ibi| 60.0 / ibi)
    }
}

pub fn inter_beat_intervals(peaks: &[usize], fs: f64) -> Vec<f64> {
    peaks
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) as f64 / fs)
        .collect()
}

/// RMSSD and SDNN need at least three peaks (two intervals).
pub fn hrv_time_domain(peaks: &[usize], fs: f64) -> HrvMetrics {
    if peaks.len() < 3 || !(fs > 0.0) {
        return HrvMetrics::default();
    }
    let ibi = inter_beat_intervals(peaks, fs);
    let sdnn = stats::std_dev(&ibi);
    let successive: Vec<f64> = ibi
        .windows(2)
        .map(|pair| {
            let diff = pair[1] - pair[0];
            diff * diff
        })
        .collect();
    let rmssd = stats::mean(&successive).map(f64::sqrt);
    HrvMetrics {
        rmssd_s: rmssd,
        sdnn_s: sdnn,
        ibi_s: ibi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    #[test]
    fn regular_train_has_no_variability() {
        let peaks: Vec<usize> = (0..12).map(|k| 10 + k * 25).collect();
        let hrv = hrv_time_domain(&peaks, 30.0);
        assert_relative_eq!(hrv.rmssd_s.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(hrv.sdnn_s.unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(hrv.ibi_s.len(), 11);
        assert_relative_eq!(hrv.mean_hr_bpm().unwrap(), 72.0, epsilon = 1e-9);
    }
    #[test]
    fn too_few_peaks() {
        for peaks in [vec![], vec![4], vec![4, 30]] {
            let hrv = hrv_time_domain(&peaks, 30.0);
            assert_eq!(hrv, HrvMetrics::default());
        }
    }
    #[test]
    fn alternating_intervals() {
        // IBIs 1.0, 0.5, 1.0 s at fs = 10.
        let hrv = hrv_time_domain(&[0, 10, 15, 25], 10.0);
        assert_eq!(hrv.ibi_s, vec![1.0, 0.5, 1.0]);
        assert_relative_eq!(hrv.rmssd_s.unwrap(), 0.5, epsilon = 1e-12);
        let mean: f64 = 2.5 / 3.0;
        let sdnn = ((2.0 * (1.0 - mean) * (1.0 - mean) + (0.5 - mean) * (0.5 - mean)) / 3.0).sqrt();
        assert_relative_eq!(hrv.sdnn_s.unwrap(), sdnn, epsilon = 1e-12);
    }
}
