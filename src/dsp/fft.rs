use std::f64::consts::PI;

use rustfft::{num_complex::Complex64, FftPlanner};

use crate::config::FrequencyBand;
use crate::dsp::stats;

/// One-sided magnitude spectrum of a Hann-windowed, mean-centred series.
#[derive(Clone, Debug, Default)]
pub struct FrequencySpectrum {
    pub sample_rate_hz: f64,
    pub frequencies_hz: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl FrequencySpectrum {
    /// Strongest in-band bin as `(frequency_hz, magnitude)`; ties keep the lowest frequency.
    pub fn peak_in(&self, band: &FrequencyBand) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for (&freq, &mag) in self.frequencies_hz.iter().zip(&self.magnitudes) {
            if !band.contains(freq) {
                continue;
            }
            match best {
                Some((_, best_mag)) if mag <= best_mag => {}
                _ => best = Some((freq, mag)),
            }
        }
        best
    }
    pub fn resolution_hz(&self) -> f64 {
        self.frequencies_hz.get(1).copied().unwrap_or(0.0)
    }
}

/// Symmetric Hann window; a single sample gets weight one.
pub fn hann(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Bins `0..=n/2` of the real FFT, `k * fs / n` apart.
pub fn magnitude_spectrum(series: &[f64], fs: f64) -> FrequencySpectrum {
    let n = series.len();
    if n == 0 {
        return FrequencySpectrum {
            sample_rate_hz: fs,
            ..FrequencySpectrum::default()
        };
    }
    let mean = stats::mean(series).unwrap_or(0.0);
    let window = hann(n);
    let mut buffer: Vec<Complex64> = series
        .iter()
        .zip(&window)
        .map(|(v, w)| Complex64::new((v - mean) * w, 0.0))
        .collect();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);
    let bins = n / 2 + 1;
    let frequencies_hz = (0..bins).map(|k| k as f64 * fs / n as f64).collect();
    let magnitudes = buffer.iter().take(bins).map(|c| c.norm()).collect();
    FrequencySpectrum {
        sample_rate_hz: fs,
        frequencies_hz,
        magnitudes,
    }
}

/// Dominant in-band frequency of `series` as a per-minute rate.
///
/// `None` when the record is shorter than `band.min_seconds`, when the band
/// holds no FFT bin at this resolution, or when every in-band bin is zero.
/// The result does not depend on the amplitude of the series.
pub fn spectral_rate(series: &[f64], fs: f64, band: &FrequencyBand) -> Option<f64> {
    if !(fs > 0.0) || (series.len() as f64) < fs * band.min_seconds || series.is_empty() {
        return None;
    }
    let spectrum = magnitude_spectrum(series, fs);
    match spectrum.peak_in(band) {
        Some((freq, mag)) if mag > 0.0 => Some(freq * 60.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn sine(freq_hz: f64, fs: f64, seconds: f64) -> Vec<f64> {
        let n = (fs * seconds).round() as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / fs).sin())
            .collect()
    }
    #[test]
    fn spectrum_has_half_plus_one_bins() {
        let spectrum = magnitude_spectrum(&vec![0.5; 128], 250.0);
        assert_eq!(spectrum.frequencies_hz.len(), 65);
        assert_eq!(spectrum.magnitudes.len(), 65);
        assert!((spectrum.resolution_hz() - 250.0 / 128.0).abs() < 1e-12);
    }
    #[test]
    fn too_short_is_none() {
        let band = FrequencyBand::heart();
        for (fs, min_seconds) in [(30.0, 5.0), (25.0, 5.0), (60.0, 10.0), (12.5, 2.0)] {
            let band = FrequencyBand { min_seconds, ..band };
            let n = (fs * min_seconds).ceil() as usize - 1;
            let series = sine(1.2, fs, n as f64 / fs);
            assert_eq!(series.len(), n);
            assert_eq!(spectral_rate(&series, fs, &band), None);
        }
    }
    #[test]
    fn recovers_sine_within_one_bin() {
        for (freq, fs, seconds) in [(1.2, 30.0, 10.0), (1.75, 25.0, 12.0), (2.4, 60.0, 8.0)] {
            let series = sine(freq, fs, seconds);
            let bpm = spectral_rate(&series, fs, &FrequencyBand::heart()).unwrap();
            let bin_bpm = fs / series.len() as f64 * 60.0;
            assert!((bpm - freq * 60.0).abs() <= bin_bpm, "{freq} Hz -> {bpm} bpm");
        }
    }
    #[test]
    fn respiration_band_picks_slow_component() {
        let fs = 30.0;
        let series: Vec<f64> = sine(0.25, fs, 40.0)
            .iter()
            .zip(sine(1.3, fs, 40.0))
            .map(|(slow, fast)| slow + 0.3 * fast)
            .collect();
        let rate = spectral_rate(&series, fs, &FrequencyBand::respiration()).unwrap();
        assert!((rate - 15.0).abs() <= 1.5);
    }
    #[test]
    fn flat_series_has_no_rate() {
        assert_eq!(
            spectral_rate(&vec![3.0; 600], 30.0, &FrequencyBand::heart()),
            None
        );
    }
    #[test]
    fn tiny_amplitude_sine_is_recovered() {
        let fs = 30.0;
        for amplitude in [1e-7, 1e-3, 1e4] {
            let series: Vec<f64> = sine(1.2, fs, 10.0).iter().map(|v| v * amplitude).collect();
            let bpm = spectral_rate(&series, fs, &FrequencyBand::heart());
            assert_eq!(bpm.map(f64::round), Some(72.0), "amplitude {amplitude}");
        }
    }
    #[test]
    fn no_bin_in_band_is_none() {
        let band = FrequencyBand::new(0.71, 0.79, 0.0);
        // 10 samples at 30 Hz: bins every 3 Hz.
        assert_eq!(spectral_rate(&sine(1.0, 30.0, 10.0 / 30.0), 30.0, &band), None);
    }
    #[test]
    fn ties_prefer_lowest_frequency() {
        let spectrum = FrequencySpectrum {
            sample_rate_hz: 10.0,
            frequencies_hz: vec![0.0, 1.0, 2.0, 3.0],
            magnitudes: vec![9.0, 4.0, 4.0, 1.0],
        };
        let band = FrequencyBand::new(0.5, 3.0, 0.0);
        assert_eq!(spectrum.peak_in(&band), Some((1.0, 4.0)));
    }
}
