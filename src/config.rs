use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::VitalsError;

/// Frame rate assumed when the source cannot report one (typical phone camera).
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 30.0;
/// Side of the central square ROI as a fraction of `min(width, height)`.
pub const DEFAULT_ROI_FRACTION: f64 = 0.33;
/// Baseline removal window. Long enough to span several beats, short enough to
/// follow illumination drift.
pub const DETREND_WINDOW_SECONDS: f64 = 3.0;
/// 0.7-3.0 Hz covers 42-180 bpm.
pub const HEART_BAND_HZ: (f64, f64) = (0.7, 3.0);
/// Five seconds gives at least ~3.5 cycles at the lowest heart rate.
pub const HEART_MIN_SECONDS: f64 = 5.0;
/// 0.1-0.5 Hz covers 6-30 breaths per minute.
pub const RESPIRATION_BAND_HZ: (f64, f64) = (0.1, 0.5);
/// Slow breathing needs a longer record than the pulse.
pub const RESPIRATION_MIN_SECONDS: f64 = 10.0;
/// Peak threshold in z-score units; rejects sub-threshold noise wiggles.
pub const PEAK_THRESHOLD_Z: f64 = 0.3;
/// 0.4 s refractory period caps detection at 150 bpm and suppresses ringing.
pub const PEAK_MIN_DISTANCE_SECONDS: f64 = 0.4;
pub const SPO2_WINDOW_SECONDS: f64 = 10.0;
pub const SPO2_HOP_SECONDS: f64 = 5.0;
pub const SPO2_DETREND_WINDOW_SECONDS: f64 = 3.0;

/// Closed frequency band with the minimum record length needed to resolve it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
    pub min_seconds: f64,
}

impl FrequencyBand {
    pub const fn new(low_hz: f64, high_hz: f64, min_seconds: f64) -> Self {
        Self {
            low_hz,
            high_hz,
            min_seconds,
        }
    }
    pub const fn heart() -> Self {
        Self::new(HEART_BAND_HZ.0, HEART_BAND_HZ.1, HEART_MIN_SECONDS)
    }
    pub const fn respiration() -> Self {
        Self::new(
            RESPIRATION_BAND_HZ.0,
            RESPIRATION_BAND_HZ.1,
            RESPIRATION_MIN_SECONDS,
        )
    }
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spo2WindowConfig {
    pub window_seconds: f64,
    pub hop_seconds: f64,
    pub detrend_window_seconds: f64,
}

impl Default for Spo2WindowConfig {
    fn default() -> Self {
        Self {
            window_seconds: SPO2_WINDOW_SECONDS,
            hop_seconds: SPO2_HOP_SECONDS,
            detrend_window_seconds: SPO2_DETREND_WINDOW_SECONDS,
        }
    }
}

/// Which AC definition feeds the per-clip SpO2 index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spo2Method {
    /// Whole-clip std-dev of the raw channels.
    #[default]
    Simple,
    /// Median over sliding windows of detrended std-dev.
    Windowed,
}

/// Every tunable of the pipeline. Built once and shared read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fallback_sample_rate_hz: f64,
    pub roi_fraction: f64,
    pub detrend_window_seconds: f64,
    pub heart: FrequencyBand,
    pub respiration: FrequencyBand,
    pub peak_threshold_z: f64,
    pub peak_min_distance_seconds: f64,
    pub spo2: Spo2WindowConfig,
    pub spo2_method: Spo2Method,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            roi_fraction: DEFAULT_ROI_FRACTION,
            detrend_window_seconds: DETREND_WINDOW_SECONDS,
            heart: FrequencyBand::heart(),
            respiration: FrequencyBand::respiration(),
            peak_threshold_z: PEAK_THRESHOLD_Z,
            peak_min_distance_seconds: PEAK_MIN_DISTANCE_SECONDS,
            spo2: Spo2WindowConfig::default(),
            spo2_method: Spo2Method::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VitalsError> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VitalsError> {
        let positive = [
            ("fallback_sample_rate_hz", self.fallback_sample_rate_hz),
            ("detrend_window_seconds", self.detrend_window_seconds),
            ("peak_min_distance_seconds", self.peak_min_distance_seconds),
            ("spo2.window_seconds", self.spo2.window_seconds),
            ("spo2.hop_seconds", self.spo2.hop_seconds),
            ("spo2.detrend_window_seconds", self.spo2.detrend_window_seconds),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(VitalsError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.roi_fraction > 0.0 && self.roi_fraction <= 1.0) {
            return Err(VitalsError::InvalidConfig(format!(
                "roi_fraction must be in (0, 1], got {}",
                self.roi_fraction
            )));
        }
        for (name, band) in [("heart", self.heart), ("respiration", self.respiration)] {
            if !(band.low_hz >= 0.0 && band.low_hz < band.high_hz && band.min_seconds >= 0.0) {
                return Err(VitalsError::InvalidConfig(format!(
                    "{name} band {:.2}-{:.2} Hz is empty",
                    band.low_hz, band.high_hz
                )));
            }
        }
        if !self.peak_threshold_z.is_finite() {
            return Err(VitalsError::InvalidConfig(
                "peak_threshold_z must be finite".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.heart.low_hz, 0.7);
        assert_eq!(config.respiration.min_seconds, 10.0);
        assert_eq!(config.spo2_method, Spo2Method::Simple);
    }
    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"fallback_sample_rate_hz": 60.0, "spo2_method": "windowed"}"#)
                .unwrap();
        assert_eq!(config.fallback_sample_rate_hz, 60.0);
        assert_eq!(config.spo2_method, Spo2Method::Windowed);
        assert_eq!(config.peak_threshold_z, PEAK_THRESHOLD_Z);
    }
    #[test]
    fn rejects_inverted_band() {
        let config = PipelineConfig {
            heart: FrequencyBand::new(3.0, 0.7, 5.0),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VitalsError::InvalidConfig(_))
        ));
    }
    #[test]
    fn band_is_inclusive() {
        let band = FrequencyBand::heart();
        assert!(band.contains(0.7));
        assert!(band.contains(3.0));
        assert!(!band.contains(3.01));
    }
}
