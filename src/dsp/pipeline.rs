use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{PipelineConfig, Spo2Method};
use crate::dsp::detrend::detrend;
use crate::dsp::error::VitalsError;
use crate::dsp::fft::{magnitude_spectrum, spectral_rate, FrequencySpectrum};
use crate::dsp::hrv::{hrv_time_domain, HrvMetrics};
use crate::dsp::peaks::detect_peaks;
use crate::dsp::source::ClipSource;
use crate::dsp::spo2::{spo2_simple, spo2_trend, Spo2Trend};
use crate::dsp::stats;
use crate::types::{ClipRecording, ClipResult, PeakSet, RejectReason, SummaryRow, VitalMetrics};

/// Green channels whose spread is at or below this fraction of their mean
/// carry no pulse.
pub const FLAT_RELATIVE_SPREAD: f64 = 1e-12;

/// Run every estimator over one clip.
///
/// Input problems reject the whole clip with a reason code; a metric that
/// cannot be estimated is left as `None` without affecting the others.
pub fn process_clip(red: &[f64], green: &[f64], fs: f64, config: &PipelineConfig) -> ClipResult {
    if let Err(result) = admit(red, green, fs, config) {
        return result;
    }
    let cardio = estimate_cardio(green, fs, config);
    let spo2_index = match config.spo2_method {
        Spo2Method::Simple => spo2_simple(red, green),
        Spo2Method::Windowed => spo2_trend(red, green, fs, &config.spo2).index,
    };
    cardio.into_result(fs, green.len(), spo2_index)
}

/// Everything computed for a clip, for callers that plot diagnostics.
#[derive(Clone, Debug)]
pub struct ClipAnalysis {
    pub result: ClipResult,
    pub detrended_green: Vec<f64>,
    pub spectrum: FrequencySpectrum,
    pub peaks: PeakSet,
    pub hrv: HrvMetrics,
    pub spo2_trend: Spo2Trend,
}

fn validate(red: &[f64], green: &[f64], fs: f64, config: &PipelineConfig) -> Result<(), RejectReason> {
    if green.is_empty() || red.is_empty() {
        return Err(RejectReason::Empty);
    }
    if red.len() != green.len() {
        return Err(RejectReason::ChannelMismatch);
    }
    if !(fs.is_finite() && fs > 0.0) {
        return Err(RejectReason::InvalidSampleRate);
    }
    if red.iter().chain(green).any(|v| !v.is_finite()) {
        return Err(RejectReason::NonFinite);
    }
    if (green.len() as f64) < fs * config.heart.min_seconds {
        return Err(RejectReason::TooShort);
    }
    Ok(())
}

fn admit(red: &[f64], green: &[f64], fs: f64, config: &PipelineConfig) -> Result<(), ClipResult> {
    validate(red, green, fs, config).map_err(|reason| {
        warn!("clip rejected ({reason}): {} frames at {fs:.2} fps", green.len());
        ClipResult::rejected(reason, fs, green.len())
    })
}

/// True when the raw green channel has no variation relative to its level.
pub fn is_flat(green: &[f64]) -> bool {
    match (stats::mean(green), stats::std_dev(green)) {
        (Some(mean), Some(spread)) => spread <= FLAT_RELATIVE_SPREAD * mean.abs(),
        _ => true,
    }
}

/// Green-channel estimates shared by [`process_clip`] and [`analyze_channels`].
struct CardioEstimate {
    detrended: Vec<f64>,
    hr_bpm: Option<f64>,
    rr_bpm: Option<f64>,
    peaks: PeakSet,
    hrv: HrvMetrics,
}

impl CardioEstimate {
    fn into_result(self, fs: f64, frame_count: usize, spo2_index: Option<f64>) -> ClipResult {
        debug!(
            "hr={:?} rr={:?} peaks={} rmssd={:?} sdnn={:?} spo2={spo2_index:?}",
            self.hr_bpm,
            self.rr_bpm,
            self.peaks.len(),
            self.hrv.rmssd_s,
            self.hrv.sdnn_s
        );
        let metrics = VitalMetrics {
            hr_bpm: self.hr_bpm,
            rmssd_s: self.hrv.rmssd_s,
            sdnn_s: self.hrv.sdnn_s,
            rr_bpm: self.rr_bpm,
            spo2_index,
        };
        ClipResult::processed(fs, frame_count, metrics)
    }
}

fn estimate_cardio(green: &[f64], fs: f64, config: &PipelineConfig) -> CardioEstimate {
    let detrended = detrend(green, fs, config.detrend_window_seconds);
    if is_flat(green) {
        debug!("green channel is flat; no pulse to estimate");
        return CardioEstimate {
            detrended,
            hr_bpm: None,
            rr_bpm: None,
            peaks: PeakSet::new(),
            hrv: HrvMetrics::default(),
        };
    }
    let hr_bpm = spectral_rate(&detrended, fs, &config.heart);
    let peaks = detect_peaks(
        &detrended,
        fs,
        config.peak_min_distance_seconds,
        config.peak_threshold_z,
    );
    let hrv = hrv_time_domain(&peaks, fs);
    let rr_bpm = spectral_rate(&detrended, fs, &config.respiration);
    CardioEstimate {
        detrended,
        hr_bpm,
        rr_bpm,
        peaks,
        hrv,
    }
}

/// Like [`process_clip`] but also computes the spectrum and the windowed SpO2
/// trend for plotting. A rejected clip comes back as `Err` holding its
/// (failed) result.
pub fn analyze_channels(
    red: &[f64],
    green: &[f64],
    fs: f64,
    config: &PipelineConfig,
) -> Result<ClipAnalysis, ClipResult> {
    admit(red, green, fs, config)?;
    let cardio = estimate_cardio(green, fs, config);
    let trend = spo2_trend(red, green, fs, &config.spo2);
    let spo2_index = match config.spo2_method {
        Spo2Method::Simple => spo2_simple(red, green),
        Spo2Method::Windowed => trend.index,
    };
    let spectrum = magnitude_spectrum(&cardio.detrended, fs);
    let detrended_green = cardio.detrended.clone();
    let peaks = cardio.peaks.clone();
    let hrv = cardio.hrv.clone();
    Ok(ClipAnalysis {
        result: cardio.into_result(fs, green.len(), spo2_index),
        detrended_green,
        spectrum,
        peaks,
        hrv,
        spo2_trend: trend,
    })
}

/// Config-holding front end over [`process_clip`] for recorded clips.
#[derive(Clone, Debug, Default)]
pub struct VitalsPipeline {
    config: PipelineConfig,
}

impl VitalsPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, VitalsError> {
        config.validate()?;
        Ok(Self { config })
    }
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
    pub fn process(&self, clip: &ClipRecording) -> ClipResult {
        let fs = clip.effective_sample_rate(self.config.fallback_sample_rate_hz);
        info!(
            "processing '{}': {} frames at {fs:.2} fps",
            clip.label,
            clip.frame_count()
        );
        process_clip(&clip.red, &clip.green, fs, &self.config)
    }
    pub fn analyze(&self, clip: &ClipRecording) -> Result<ClipAnalysis, ClipResult> {
        let fs = clip.effective_sample_rate(self.config.fallback_sample_rate_hz);
        analyze_channels(&clip.red, &clip.green, fs, &self.config)
    }
    /// Clips share nothing, so they are processed in parallel; output order
    /// follows input order.
    pub fn process_many(&self, clips: &[ClipRecording]) -> Vec<SummaryRow> {
        clips
            .par_iter()
            .map(|clip| SummaryRow {
                label: clip.label.clone(),
                result: self.process(clip),
            })
            .collect()
    }
    /// Drain a source and summarise every clip it yields.
    pub fn run_source<S: ClipSource>(&self, source: &mut S) -> Result<Vec<SummaryRow>, VitalsError> {
        let mut clips = Vec::new();
        while let Some(clip) = source.next_clip()? {
            clips.push(clip);
        }
        let rows = self.process_many(&clips);
        let processed = rows.iter().filter(|row| row.result.ok()).count();
        info!("processed {processed}/{} clips", rows.len());
        Ok(rows)
    }
}
