// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strictly increasing sample indices of accepted pulse peaks.
pub type PeakSet = Vec<usize>;

/// Per-frame mean colour over the ROI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Raw channel means of one clip, in frame order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipRecording {
    pub label: String,
    /// Rate reported by the frame source, if any.
    pub sample_rate_hz: Option<f64>,
    pub red: Vec<f64>,
    pub green: Vec<f64>,
    pub blue: Option<Vec<f64>>,
}

impl ClipRecording {
    pub fn new(label: impl Into<String>, sample_rate_hz: Option<f64>) -> Self {
        Self {
            label: label.into(),
            sample_rate_hz,
            ..Self::default()
        }
    }

    pub fn from_channels(
        label: impl Into<String>,
        sample_rate_hz: Option<f64>,
        red: Vec<f64>,
        green: Vec<f64>,
    ) -> Self {
        Self {
            label: label.into(),
            sample_rate_hz,
            red,
            green,
            blue: None,
        }
    }

    pub fn push(&mut self, sample: ColorSample) {
        self.red.push(sample.red);
        self.green.push(sample.green);
        self.blue.get_or_insert_with(Vec::new).push(sample.blue);
    }

    pub fn frame_count(&self) -> usize {
        self.green.len()
    }

    /// Reported rate when it is usable, otherwise `fallback_hz`.
    pub fn effective_sample_rate(&self, fallback_hz: f64) -> f64 {
        match self.sample_rate_hz {
            Some(fs) if fs.is_finite() && fs > 0.0 => fs,
            _ => fallback_hz,
        }
    }

    pub fn duration_seconds(&self, fallback_hz: f64) -> f64 {
        self.frame_count() as f64 / self.effective_sample_rate(fallback_hz)
    }
}

/// Machine-readable code for a clip that was not processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Fewer frames than the heart-rate band needs.
    TooShort,
    /// No frames at all. Checked before `TooShort`, so a zero-frame clip
    /// reports `empty` even though it is also shorter than the minimum.
    Empty,
    ChannelMismatch,
    InvalidSampleRate,
    NonFinite,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TooShort => "too_short",
            RejectReason::Empty => "empty",
            RejectReason::ChannelMismatch => "channel_mismatch",
            RejectReason::InvalidSampleRate => "invalid_sample_rate",
            RejectReason::NonFinite => "non_finite",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physiological estimates of one processed clip. Each is independently optional.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VitalMetrics {
    pub hr_bpm: Option<f64>,
    pub rmssd_s: Option<f64>,
    pub sdnn_s: Option<f64>,
    pub rr_bpm: Option<f64>,
    pub spo2_index: Option<f64>,
}

/// Terminal record for one clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipResult {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<RejectReason>,
    sampling_rate: f64,
    frame_count: usize,
    hr_bpm: Option<f64>,
    rmssd_s: Option<f64>,
    sdnn_s: Option<f64>,
    rr_bpm: Option<f64>,
    spo2_index: Option<f64>,
}

impl ClipResult {
    pub fn processed(sampling_rate: f64, frame_count: usize, metrics: VitalMetrics) -> Self {
        Self {
            ok: true,
            reason: None,
            sampling_rate,
            frame_count,
            hr_bpm: metrics.hr_bpm,
            rmssd_s: metrics.rmssd_s,
            sdnn_s: metrics.sdnn_s,
            rr_bpm: metrics.rr_bpm,
            spo2_index: metrics.spo2_index,
        }
    }

    pub fn rejected(reason: RejectReason, sampling_rate: f64, frame_count: usize) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
            sampling_rate,
            frame_count,
            hr_bpm: None,
            rmssd_s: None,
            sdnn_s: None,
            rr_bpm: None,
            spo2_index: None,
        }
    }

    pub fn ok(&self) -> bool {
        self.ok
    }
    pub fn reason(&self) -> Option<RejectReason> {
        self.reason
    }
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
    pub fn hr_bpm(&self) -> Option<f64> {
        self.hr_bpm
    }
    pub fn rmssd_s(&self) -> Option<f64> {
        self.rmssd_s
    }
    pub fn sdnn_s(&self) -> Option<f64> {
        self.sdnn_s
    }
    pub fn rr_bpm(&self) -> Option<f64> {
        self.rr_bpm
    }
    pub fn spo2_index(&self) -> Option<f64> {
        self.spo2_index
    }
    pub fn metrics(&self) -> VitalMetrics {
        VitalMetrics {
            hr_bpm: self.hr_bpm,
            rmssd_s: self.rmssd_s,
            sdnn_s: self.sdnn_s,
            rr_bpm: self.rr_bpm,
            spo2_index: self.spo2_index,
        }
    }
}

/// One row of the per-clip summary table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    #[serde(flatten)]
    pub result: ClipResult,
}
