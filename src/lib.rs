//! Remote photoplethysmography (rPPG) vitals from per-frame skin colour.
//!
//! Turns the mean red/green intensity of a skin ROI, one sample per video
//! frame, into heart rate, time-domain HRV, respiration rate and a relative
//! SpO2 trend index. Every estimator is a pure function over slices and a
//! sampling rate; [`dsp::process_clip`] combines them into a [`ClipResult`].
pub mod config;
pub mod dsp;
pub mod handler;
pub mod report;
pub mod types;
pub use config::PipelineConfig;
pub use dsp::{process_clip, VitalsError, VitalsPipeline};
pub use types::{ClipRecording, ClipResult, RejectReason, SummaryRow};
