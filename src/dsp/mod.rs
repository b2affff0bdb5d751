// src/dsp/mod.rs
pub mod detrend;
pub mod error;
pub mod fft;
pub mod hrv;
pub mod peaks;
pub mod pipeline;
pub mod plot;
pub mod roi;
pub mod source;
pub mod spo2;
pub mod stats;
pub use detrend::detrend;
pub use error::VitalsError;
pub use fft::{magnitude_spectrum, spectral_rate, FrequencySpectrum};
pub use hrv::{hrv_time_domain, HrvMetrics};
pub use peaks::detect_peaks;
pub use pipeline::{analyze_channels, process_clip, ClipAnalysis, VitalsPipeline};
pub use plot::{render_metric_bars_png, render_spectrum_png, render_spo2_trend_png, Metric, PlotStyle};
pub use roi::{center_square_roi, FrameSampler, RoiRect};
pub use source::{
    parse_channel_csv, write_channel_csv, ClipSource, CsvSource, ManualSource, SyntheticClip,
    SyntheticSource,
};
pub use spo2::{spo2_simple, spo2_trend, Spo2Trend, Spo2Window};
