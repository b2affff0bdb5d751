//! Red/green AC/DC ratio as a relative SpO2 trend index.
//!
//! `R = (AC_red / DC_red) / (AC_green / DC_green)`. DC is the mean intensity
//! (baseline reflectance), AC the standard deviation of the pulsatile part.
//! The index is only comparable across clips of the same subject and camera
//! setup; it is not calibrated to a saturation percentage.
use serde::Serialize;

use crate::config::Spo2WindowConfig;
use crate::dsp::{detrend, stats};

/// Windows with a channel mean at or below this are treated as unlit.
pub const MIN_DC: f64 = 1e-6;
/// Green AC at or below this leaves the ratio undefined.
pub const MIN_AC_GREEN: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Spo2Window {
    /// Window midpoint, seconds from clip start.
    pub time_s: f64,
    pub ratio: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Spo2Trend {
    pub windows: Vec<Spo2Window>,
    /// Median of the window ratios.
    pub index: Option<f64>,
}

fn ratio_of_ratios(ac_red: f64, dc_red: f64, ac_green: f64, dc_green: f64) -> Option<f64> {
    if dc_red <= MIN_DC || dc_green <= MIN_DC || ac_green <= MIN_AC_GREEN {
        return None;
    }
    Some((ac_red / dc_red) / (ac_green / dc_green))
}

/// Whole-clip index with AC taken from the raw, undetrended channels.
pub fn spo2_simple(red_raw: &[f64], green_raw: &[f64]) -> Option<f64> {
    if red_raw.is_empty() || red_raw.len() != green_raw.len() {
        return None;
    }
    ratio_of_ratios(
        stats::std_dev(red_raw)?,
        stats::mean(red_raw)?,
        stats::std_dev(green_raw)?,
        stats::mean(green_raw)?,
    )
}

/// Sliding-window index. Each full window is detrended on its own before the
/// AC term is measured; partial tail windows are not emitted. Channels of
/// different length give an empty trend.
pub fn spo2_trend(
    red_raw: &[f64],
    green_raw: &[f64],
    fs: f64,
    config: &Spo2WindowConfig,
) -> Spo2Trend {
    let n = green_raw.len();
    if n == 0 || red_raw.len() != n || !(fs > 0.0) {
        return Spo2Trend::default();
    }
    let width = ((config.window_seconds * fs).round() as usize).max(1);
    let hop = ((config.hop_seconds * fs).round() as usize).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start + width <= n {
        let end = start + width;
        if let Some(ratio) = window_ratio(
            &red_raw[start..end],
            &green_raw[start..end],
            fs,
            config.detrend_window_seconds,
        ) {
            windows.push(Spo2Window {
                time_s: (start + end) as f64 / 2.0 / fs,
                ratio,
            });
        }
        start += hop;
    }
    let ratios: Vec<f64> = windows.iter().map(|w| w.ratio).collect();
    let index = stats::median(&ratios);
    Spo2Trend { windows, index }
}

fn window_ratio(red: &[f64], green: &[f64], fs: f64, detrend_seconds: f64) -> Option<f64> {
    let dc_red = stats::mean(red)?;
    let dc_green = stats::mean(green)?;
    let ac_red = stats::std_dev(&detrend::detrend(red, fs, detrend_seconds))?;
    let ac_green = stats::std_dev(&detrend::detrend(green, fs, detrend_seconds))?;
    ratio_of_ratios(ac_red, dc_red, ac_green, dc_green)
}
