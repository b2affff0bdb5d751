use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::config::FrequencyBand;
use crate::dsp::error::VitalsError;
use crate::dsp::fft::FrequencySpectrum;
use crate::dsp::spo2::Spo2Trend;
use crate::report::display_order;
use crate::types::SummaryRow;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            palette: vec![GREEN, RED, BLUE, CYAN, MAGENTA, YELLOW, WHITE],
        }
    }
}
/// Per-clip metric picked out of a summary row for bar charts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    HeartRate,
    Respiration,
    Rmssd,
    Spo2Index,
}
impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::HeartRate,
        Metric::Respiration,
        Metric::Rmssd,
        Metric::Spo2Index,
    ];
    pub fn value(&self, row: &SummaryRow) -> Option<f64> {
        match self {
            Metric::HeartRate => row.result.hr_bpm(),
            Metric::Respiration => row.result.rr_bpm(),
            Metric::Rmssd => row.result.rmssd_s(),
            Metric::Spo2Index => row.result.spo2_index(),
        }
    }
    pub fn title(&self) -> &'static str {
        match self {
            Metric::HeartRate => "Estimated HR (bpm) per clip",
            Metric::Respiration => "Estimated respiration (breaths/min) per clip",
            Metric::Rmssd => "HRV (RMSSD, s) per clip",
            Metric::Spo2Index => "SpO2 trend index (R/G AC/DC) per clip",
        }
    }
    pub fn file_stem(&self) -> &'static str {
        match self {
            Metric::HeartRate => "hr_per_clip",
            Metric::Respiration => "rr_per_clip",
            Metric::Rmssd => "hrv_rmssd_per_clip",
            Metric::Spo2Index => "spo2_trend_per_clip",
        }
    }
}
/// Magnitude curve of one clip with the given bands shaded.
pub fn render_spectrum_png(
    spectrum: &FrequencySpectrum,
    bands: &[FrequencyBand],
    style: PlotStyle,
) -> Result<Vec<u8>, VitalsError> {
    if spectrum.magnitudes.is_empty() {
        return Err(VitalsError::Plot("spectrum has no magnitudes".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        // Nothing above 4 Hz is physiological here.
        let x_max = spectrum
            .frequencies_hz
            .last()
            .copied()
            .unwrap_or(0.0)
            .min(4.0)
            .max(0.5);
        let y_max = spectrum
            .frequencies_hz
            .iter()
            .zip(&spectrum.magnitudes)
            .filter(|(f, _)| **f <= x_max)
            .fold(0.0f64, |acc, (_, m)| acc.max(*m))
            .max(1e-3);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                "FFT Magnitude",
                ("sans-serif", 20).into_font().color(&WHITE),
            )
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;
        chart
            .configure_mesh()
            .light_line_style(&WHITE.mix(0.1))
            .x_desc("Hz")
            .draw()?;
        for (idx, band) in bands.iter().enumerate() {
            let color = style.palette[(idx + 1) % style.palette.len()];
            chart.draw_series(std::iter::once(Rectangle::new(
                [(band.low_hz, 0.0), (band.high_hz.min(x_max), y_max)],
                color.mix(0.12).filled(),
            )))?;
        }
        let color = style.palette[0];
        let series = spectrum
            .frequencies_hz
            .iter()
            .copied()
            .zip(spectrum.magnitudes.iter().copied())
            .take_while(|(f, _)| *f <= x_max);
        chart.draw_series(LineSeries::new(series, &color))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Bar chart of one metric across clips, face before palm and rest before
/// exercise before breath; clips without a value get no bar.
pub fn render_metric_bars_png(
    rows: &[SummaryRow],
    metric: Metric,
    style: PlotStyle,
) -> Result<Vec<u8>, VitalsError> {
    let rows = display_order(rows);
    let values: Vec<(usize, f64)> = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| metric.value(row).map(|v| (idx, v)))
        .collect();
    if values.is_empty() {
        return Err(VitalsError::Plot(format!(
            "no clip has a value for '{}'",
            metric.file_stem()
        )));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let y_max = values.iter().fold(0.0f64, |acc, (_, v)| acc.max(*v)).max(1e-6) * 1.1;
        let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(metric.title(), ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..rows.len() as f64, 0f64..y_max)?;
        chart
            .configure_mesh()
            .light_line_style(&WHITE.mix(0.1))
            .x_labels(rows.len())
            .x_label_formatter(&|x: &f64| {
                labels
                    .get(x.floor() as usize)
                    .cloned()
                    .unwrap_or_default()
            })
            .draw()?;
        chart.draw_series(values.iter().map(|(idx, v)| {
            let color = style.palette[idx % style.palette.len()];
            let x = *idx as f64;
            Rectangle::new([(x + 0.15, 0.0), (x + 0.85, *v)], color.filled())
        }))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Windowed SpO2 ratio over time, with the median as a flat reference line.
pub fn render_spo2_trend_png(trend: &Spo2Trend, style: PlotStyle) -> Result<Vec<u8>, VitalsError> {
    if trend.windows.is_empty() {
        return Err(VitalsError::Plot("SpO2 trend has no windows".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let t_max = trend
            .windows
            .last()
            .map(|w| w.time_s)
            .unwrap_or(0.0)
            .max(1.0)
            * 1.05;
        let (lo, hi) = trend
            .windows
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), w| (lo.min(w.ratio), hi.max(w.ratio)));
        let pad = ((hi - lo) * 0.1).max(1e-3);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("SpO2 Trend Index", ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..t_max, (lo - pad)..(hi + pad))?;
        chart
            .configure_mesh()
            .light_line_style(&WHITE.mix(0.1))
            .x_desc("s")
            .draw()?;
        let color = style.palette[1 % style.palette.len()];
        chart.draw_series(LineSeries::new(
            trend.windows.iter().map(|w| (w.time_s, w.ratio)),
            &color,
        ))?;
        chart.draw_series(
            trend
                .windows
                .iter()
                .map(|w| Circle::new((w.time_s, w.ratio), 3, color.filled())),
        )?;
        if let Some(index) = trend.index {
            chart.draw_series(LineSeries::new(
                vec![(0.0, index), (t_max, index)],
                &WHITE.mix(0.5),
            ))?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, VitalsError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| VitalsError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| VitalsError::Plot(e.to_string()))?;
    Ok(output)
}
