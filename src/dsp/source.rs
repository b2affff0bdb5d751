use std::collections::VecDeque;
use std::f64::consts::PI;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use crate::dsp::VitalsError;
use crate::types::{ClipRecording, ColorSample};

/// Trait representing something that can yield recorded clips on demand.
pub trait ClipSource {
    fn next_clip(&mut self) -> Result<Option<ClipRecording>, VitalsError>;
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<ClipRecording>,
}
impl ManualSource {
    pub fn new(clips: impl IntoIterator<Item = ClipRecording>) -> Self {
        Self {
            queue: clips.into_iter().collect(),
        }
    }
}
impl ClipSource for ManualSource {
    fn next_clip(&mut self) -> Result<Option<ClipRecording>, VitalsError> {
        Ok(self.queue.pop_front())
    }
}

/// Parse per-frame channel means from CSV text.
///
/// The header names at least `red` and `green` columns (any order,
/// case-insensitive, `blue` optional). Lines starting with `#` are comments;
/// one of the form `# sample_rate_hz: 29.97` reports the frame rate.
pub fn parse_channel_csv(label: &str, text: &str) -> Result<ClipRecording, VitalsError> {
    let mut clip = ClipRecording::new(label, sample_rate_comment(text)?);
    let mut reader = ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(VitalsError::Parse {
            line: 0,
            message: "missing header".into(),
        });
    }
    let header_line = headers.position().map_or(1, |p| p.line() as usize);
    let (red_col, green_col, blue_col) = header_columns(&headers, header_line)?;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line_no = record.position().map_or(0, |p| p.line() as usize);
        let value = |col: usize| -> Result<f64, VitalsError> {
            let field = record.get(col).ok_or_else(|| VitalsError::Parse {
                line: line_no,
                message: format!("expected at least {} fields", col + 1),
            })?;
            field.parse::<f64>().map_err(|e| VitalsError::Parse {
                line: line_no,
                message: format!("'{field}': {e}"),
            })
        };
        let red = value(red_col)?;
        let green = value(green_col)?;
        match blue_col {
            Some(col) => clip.push(ColorSample {
                red,
                green,
                blue: value(col)?,
            }),
            None => {
                clip.red.push(red);
                clip.green.push(green);
            }
        }
    }
    debug!("parsed '{label}': {} frames", clip.frame_count());
    Ok(clip)
}

fn sample_rate_comment(text: &str) -> Result<Option<f64>, VitalsError> {
    let mut fs = None;
    for (idx, line) in text.lines().enumerate() {
        let Some(comment) = line.trim().strip_prefix('#') else {
            continue;
        };
        if let Some((key, value)) = comment.split_once(':') {
            if key.trim() == "sample_rate_hz" {
                let rate = value.trim().parse::<f64>().map_err(|e| VitalsError::Parse {
                    line: idx + 1,
                    message: format!("bad sample rate: {e}"),
                })?;
                fs = Some(rate);
            }
        }
    }
    Ok(fs)
}

fn header_columns(
    headers: &StringRecord,
    line_no: usize,
) -> Result<(usize, usize, Option<usize>), VitalsError> {
    let find = |name: &str| headers.iter().position(|f| f.eq_ignore_ascii_case(name));
    match (find("red"), find("green")) {
        (Some(red), Some(green)) => Ok((red, green, find("blue"))),
        _ => Err(VitalsError::Parse {
            line: line_no,
            message: "header must name 'red' and 'green' columns".into(),
        }),
    }
}

/// Write a clip in the layout [`parse_channel_csv`] reads, rate comment first.
pub fn write_channel_csv<W: Write>(clip: &ClipRecording, mut out: W) -> Result<(), VitalsError> {
    if let Some(fs) = clip.sample_rate_hz {
        writeln!(out, "# sample_rate_hz: {fs}")?;
    }
    let mut writer = csv::Writer::from_writer(out);
    match &clip.blue {
        Some(blue) => {
            writer.write_record(["red", "green", "blue"])?;
            for ((r, g), b) in clip.red.iter().zip(&clip.green).zip(blue) {
                writer.write_record([format!("{r:.4}"), format!("{g:.4}"), format!("{b:.4}")])?;
            }
        }
        None => {
            writer.write_record(["red", "green"])?;
            for (r, g) in clip.red.iter().zip(&clip.green) {
                writer.write_record([format!("{r:.4}"), format!("{g:.4}")])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Reads one CSV file per clip; the file stem becomes the clip label.
pub struct CsvSource {
    paths: VecDeque<PathBuf>,
}
impl CsvSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}
impl ClipSource for CsvSource {
    fn next_clip(&mut self) -> Result<Option<ClipRecording>, VitalsError> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(&path)?;
        parse_channel_csv(&label_for(&path), &text).map(Some)
    }
}

pub fn label_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Shape of a generated clip.
#[derive(Clone, Debug)]
pub struct SyntheticClip {
    pub label: String,
    pub sample_rate_hz: f64,
    pub seconds: f64,
    pub heart_rate_bpm: f64,
    pub breathing_rate_bpm: f64,
    /// Pulse amplitude on the green channel; red gets `red_ac_ratio` of it.
    pub pulse_amplitude: f64,
    pub red_ac_ratio: f64,
    /// Linear illumination drift per second.
    pub drift_per_second: f64,
    pub noise_std: f64,
}
impl Default for SyntheticClip {
    fn default() -> Self {
        Self {
            label: "synthetic".into(),
            sample_rate_hz: 30.0,
            seconds: 30.0,
            heart_rate_bpm: 72.0,
            breathing_rate_bpm: 15.0,
            pulse_amplitude: 1.0,
            red_ac_ratio: 0.5,
            drift_per_second: 0.05,
            noise_std: 0.05,
        }
    }
}

/// Seeded generator of sine-pulse clips, for demos and deterministic tests.
pub struct SyntheticSource {
    specs: VecDeque<SyntheticClip>,
    rng: StdRng,
}
impl SyntheticSource {
    pub fn new(specs: impl IntoIterator<Item = SyntheticClip>, seed: u64) -> Self {
        Self {
            specs: specs.into_iter().collect(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
    pub fn generate(&mut self, spec: &SyntheticClip) -> Result<ClipRecording, VitalsError> {
        let fs = spec.sample_rate_hz;
        let noise = Normal::new(0.0, spec.noise_std)
            .map_err(|e| VitalsError::InvalidConfig(format!("noise_std {}: {e}", spec.noise_std)))?;
        let n = (fs * spec.seconds).round().max(0.0) as usize;
        let hr_hz = spec.heart_rate_bpm / 60.0;
        let br_hz = spec.breathing_rate_bpm / 60.0;
        let mut clip = ClipRecording::new(spec.label.clone(), Some(fs));
        for i in 0..n {
            let t = i as f64 / fs;
            let pulse = spec.pulse_amplitude * (2.0 * PI * hr_hz * t).sin();
            let breath = 0.5 * spec.pulse_amplitude * (2.0 * PI * br_hz * t).sin();
            let drift = spec.drift_per_second * t;
            clip.push(ColorSample {
                red: 150.0 + spec.red_ac_ratio * pulse + breath + drift + self.rng.sample(noise),
                green: 100.0 + pulse + breath + drift + self.rng.sample(noise),
                blue: 80.0 + 0.2 * pulse + drift + self.rng.sample(noise),
            });
        }
        Ok(clip)
    }
}
impl ClipSource for SyntheticSource {
    fn next_clip(&mut self) -> Result<Option<ClipRecording>, VitalsError> {
        let Some(spec) = self.specs.pop_front() else {
            return Ok(None);
        };
        self.generate(&spec).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn csv_with_rate_comment_and_blue() {
        let text = "# sample_rate_hz: 29.97\nframe,Blue,Green,Red\n0,80,100,150\n1,81,101.5,149\n\n";
        let clip = parse_channel_csv("face_rest", text).unwrap();
        assert_eq!(clip.sample_rate_hz, Some(29.97));
        assert_eq!(clip.red, vec![150.0, 149.0]);
        assert_eq!(clip.green, vec![100.0, 101.5]);
        assert_eq!(clip.blue, Some(vec![80.0, 81.0]));
    }
    #[test]
    fn csv_errors_carry_line_numbers() {
        let err = parse_channel_csv("x", "red,green\n1,2\n3,oops\n").unwrap_err();
        assert!(matches!(err, VitalsError::Parse { line: 3, .. }));
        let err = parse_channel_csv("x", "r,g\n1,2\n").unwrap_err();
        assert!(matches!(err, VitalsError::Parse { line: 1, .. }));
        assert!(parse_channel_csv("x", "# only a comment\n").is_err());
    }
    #[test]
    fn csv_accepts_quoted_fields_and_blank_records() {
        let text = "\"Red\",\"green\"\n\"150.5\",100\n   \n 151 ,\"99.5\"\n";
        let clip = parse_channel_csv("palm_rest", text).unwrap();
        assert_eq!(clip.red, vec![150.5, 151.0]);
        assert_eq!(clip.green, vec![100.0, 99.5]);
        assert_eq!(clip.sample_rate_hz, None);
    }
    #[test]
    fn written_clip_reads_back() {
        let clip = SyntheticSource::new(Vec::new(), 3)
            .generate(&SyntheticClip {
                sample_rate_hz: 29.97,
                seconds: 1.0,
                ..SyntheticClip::default()
            })
            .unwrap();
        let mut out = Vec::new();
        write_channel_csv(&clip, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# sample_rate_hz: 29.97\nred,green,blue\n"));
        let back = parse_channel_csv("synthetic", &text).unwrap();
        assert_eq!(back.sample_rate_hz, Some(29.97));
        assert_eq!(back.frame_count(), clip.frame_count());
        assert!((back.green[5] - clip.green[5]).abs() < 1e-4);
    }
    #[test]
    fn csv_source_reads_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("face_rest.csv");
        let b = dir.path().join("palm_rest.csv");
        std::fs::write(&a, "red,green\n1,2\n").unwrap();
        std::fs::write(&b, "red,green\n3,4\n5,6\n").unwrap();
        let mut source = CsvSource::new(vec![a, b]);
        let first = source.next_clip().unwrap().unwrap();
        assert_eq!(first.label, "face_rest");
        assert_eq!(first.blue, None);
        assert_eq!(source.next_clip().unwrap().unwrap().frame_count(), 2);
        assert!(source.next_clip().unwrap().is_none());
    }
    #[test]
    fn synthetic_is_seeded_and_sized() {
        let spec = SyntheticClip {
            seconds: 4.0,
            ..SyntheticClip::default()
        };
        let a = SyntheticSource::new(vec![spec.clone()], 7).next_clip().unwrap().unwrap();
        let b = SyntheticSource::new(vec![spec], 7).next_clip().unwrap().unwrap();
        assert_eq!(a.frame_count(), 120);
        assert_eq!(a, b);
        assert_eq!(a.sample_rate_hz, Some(30.0));
    }
    #[test]
    fn synthetic_noise_is_normal_and_validated() {
        let spec = SyntheticClip {
            seconds: 100.0,
            pulse_amplitude: 0.0,
            drift_per_second: 0.0,
            noise_std: 0.5,
            ..SyntheticClip::default()
        };
        let clip = SyntheticSource::new(Vec::new(), 11).generate(&spec).unwrap();
        let spread = crate::dsp::stats::std_dev(&clip.green).unwrap();
        assert!((spread - 0.5).abs() < 0.03, "std = {spread}");
        let bad = SyntheticClip {
            noise_std: -1.0,
            ..SyntheticClip::default()
        };
        assert!(matches!(
            SyntheticSource::new(Vec::new(), 11).generate(&bad),
            Err(VitalsError::InvalidConfig(_))
        ));
    }
}
