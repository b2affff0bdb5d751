// src/main.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use rppg_vitals::config::PipelineConfig;
use rppg_vitals::dsp::plot::{
    render_metric_bars_png, render_spectrum_png, render_spo2_trend_png, Metric, PlotStyle,
};
use rppg_vitals::dsp::source::{
    label_for, write_channel_csv, CsvSource, SyntheticClip, SyntheticSource,
};
use rppg_vitals::dsp::{ClipSource, FrameSampler, VitalsPipeline};
use rppg_vitals::report::write_summary_csv;
use rppg_vitals::types::{ClipRecording, SummaryRow};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Heart rate, HRV, respiration and SpO2 trend from skin-colour time series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process per-frame channel CSV files (columns red,green[,blue])
    Analyze(AnalyzeArgs),
    /// Sample a directory of decoded PNG frames and process them as one clip
    Frames(FramesArgs),
    /// Write a synthetic clip as channel CSV
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON pipeline configuration; omitted keys keep their defaults
    #[arg(short, long, value_name = "CONFIG_JSON")]
    config: Option<PathBuf>,
    /// Write the summary table as JSON here instead of stdout
    #[arg(short, long, value_name = "SUMMARY_JSON")]
    output: Option<PathBuf>,
    /// Also write the summary table as CSV, one row per clip
    #[arg(long, value_name = "SUMMARY_CSV")]
    csv: Option<PathBuf>,
    /// Render per-clip bar charts, spectra and SpO2 trends into this directory
    #[arg(long, value_name = "PLOT_DIR")]
    plot_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(required = true, value_name = "CSV")]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct FramesArgs {
    #[arg(value_name = "FRAME_DIR")]
    dir: PathBuf,
    /// Frame rate of the source video; falls back to the configured default
    #[arg(long)]
    fps: Option<f64>,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(short, long, value_name = "CSV")]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,
    #[arg(long, default_value_t = 72.0)]
    heart_rate: f64,
    #[arg(long, default_value_t = 15.0)]
    breathing_rate: f64,
    #[arg(long, default_value_t = 0.05)]
    noise: f64,
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => {
            let pipeline = load_pipeline(&args.common)?;
            let mut source = CsvSource::new(args.inputs);
            let mut clips = Vec::new();
            while let Some(clip) = source.next_clip().context("failed to read channel CSV")? {
                clips.push(clip);
            }
            let rows = pipeline.process_many(&clips);
            report(&pipeline, &rows, &clips, &args.common)
        }
        Commands::Frames(args) => {
            let pipeline = load_pipeline(&args.common)?;
            let clip = sample_frames(&args.dir, args.fps, pipeline.config().roi_fraction)?;
            let rows = pipeline.process_many(std::slice::from_ref(&clip));
            report(&pipeline, &rows, &[clip], &args.common)
        }
        Commands::Simulate(args) => simulate(args),
    }
}

fn load_pipeline(common: &CommonArgs) -> Result<VitalsPipeline> {
    let config = match &common.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    Ok(VitalsPipeline::new(config)?)
}

fn sample_frames(dir: &Path, fps: Option<f64>, roi_fraction: f64) -> Result<ClipRecording> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("cannot list frames in {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    if frames.is_empty() {
        bail!("no PNG frames found in {}", dir.display());
    }
    frames.sort();
    let mut sampler = FrameSampler::new(label_for(dir), fps, roi_fraction);
    for frame in &frames {
        sampler
            .push_image_file(frame)
            .with_context(|| format!("failed to sample {}", frame.display()))?;
    }
    info!("sampled {} frames from {}", frames.len(), dir.display());
    Ok(sampler.finish())
}

fn report(
    pipeline: &VitalsPipeline,
    rows: &[SummaryRow],
    clips: &[ClipRecording],
    common: &CommonArgs,
) -> Result<()> {
    for row in rows.iter().filter(|r| !r.result.ok()) {
        if let Some(reason) = row.result.reason() {
            warn!("skipping '{}': {reason}", row.label);
        }
    }
    let json = serde_json::to_string_pretty(rows)?;
    match &common.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    if let Some(path) = &common.csv {
        let file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_summary_csv(rows, io::BufWriter::new(file))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    if let Some(dir) = &common.plot_dir {
        write_plots(pipeline, rows, clips, dir)?;
    }
    Ok(())
}

fn write_plots(
    pipeline: &VitalsPipeline,
    rows: &[SummaryRow],
    clips: &[ClipRecording],
    dir: &Path,
) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let config = pipeline.config();
    for metric in Metric::ALL {
        match render_metric_bars_png(rows, metric, PlotStyle::default()) {
            Ok(png) => fs::write(dir.join(format!("{}.png", metric.file_stem())), png)?,
            Err(e) => warn!("{}: {e}", metric.file_stem()),
        }
    }
    for clip in clips {
        let Ok(analysis) = pipeline.analyze(clip) else {
            continue;
        };
        let png = render_spectrum_png(
            &analysis.spectrum,
            &[config.heart, config.respiration],
            PlotStyle::default(),
        )?;
        fs::write(dir.join(format!("{}_spectrum.png", clip.label)), png)?;
        if !analysis.spo2_trend.windows.is_empty() {
            let png = render_spo2_trend_png(&analysis.spo2_trend, PlotStyle::default())?;
            fs::write(dir.join(format!("{}_spo2_trend.png", clip.label)), png)?;
        }
    }
    info!("plots saved in {}", dir.display());
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    if !(args.fps > 0.0 && args.seconds > 0.0) {
        bail!("--fps and --seconds must be positive");
    }
    let spec = SyntheticClip {
        label: "synthetic".into(),
        sample_rate_hz: args.fps,
        seconds: args.seconds,
        heart_rate_bpm: args.heart_rate,
        breathing_rate_bpm: args.breathing_rate,
        noise_std: args.noise,
        ..SyntheticClip::default()
    };
    let clip = SyntheticSource::new(Vec::new(), args.seed).generate(&spec)?;
    match args.output {
        Some(path) => {
            let file = fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_channel_csv(&clip, io::BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {} frames to {}", clip.frame_count(), path.display());
        }
        None => write_channel_csv(&clip, io::stdout().lock())?,
    }
    Ok(())
}
