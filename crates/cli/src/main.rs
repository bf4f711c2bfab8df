use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use crowd_zones_core::annotation::infrastructure::font_loader::load_font;
use crowd_zones_core::annotation::infrastructure::imageproc_annotator::ImageprocAnnotator;
use crowd_zones_core::config::monitor_config::{DetectorParameters, MonitorConfig};
use crowd_zones_core::detection::domain::face_detector::FaceDetector;
use crowd_zones_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use crowd_zones_core::pipeline::frame_pipeline::{FramePipeline, RunSummary, StopReason};
use crowd_zones_core::pipeline::pipeline_logger::CliPipelineLogger;
use crowd_zones_core::pipeline::preprocessor::Preprocessor;
use crowd_zones_core::pipeline::stop_signal::{
    quit_hint, spawn_key_listener, AnyOf, CancellationFlag, FrameLimit, NeverStop, StopSignal,
};
use crowd_zones_core::shared::clock::SystemClock;
use crowd_zones_core::shared::constants::QUIT_KEY;
use crowd_zones_core::video::domain::frame_sink::FrameSink;
use crowd_zones_core::video::domain::video_reader::{VideoReader, VideoSource};
use crowd_zones_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crowd_zones_core::video::infrastructure::log_sink::LogSink;
use crowd_zones_core::video::infrastructure::snapshot_sink::SnapshotSink;

/// Live per-zone face counts from a camera, video file or stream.
#[derive(Parser)]
#[command(name = "crowd-zones", after_help = stop_help())]
struct Cli {
    /// Video file, stream URL, or camera index (e.g. 0).
    input: String,

    /// JSON configuration file (zones, working resolution, detector tuning).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Face detector backend.
    #[arg(long, value_enum, default_value = "blazeface")]
    detector: DetectorKind,

    /// BlazeFace ONNX model (required for --detector blazeface).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Haar cascade XML (required for --detector cascade).
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Keep this image file updated with the latest annotated frame.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Log progress and counts every N frames.
    #[arg(long, default_value = "30")]
    progress_every: usize,

    /// Working width (overrides config).
    #[arg(long)]
    width: Option<u32>,

    /// Working height (overrides config).
    #[arg(long)]
    height: Option<u32>,

    /// Cascade pyramid step, > 1.0 (overrides config).
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Cascade neighbor threshold (overrides config).
    #[arg(long)]
    min_neighbors: Option<u32>,

    /// Detection confidence threshold, 0.0-1.0 (overrides config).
    #[arg(long)]
    confidence: Option<f64>,

    /// TrueType font for labels and timestamp (overrides config).
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DetectorKind {
    Blazeface,
    Cascade,
}

/// Stopping instructions shown under `--help`.
fn stop_help() -> String {
    format!(
        "While running, {}.\nCamera and stream sources run until stopped.",
        quit_hint(QUIT_KEY)
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(summary) => {
            if let StopReason::AcquisitionFailed(message) = summary.stop_reason {
                eprintln!("Error: {message}");
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<RunSummary, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut config = MonitorConfig::resolve(cli.config.as_deref())?;
    apply_overrides(&cli, &mut config);
    config.validate()?;
    let zones = config.build_registry()?;
    log::info!("Monitoring {} zones", zones.len());

    let detector = build_detector(&cli, &config.detector)?;
    let annotator = ImageprocAnnotator::new(load_font(config.font_path.as_deref()));

    let source = VideoSource::parse(&cli.input);
    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(&source)?;
    if metadata.is_live() {
        log::info!("Live source; {}", quit_hint(QUIT_KEY));
    } else {
        log::info!("Processing {} frames; {}", metadata.total_frames, quit_hint(QUIT_KEY));
    }

    let sink: Box<dyn FrameSink> = match &cli.snapshot {
        Some(path) => {
            log::info!("Writing annotated frames to {}", path.display());
            Box::new(SnapshotSink::new(path))
        }
        None => Box::new(LogSink::new()),
    };

    let flag = CancellationFlag::new();
    install_stop_handlers(&flag)?;
    let stop: Box<dyn StopSignal> = match cli.max_frames {
        Some(n) => Box::new(AnyOf(flag, FrameLimit::new(n))),
        None => Box::new(AnyOf(flag, NeverStop)),
    };

    let resolution = config.working_resolution;
    let mut pipeline = FramePipeline::new(
        reader,
        &metadata,
        detector,
        Box::new(annotator),
        sink,
        zones,
        Preprocessor::new(resolution.width, resolution.height),
        Box::new(SystemClock),
        stop,
        Box::new(CliPipelineLogger::new(cli.progress_every)),
    );

    let summary = pipeline.run()?;
    log::info!(
        "Stopped ({:?}): {} frames read, {} emitted, {} skipped",
        summary.stop_reason,
        summary.frames_read,
        summary.frames_emitted,
        summary.frames_skipped
    );
    Ok(summary)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let VideoSource::Path(path) = VideoSource::parse(&cli.input) {
        if !cli.input.contains("://") && !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    if let Some(config) = &cli.config {
        if !config.is_file() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    match cli.detector {
        DetectorKind::Blazeface if cli.model.is_none() => {
            return Err("--model is required for the blazeface detector".into());
        }
        DetectorKind::Cascade if cli.cascade.is_none() => {
            return Err("--cascade is required for the cascade detector".into());
        }
        _ => {}
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    Ok(())
}

/// Command-line values win over the configuration file.
fn apply_overrides(cli: &Cli, config: &mut MonitorConfig) {
    if let Some(width) = cli.width {
        config.working_resolution.width = width;
    }
    if let Some(height) = cli.height {
        config.working_resolution.height = height;
    }
    if let Some(scale_factor) = cli.scale_factor {
        config.detector.scale_factor = scale_factor;
    }
    if let Some(min_neighbors) = cli.min_neighbors {
        config.detector.min_neighbors = min_neighbors;
    }
    if let Some(confidence) = cli.confidence {
        config.detector.confidence = confidence;
    }
    if let Some(font) = &cli.font {
        config.font_path = Some(font.clone());
    }
}

fn build_detector(
    cli: &Cli,
    params: &DetectorParameters,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    match cli.detector {
        DetectorKind::Blazeface => {
            let model = cli.model.as_deref().ok_or("--model is required")?;
            log::info!("Using BlazeFace detector");
            Ok(Box::new(OnnxBlazefaceDetector::new(model, params.confidence)?))
        }
        DetectorKind::Cascade => build_cascade(cli, params),
    }
}

#[cfg(feature = "opencv-cascade")]
fn build_cascade(
    cli: &Cli,
    params: &DetectorParameters,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    use crowd_zones_core::detection::infrastructure::cascade_detector::{
        CascadeDetector, CascadeParameters,
    };

    let path = cli.cascade.as_deref().ok_or("--cascade is required")?;
    log::info!("Using Haar cascade detector");
    let detector = CascadeDetector::new(
        path,
        CascadeParameters {
            scale_factor: params.scale_factor,
            min_neighbors: params.min_neighbors,
            min_size: params.min_size,
        },
    )?;
    Ok(Box::new(detector))
}

#[cfg(not(feature = "opencv-cascade"))]
fn build_cascade(
    _cli: &Cli,
    _params: &DetectorParameters,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    Err("the cascade detector needs a build with `--features opencv-cascade`".into())
}

/// Ctrl-C and the quit key both raise `flag`.
fn install_stop_handlers(flag: &CancellationFlag) -> Result<(), Box<dyn std::error::Error>> {
    let on_interrupt = flag.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupted; finishing current frame");
        on_interrupt.cancel();
    })?;
    // Detached: the listener may block on stdin until process exit.
    let _listener = spawn_key_listener(flag.clone(), QUIT_KEY)?;
    Ok(())
}
