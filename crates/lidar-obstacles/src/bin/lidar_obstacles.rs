use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use lidar_obstacles::io::{load_frame_params, load_point_set, save_result_json};
use lidar_obstacles::{FrameParams, FrameProcessor};
use log::{error, info, LevelFilter};

/// Extract obstacles from LiDAR frames (ASCII PCD or JSON point sets).
#[derive(Debug, Parser)]
#[command(name = "lidar-obstacles", version, about)]
struct Cli {
    /// JSON file with pipeline parameters; missing fields keep their defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// RANSAC seed, overrides the config file.
    #[arg(long)]
    seed: Option<u64>,

    /// Write `<stem>.obstacles.json` per frame into this directory.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Log level for stderr.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Emit JSON log lines (with the `tracing` feature).
    #[cfg(feature = "tracing")]
    #[arg(long)]
    json_logs: bool,

    /// Frame files, processed in order.
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut params = match &cli.config {
        Some(path) => load_frame_params(path)?,
        None => FrameParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.ground.seed = seed;
    }
    let processor = FrameProcessor::new(params)?;

    if let Some(dir) = &cli.out_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut failed = 0usize;
    for path in &cli.files {
        if let Err(err) = run_frame(&processor, path, cli.out_dir.as_deref()) {
            error!("{}: {err}", path.display());
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(format!("{failed} of {} frames failed", cli.files.len()).into());
    }
    Ok(())
}

fn run_frame(
    processor: &FrameProcessor,
    path: &Path,
    out_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = load_point_set(path)?;
    let result = processor.process(&frame)?;
    println!(
        "{}: points={} filtered={} inliers={} clusters={}",
        path.display(),
        frame.len(),
        result.filtered.len(),
        result.segmentation.inliers.len(),
        result.clusters.len()
    );

    if let Some(dir) = out_dir {
        let out = dir.join(format!("{}.obstacles.json", stem(path)));
        save_result_json(&out, &result)?;
        info!("wrote {}", out.display());
    }
    Ok(())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    lidar_obstacles::core::init_tracing(cli.json_logs);
    // Spans follow RUST_LOG; `log` records forwarded into tracing follow the flag.
    log::set_max_level(cli.log_level.into());
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    lidar_obstacles::core::init_with_level(cli.log_level.into())?;
    Ok(())
}
