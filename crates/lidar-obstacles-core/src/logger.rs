//! Stderr logging for frame processing.
//!
//! Each record is tagged with the pipeline stage that emitted it, derived
//! from the crate in the record target:
//!
//! ```text
//!     0.412s DEBUG ground   | 5820 inliers after 100 iterations
//! ```
//!
//! [`init_with_level`] installs the `log` backend; with the `tracing`
//! feature, [`init_tracing`] installs a subscriber that also reports stage
//! span durations.

use std::fmt::Arguments;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Stage label for a record target such as `lidar_obstacles_ground::ransac`.
fn stage_label(target: &str) -> &str {
    let krate = target.split("::").next().unwrap_or(target);
    match krate {
        "point_kdtree" => "kdtree",
        "lidar_obstacles" => "frame",
        other => other.strip_prefix("lidar_obstacles_").unwrap_or(other),
    }
}

fn render(elapsed: Duration, level: Level, target: &str, args: &Arguments<'_>) -> String {
    format!(
        "{:>9.3}s {:<5} {:<8} | {}",
        elapsed.as_secs_f64(),
        level,
        stage_label(target),
        args
    )
}

struct FrameLog {
    max: LevelFilter,
    epoch: Instant,
}

impl Log for FrameLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = render(
                self.epoch.elapsed(),
                record.level(),
                record.target(),
                record.args(),
            );
            // A closed stderr is not worth failing a frame over.
            let _ = writeln!(std::io::stderr().lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static FRAME_LOG: OnceLock<FrameLog> = OnceLock::new();

/// Route `log` records at or above `level` to stderr.
///
/// Only the first call installs the backend and picks the level; later
/// calls return `Ok(())` and change nothing. Fails if another `log`
/// backend was installed first.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut fresh = false;
    let backend = FRAME_LOG.get_or_init(|| {
        fresh = true;
        FrameLog {
            max: level,
            epoch: Instant::now(),
        }
    });
    if fresh {
        log::set_logger(backend)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install a `tracing` subscriber on stderr.
///
/// Closed spans are reported with their duration, which gives per-stage
/// timings for `FrameProcessor::process`. The filter is read from
/// `RUST_LOG` (default `info`); `json` switches to one JSON object per line.
/// `log` records are forwarded into the subscriber. Does nothing if a
/// global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    use tracing_subscriber::fmt::{format::FmtSpan, time::Uptime};
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stages = fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry
            .with(stages.json().flatten_event(true))
            .try_init()
    } else {
        registry.with(stages.with_timer(Uptime::default())).try_init()
    };
}
