use std::fs;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Keeps the non-blocking log writer alive; flushes on drop
#[derive(Default)]
pub struct ObservabilityGuard {
    log_guard: Option<WorkerGuard>,
}

impl ObservabilityGuard {
    pub fn writes_file(&self) -> bool {
        self.log_guard.is_some()
    }
}

/// Initialize logging. Events go to stderr so they never interleave with
/// the progress lines on stdout; a log file is added when configured.
pub fn init_observability(config: &LogConfig, debug: bool) -> Result<ObservabilityGuard> {
    let mut guard = ObservabilityGuard::default();

    let file_layer = match &config.file {
        Some(path) => {
            let (writer, worker_guard) = build_file_writer(path)?;
            guard.log_guard = Some(worker_guard);
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_target(debug)
        .with_level(true)
        .with_line_number(debug)
        .with_file(debug)
        .with_writer(std::io::stderr);

    // Global filter: events are filtered first, then passed to all layers
    tracing_subscriber::registry()
        .with(create_env_filter(config, debug))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok();

    Ok(guard)
}

/// Create an EnvFilter from config, with RUST_LOG taking precedence
fn create_env_filter(config: &LogConfig, debug: bool) -> EnvFilter {
    let directive = std::env::var("RUST_LOG")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| {
            if debug {
                "debug".to_string()
            } else {
                config.level.clone()
            }
        });

    EnvFilter::try_new(&directive).unwrap_or_else(|_| {
        eprintln!("Failed to parse filter directive: {directive}. Falling back to default: info");
        EnvFilter::new("info")
    })
}

fn build_file_writer(path: &std::path::Path) -> Result<(NonBlocking, WorkerGuard)> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    Ok(tracing_appender::non_blocking(file))
}
