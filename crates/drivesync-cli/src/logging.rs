//! Logging and tracing initialization
//!
//! Every event is rendered as `[<timestamp> - <LEVEL>]: <message>` on
//! stderr, and optionally mirrored to a file with its own level.

use std::fmt::{self, Write as _};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use drivesync_core::config::LoggingConfig;

/// Crates whose events are shown at the configured level; everything else
/// is limited to warnings.
const OWN_TARGETS: [&str; 3] = ["drivesync", "drivesync_core", "drivesync_drive"];

// ============================================================================
// Event format
// ============================================================================

/// `[2024-01-31 14:02:11,512 - INFO]: message`
pub struct BracketFormat;

impl<S, N> FormatEvent<S, N> for BracketFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = event.metadata().level();
        let level = if *level == Level::WARN {
            "WARNING"
        } else {
            level.as_str()
        };
        write!(
            writer,
            "[{} - {}]: ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Console level from the command-line flags, falling back to the config
pub fn console_level(configured: &str, verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Filter directives showing this program's events at `level`
pub fn directives(level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(OWN_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Opens `path` for appending behind a background writer thread
///
/// Events are queued and written by the worker; dropping the guard flushes
/// what is still queued.
fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    Ok(tracing_appender::non_blocking(open_log_file(path)?))
}

/// Installs the global subscriber
///
/// `RUST_LOG` replaces the console filter when set. The returned guard must
/// be held until the program exits so the log file is flushed.
pub fn init(config: &LoggingConfig, verbose: u8, quiet: bool) -> Result<Option<WorkerGuard>> {
    let level = console_level(&config.level, verbose, quiet);
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives(&level)))
        .context("Failed to create log filter")?;

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(BracketFormat)
        .with_writer(io::stderr)
        .with_filter(console_filter);

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let filter = EnvFilter::try_new(directives(&config.file_level))
                .context("Failed to create log file filter")?;
            let layer = tracing_subscriber::fmt::layer()
                .event_format(BracketFormat)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
