//! Run Log
//!
//! Console and log-file reporting for a sync run. Every message goes through
//! `tracing`; the subscriber installed by [`init`] writes it to the log file
//! as `timestamp - LEVEL - message`. The console helpers additionally print
//! a colored, timestamped line.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter, Layer};

use crate::error::{Error, Result};

const CONSOLE_TIMESTAMP: &str = "%d%b%Y_%H%M%S";
const FILE_NAME_TIMESTAMP: &str = "%d%b%Y_%H%M";
const LOG_LINE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Console severity of a run message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Log file location for a run: `{output}/LOG_{input stem}_{timestamp}.log`
pub fn log_file_path(output_folder: &Path, repo_file: &Path, started: DateTime<Local>) -> PathBuf {
    let stem = repo_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repos".to_string());

    output_folder.join(format!(
        "LOG_{}_{}.log",
        stem,
        started.format(FILE_NAME_TIMESTAMP)
    ))
}

/// Create the log file (and its directory) and install the global subscriber
///
/// The level filter defaults to `info` and honours `RUST_LOG`.
///
/// # Errors
/// Returns an error if the directory or file cannot be created, or a global
/// subscriber is already installed
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(dir) = log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer(file))
        .try_init()
        .map_err(|e| Error::config_validation(format!("Failed to initialize logging: {}", e)))
}

/// Plain-text layer writing [`LogLineFormat`] lines to `file`
fn file_layer<S>(file: File) -> impl Layer<S> + Send + Sync + 'static
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .event_format(LogLineFormat)
}

/// Level names as they appear in the log file
fn level_name(level: &Level) -> &'static str {
    if *level == Level::ERROR {
        "ERROR"
    } else if *level == Level::WARN {
        "WARNING"
    } else if *level == Level::INFO {
        "INFO"
    } else if *level == Level::DEBUG {
        "DEBUG"
    } else {
        "TRACE"
    }
}

/// `timestamp - LEVEL - message` lines for the log file
struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
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
        write!(
            writer,
            "{} - {} - ",
            Local::now().format(LOG_LINE_TIMESTAMP),
            level_name(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Render a console line with its timestamp and level color
pub fn console_line(severity: Severity, timestamp: DateTime<Local>, message: &str) -> ColoredString {
    let line = format!("{}: {}", timestamp.format(CONSOLE_TIMESTAMP), message);
    match severity {
        Severity::Info => line.normal(),
        Severity::Success => line.green(),
        Severity::Warning => line.truecolor(255, 175, 0),
        Severity::Error => line.red(),
    }
}

/// Print a message to the console and record it in the log file
pub fn emit(severity: Severity, message: &str) {
    match severity {
        Severity::Info | Severity::Success => tracing::info!("{}", message),
        Severity::Warning => tracing::warn!("{}", message),
        Severity::Error => tracing::error!("{}", message),
    }

    let line = console_line(severity, Local::now(), message);
    match severity {
        Severity::Error => eprintln!("{}", line),
        _ => println!("{}", line),
    }
}

pub fn info(message: impl AsRef<str>) {
    emit(Severity::Info, message.as_ref());
}

pub fn success(message: impl AsRef<str>) {
    emit(Severity::Success, message.as_ref());
}

pub fn warning(message: impl AsRef<str>) {
    emit(Severity::Warning, message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    emit(Severity::Error, message.as_ref());
}
