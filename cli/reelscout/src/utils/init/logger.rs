use std::io;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use tracing::{debug, error};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::EitherWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;
use crate::utils::message;

const LOG_FILE_PREFIX: &str = "reelscout";
const LOG_FILE_SUFFIX: &str = "log";

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();
static LOG_FILE: OnceLock<NonBlocking> = OnceLock::new();

/// Writes to stderr until logs are redirected with [init_log_file].
struct StderrUntilLogFile;
impl<'a> MakeWriter<'a> for StderrUntilLogFile {
    type Writer = EitherWriter<io::Stderr, io::Sink>;

    fn make_writer(&'a self) -> Self::Writer {
        match LOG_FILE.get() {
            None => EitherWriter::A(io::stderr()),
            Some(_) => EitherWriter::B(io::sink()),
        }
    }
}

/// Writes to the log file once it is set up.
struct LogFile;
impl<'a> MakeWriter<'a> for LogFile {
    type Writer = EitherWriter<NonBlocking, io::Sink>;

    fn make_writer(&'a self) -> Self::Writer {
        match LOG_FILE.get() {
            Some(file) => EitherWriter::A(file.clone()),
            None => EitherWriter::B(io::sink()),
        }
    }
}

fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,reelscout=error,reelscout_core=error,reelscout_catalog=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,reelscout=warn,reelscout_core=warn,reelscout_catalog=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,reelscout=info,reelscout_core=info,reelscout_catalog=info",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => {
            "off,reelscout=debug,reelscout_core=debug,reelscout_catalog=debug"
        },
        // Also show trace from our libraries
        Verbosity::Verbose(3) => {
            "off,reelscout=trace,reelscout_core=trace,reelscout_catalog=trace"
        },
        // Also show debug from dependencies
        Verbosity::Verbose(4) => {
            "debug,reelscout=trace,reelscout_core=trace,reelscout_catalog=trace"
        },
        Verbosity::Verbose(_) => "trace",
    }
}

pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let log_filter = log_filter(verbosity.unwrap_or_default());

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
        let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
        let stderr_layer = tracing_subscriber::fmt::layer().with_writer(StderrUntilLogFile);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(LogFile);

        let result = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init();
        if let Err(err) = result {
            message::warning(format!("Could not initialize logger: {err}"));
        }
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

fn open_log_file(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory: {dir:?}"))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(dir)
        .with_context(|| format!("Could not open log file in {dir:?}"))
}

/// Redirect all further logs to `reelscout.log` in `dir`.
///
/// Logs are written by a background worker;
/// the returned guard flushes them when dropped.
pub(crate) fn init_log_file(dir: &Path) -> Result<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(open_log_file(dir)?);
    if LOG_FILE.set(writer).is_err() {
        bail!("Log file is already set up");
    }
    debug!(
        path = %dir.join(format!("{LOG_FILE_PREFIX}.{LOG_FILE_SUFFIX}")).display(),
        "logging to file"
    );
    Ok(guard)
}
