use crate::error::{KitError, Result};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::{debug, error, info, warn, Event, Subscriber};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{
        format::{self, FormatEvent, FormatFields},
        time::{ChronoLocal, ChronoUtc},
        FmtContext,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    EnvFilter, Layer, Registry,
};

pub const SUMMARY_LOG: &str = "process.log";
pub const DETAIL_LOG: &str = "process_details.log";

const SUMMARY_TIME_FORMAT: &str = "%Y%m%d %H%M%S";
const DETAIL_TIME_FORMAT: &str = "%Y%m%d %H%M%S %3f";

/// Where and how a run writes its logs.
#[derive(Debug, Clone)]
pub struct RunLoggerConfig {
    pub log_dir: PathBuf,
    /// Also write the detailed log (`process_details.log`).
    pub detail: bool,
    /// Mirror events to stdout, filtered by `RUST_LOG`.
    pub console: bool,
}

impl RunLoggerConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            detail: true,
            console: false,
        }
    }
}

/// `20150625 101500 - INFO - message`
struct SummaryFormat;

impl<S, N> FormatEvent<S, N> for SummaryFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            chrono::Local::now().format(SUMMARY_TIME_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Logging for one run: summary and detail files opened in overwrite mode.
///
/// The subscriber is installed as the default for the current thread only and
/// is removed again by [`RunLogger::stop`] (or on drop), which also flushes and
/// closes the files.
pub struct RunLogger {
    guard: Option<DefaultGuard>,
    files: Vec<File>,
    paths: Vec<PathBuf>,
}

impl RunLogger {
    pub fn start(config: &RunLoggerConfig) -> Result<Self> {
        fs::create_dir_all(&config.log_dir).map_err(|source| KitError::FolderCreation {
            path: config.log_dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        let mut paths = Vec::new();

        let summary_path = config.log_dir.join(SUMMARY_LOG);
        let summary = File::create(&summary_path)?;
        files.push(summary.try_clone()?);
        paths.push(summary_path);

        let summary_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(SummaryFormat)
            .with_writer(Mutex::new(summary))
            .with_filter(LevelFilter::DEBUG);

        let detail_layer = if config.detail {
            let detail_path = config.log_dir.join(DETAIL_LOG);
            let detail = File::create(&detail_path)?;
            files.push(detail.try_clone()?);
            paths.push(detail_path);

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_timer(ChronoLocal::new(DETAIL_TIME_FORMAT.to_string()))
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(Mutex::new(detail))
                    .with_filter(LevelFilter::DEBUG),
            )
        } else {
            None
        };

        let console_layer = if config.console {
            let env_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .compact()
                    .with_filter(env_filter),
            )
        } else {
            None
        };

        let subscriber = Registry::default()
            .with(summary_layer)
            .with(detail_layer)
            .with(console_layer);

        let guard = tracing::subscriber::set_default(subscriber);

        Ok(Self {
            guard: Some(guard),
            files,
            paths,
        })
    }

    /// Paths of the log files this run writes to.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn stop(mut self) -> Result<()> {
        self.close()
    }

    fn close(&mut self) -> Result<()> {
        // uninstall first so nothing writes while the files are synced
        self.guard.take();
        for file in &mut self.files {
            file.flush()?;
            file.sync_all()?;
        }
        self.files.clear();
        Ok(())
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Logger struct for contextual logging
#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
        }
    }

    pub fn info(&self, message: &str) {
        info!("{}: {}", self.context, message);
    }

    pub fn info_with_data<T>(&self, message: &str, data: T)
    where
        T: std::fmt::Debug,
    {
        info!("{}: {} - {:?}", self.context, message, data);
    }

    pub fn warn(&self, message: &str) {
        warn!("{}: {}", self.context, message);
    }

    pub fn warn_with_error(&self, message: &str, error: &dyn std::error::Error) {
        warn!("{}: {}: {}", self.context, message, error);
    }

    pub fn error_with_error(&self, message: &str, error: &dyn std::error::Error) {
        error!("{}: {}: {}", self.context, message, error);
    }

    pub fn debug(&self, message: &str) {
        debug!("{}: {}", self.context, message);
    }
}

/// Performance timing helper
pub struct Timer {
    start: std::time::Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        Self {
            start: std::time::Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn log_elapsed(&self, context: &str) {
        info!("{}: {} completed in {:.1}ms", context, self.name, self.elapsed_ms());
    }
}
