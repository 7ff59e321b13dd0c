//! Session logging.
//!
//! Records go through `tracing` into a [`SessionSink`]. Until a session file is
//! attached the sink buffers in memory; [`init_logging`] creates
//! `{logs}/{profile}/{project}/{environment}/log_{timestamp}.log`, flushes the
//! buffer into it, and sends everything after that straight to the file.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Result;

const DEFAULT_FILTER: &str = "paramsync=info,paramsync_core=info";

enum SinkState {
    Buffering(Vec<u8>),
    Attached(File),
}

/// Shared writer behind the fmt layer. Cloning shares the same destination.
#[derive(Clone)]
pub struct SessionSink {
    state: Arc<Mutex<SinkState>>,
}

impl Default for SessionSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSink {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState::Buffering(Vec::new()))),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, SinkState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))
    }

    /// Route all further records to `file`, after writing out anything buffered.
    pub fn attach(&self, mut file: File) -> io::Result<()> {
        let mut state = self.lock()?;
        if let SinkState::Buffering(buffered) = &*state {
            file.write_all(buffered)?;
        }
        *state = SinkState::Attached(file);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.lock().as_deref(), Ok(SinkState::Attached(_)))
    }
}

impl Write for SessionSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.lock()? {
            SinkState::Buffering(buffered) => {
                buffered.extend_from_slice(buf);
                Ok(buf.len())
            }
            SinkState::Attached(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.lock()? {
            SinkState::Buffering(_) => Ok(()),
            SinkState::Attached(file) => file.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for SessionSink {
    type Writer = SessionSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// `2026-01-31 14:05:09,123 - INFO - message`
pub struct SessionFormat;

impl<S, N> FormatEvent<S, N> for SessionFormat
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
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(sink: SessionSink) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .event_format(SessionFormat)
                .with_writer(sink),
        )
        .init();
}

pub fn session_log_path(
    logs_dir: &Path,
    profile: &str,
    project: &str,
    environment: &str,
    now: DateTime<Local>,
) -> PathBuf {
    logs_dir
        .join(profile)
        .join(project)
        .join(environment)
        .join(format!("log_{}.log", now.format("%Y-%m-%d_%H-%M-%S")))
}

/// Open this run's log file and attach it to `sink`. Returns the file path.
pub fn init_logging(
    sink: &SessionSink,
    logs_dir: &Path,
    profile: &str,
    project: &str,
    environment: &str,
) -> Result<PathBuf> {
    let path = session_log_path(logs_dir, profile, project, environment, Local::now());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;
    sink.attach(file)?;

    tracing::info!(
        "Logging initiated for AWS profile: {}, Project: {}, Environment: {}",
        profile,
        project,
        environment
    );
    Ok(path)
}
