use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// `2025-03-01 14:02:11.532  WARN fleet_core::form::session: message key=value`
/// in local time.
pub struct LocalTimeFormat;

fn level_colour(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

impl<S, N> FormatEvent<S, N> for LocalTimeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "\x1b[2m{timestamp}\x1b[0m {}{:>5}\x1b[0m \x1b[36m{}\x1b[0m: ",
                level_colour(*meta.level()),
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{timestamp} {:>5} {}: ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Shares one writer between every event, e.g. an append-mode log file.
#[derive(Debug)]
pub struct SharedWriter<W>(Arc<Mutex<W>>);

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<W: Write> SharedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self(Arc::new(Mutex::new(inner)))
    }

    /// Runs `f` against the wrapped writer.
    pub fn with_inner<T>(
        &self,
        f: impl FnOnce(&mut W) -> T,
    ) -> T {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

pub struct SharedGuard<'a, W>(MutexGuard<'a, W>);

impl<W: Write> Write for SharedGuard<'_, W> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a, W: Write + 'a> MakeWriter<'a> for SharedWriter<W> {
    type Writer = SharedGuard<'a, W>;

    fn make_writer(&'a self) -> Self::Writer {
        SharedGuard(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// `RUST_LOG` when set, otherwise the configured level.
fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'")),
    }
}

/// Installs the global subscriber. Call once, before the first event.
///
/// Terminal output goes to stderr, coloured when stderr is a terminal. The
/// log file, when configured, is opened in append mode and never coloured.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.level)?;

    let terminal = config.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .event_format(LocalTimeFormat)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
    });

    let file = match &config.file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(LocalTimeFormat)
                    .with_writer(SharedWriter::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(terminal)
        .with(file)
        .try_init()
        .context("logging already initialised")
}

#[cfg(test)]
mod tests {
    use tracing::subscriber::with_default;

    use super::*;

    #[test]
    fn plain_format_has_level_target_and_fields() {
        let buffer = SharedWriter::new(Vec::<u8>::new());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(LocalTimeFormat)
            .with_writer(buffer.clone())
            .finish();

        with_default(subscriber, || {
            tracing::warn!(target: "fleet::test", unit_nr = 7, "discarding stale load result");
        });

        let output = buffer.with_inner(|bytes| String::from_utf8_lossy(bytes).into_owned());
        assert!(output.contains(" WARN fleet::test: "), "{output}");
        assert!(output.contains("discarding stale load result"), "{output}");
        assert!(output.contains("unit_nr=7"), "{output}");
        assert!(!output.contains('\x1b'), "{output}");
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn invalid_level_is_reported() {
        // Only meaningful when RUST_LOG does not take over.
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(build_filter("fleet=loudest").is_err());
        }
        assert!(build_filter("debug").is_ok());
    }
}
