//! Subscriber writing each formatted event to a line callback.
//!
//! # Design
//! - Hosts without a process stderr (the browser console) receive one
//!   complete line per event together with its level.
//! - Timestamps are left to the host; `SystemTime` is unavailable on wasm32.

use std::io;
use std::sync::Arc;

use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

type LineFn = dyn Fn(Level, &str) + Send + Sync;

/// [`MakeWriter`] handing every event to a line callback.
#[derive(Clone)]
pub struct LineSink {
    emit: Arc<LineFn>,
}

impl LineSink {
    /// Wrap a callback receiving the event level and formatted line.
    #[must_use]
    pub fn new(emit: impl Fn(Level, &str) + Send + Sync + 'static) -> Self {
        Self {
            emit: Arc::new(emit),
        }
    }
}

impl std::fmt::Debug for LineSink {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("LineSink")
    }
}

/// Buffer for one event; the line is emitted when the buffer drops.
pub struct LineBuffer {
    emit: Arc<LineFn>,
    level: Level,
    buffer: Vec<u8>,
}

impl io::Write for LineBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineBuffer {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if !line.is_empty() {
            (self.emit)(self.level, line);
        }
    }
}

impl<'a> MakeWriter<'a> for LineSink {
    type Writer = LineBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        LineBuffer {
            emit: Arc::clone(&self.emit),
            level: Level::INFO,
            buffer: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        LineBuffer {
            emit: Arc::clone(&self.emit),
            level: *meta.level(),
            buffer: Vec::new(),
        }
    }
}

/// Build a subscriber filtered at `level` that writes through `sink`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when `level` is not a valid
/// filter directive.
pub fn sink_subscriber(
    level: &str,
    sink: LineSink,
) -> Result<impl Subscriber + Send + Sync + use<>> {
    let filter = EnvFilter::try_new(level).map_err(|source| TelemetryError::InvalidFilter {
        directive: level.to_string(),
        source,
    })?;
    Ok(tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(sink)
            .without_time()
            .with_ansi(false)
            .with_target(false),
    ))
}

/// Install a [`sink_subscriber`] as the global subscriber.
///
/// # Errors
///
/// See [`sink_subscriber`]; also fails when a global subscriber is already
/// installed.
pub fn init_sink_logging(level: &str, sink: LineSink) -> Result<()> {
    sink_subscriber(level, sink)?
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn capture() -> (LineSink, Arc<Mutex<Vec<(Level, String)>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&lines);
        let sink = LineSink::new(move |level, line| {
            if let Ok(mut lines) = recorded.lock() {
                lines.push((level, line.to_string()));
            }
        });
        (sink, lines)
    }

    #[test]
    fn events_reach_the_sink_with_their_level()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (sink, lines) = capture();
        let subscriber = sink_subscriber("info", sink)?;
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("filtered out");
            tracing::info!(page = 2, "projects page applied");
            tracing::warn!("projects page failed");
        });

        let lines = lines.lock().map_err(|_| "poisoned")?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, Level::INFO);
        assert!(lines[0].1.contains("projects page applied"));
        assert!(lines[0].1.contains("page=2"));
        assert!(!lines[0].1.ends_with('\n'));
        assert_eq!(lines[1].0, Level::WARN);
        Ok(())
    }

    #[test]
    fn invalid_level_is_rejected() {
        let (sink, _) = capture();
        assert!(matches!(
            sink_subscriber("vigil=loud", sink),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }
}
