//! Rolling Logger
//!
//! A `tracing` subscriber that keeps the most recent formatted lines in a
//! bounded in-memory ring and forwards every line to a sink: the browser
//! console inside the extension, stderr everywhere else.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Lines kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 500;

/// Where finished lines go besides the ring.
pub type Sink = fn(Level, &str);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Bounded buffer of recent log lines, oldest first.
#[derive(Debug)]
pub struct LogRing {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: String) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    pub fn recent(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buffers one event's output and emits it line by line on drop.
pub struct RingWriter {
    ring: Arc<LogRing>,
    sink: Sink,
    prefix: Arc<str>,
    level: Level,
    buf: Vec<u8>,
}

impl io::Write for RingWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RingWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let line = format!("{}{}", self.prefix, line);
            (self.sink)(self.level, &line);
            let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
            self.ring.push(format!("{} {}", stamp, line));
        }
    }
}

#[derive(Clone)]
pub struct RingMakeWriter {
    ring: Arc<LogRing>,
    sink: Sink,
    prefix: Arc<str>,
}

impl RingMakeWriter {
    pub fn new(app_name: &str, ring: Arc<LogRing>, sink: Sink) -> Self {
        Self {
            ring,
            sink,
            prefix: Arc::from(format!("[{}] ", app_name)),
        }
    }

    fn writer(&self, level: Level) -> RingWriter {
        RingWriter {
            ring: Arc::clone(&self.ring),
            sink: self.sink,
            prefix: Arc::clone(&self.prefix),
            level,
            buf: Vec::new(),
        }
    }
}

impl<'a> MakeWriter<'a> for RingMakeWriter {
    type Writer = RingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(*meta.level())
    }
}

/// Writes to stderr; the sink for native builds and tests.
pub fn stderr_sink(_level: Level, line: &str) {
    eprintln!("{}", line);
}

/// Discards everything but the ring.
pub fn null_sink(_level: Level, _line: &str) {}

/// `RUST_LOG` when set and valid, else `default_filter`.
pub fn env_filter(default_filter: &str) -> Result<EnvFilter, LoggerError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| LoggerError::InvalidFilter(e.to_string())),
    }
}

/// Builds the subscriber without installing it.
pub fn subscriber(app_name: &str, filter: EnvFilter, ring: Arc<LogRing>, sink: Sink) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(RingMakeWriter::new(app_name, ring, sink))
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .finish()
}

static RING: OnceLock<Arc<LogRing>> = OnceLock::new();

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logger(app_name: &str, default_filter: &str, sink: Sink) -> Result<(), LoggerError> {
    let ring = Arc::clone(RING.get_or_init(|| Arc::new(LogRing::new(DEFAULT_CAPACITY))));
    let subscriber = subscriber(app_name, env_filter(default_filter)?, ring, sink);
    tracing::subscriber::set_global_default(subscriber).map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
}

/// The most recent lines captured by the global logger, oldest first.
pub fn recent_lines() -> Vec<String> {
    RING.get().map(|ring| ring.recent()).unwrap_or_default()
}
