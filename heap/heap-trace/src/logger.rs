use crate::trace_fmt::trace_write;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fmt;
use std::sync::OnceLock;

/// Where formatted log lines go.
pub type Sink = fn(fmt::Arguments);

pub struct TraceLogger {
    max_level: LevelFilter,
    sink: Sink,
}

impl TraceLogger {
    /// Log to stderr up to `max_level`.
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self::with_sink(max_level, trace_write)
    }

    #[must_use]
    pub const fn with_sink(max_level: LevelFilter, sink: Sink) -> Self {
        Self { max_level, sink }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Install as the process-wide logger. Only the first call in a process
    /// succeeds.
    ///
    /// # Errors
    /// If any logger, this one included, is already installed.
    pub fn init(self) -> Result<(), SetLoggerError> {
        static LOGGER: OnceLock<TraceLogger> = OnceLock::new();

        let max_level = self.max_level;
        // a slot claimed by an earlier call makes `set_logger` fail below
        let logger = LOGGER.get_or_init(|| self);
        log::set_logger(logger)?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for TraceLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        (self.sink)(format_args!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {
        // stderr is unbuffered
    }
}
