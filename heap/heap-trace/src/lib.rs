//! # Allocation-Free Diagnostics
//!
//! Logging from inside an allocator must not allocate: a logger that builds a
//! `String` while the heap lock is held would re-enter the heap and spin
//! forever. This crate provides output paths that format straight into the
//! process's stderr.
//!
//! ## Components
//!
//! ### [`TraceLogger`]
//! A `log::Log` implementation:
//! * **Level filtering** with a fixed maximum level
//! * **Format**: `[LEVEL] target: message`, one line per record
//! * **Pluggable sink**: any `fn(fmt::Arguments)`; defaults to [`trace_fmt::trace_write`]
//! * **Static installation** via [`TraceLogger::init`], no boxing
//!
//! ### [`heap_trace!`]
//! Direct output that bypasses the `log` facade, for the rare cases where the
//! facade itself is not yet set up.
//!
//! ## Feature `enabled` (default)
//! Without it the default sink and [`heap_trace!`] compile to nothing.
//!
//! ## Usage
//! ```rust,no_run
//! use heap_trace::TraceLogger;
//! use log::{LevelFilter, debug};
//!
//! TraceLogger::new(LevelFilter::Debug).init().expect("logger installed once");
//! debug!("heap ready");
//! ```

mod logger;

pub use logger::TraceLogger;

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod trace_fmt {
    use std::fmt;
    use std::io::Write;

    /// Write formatted output to stderr without heap allocation.
    ///
    /// Best effort: write errors are dropped.
    #[inline]
    pub fn trace_write(args: fmt::Arguments) {
        let _ = std::io::stderr().lock().write_fmt(args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod trace_fmt {
    use std::fmt;

    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn trace_write(_: fmt::Arguments) {
        // no-op when feature disabled
    }
}

#[macro_export]
macro_rules! heap_trace {
    ($($arg:tt)*) => {{
        $crate::trace_fmt::trace_write(::core::format_args!($($arg)*));
    }};
}
