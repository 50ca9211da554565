//! Console logging gated by `INFERCORE_TRACE`.
//!
//! `1` or `basic` turns on trace and error output, `full` adds warnings.
//! Critical messages always print.

use std::env;
use std::fmt::Arguments;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum TraceLevel {
    Off,
    Basic,
    Full,
}

/// Message severity. Each one names the lowest trace level that shows it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Trace,
    Warning,
    Error,
    Critical,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    fn ansi_color(self) -> u8 {
        match self {
            Severity::Trace => 34,
            Severity::Warning => 33,
            Severity::Error => 91,
            Severity::Critical => 31,
        }
    }

    fn threshold(self) -> TraceLevel {
        match self {
            Severity::Trace | Severity::Error => TraceLevel::Basic,
            Severity::Warning => TraceLevel::Full,
            Severity::Critical => TraceLevel::Off,
        }
    }
}

const TRACE_ENV: &str = "INFERCORE_TRACE";

static LEVEL: OnceLock<TraceLevel> = OnceLock::new();

pub fn parse_trace_level(value: &str) -> TraceLevel {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "basic" => TraceLevel::Basic,
        "full" => TraceLevel::Full,
        _ => TraceLevel::Off,
    }
}

/// Level read from the environment on first use and cached afterwards.
pub fn trace_level() -> TraceLevel {
    *LEVEL.get_or_init(|| match env::var(TRACE_ENV) {
        Ok(raw) => parse_trace_level(&raw),
        Err(_) => TraceLevel::Off,
    })
}

pub fn enabled(severity: Severity) -> bool {
    trace_level() >= severity.threshold()
}

fn clock() -> (u64, u64, u64) {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let day = secs % 86_400;
    (day / 3_600, day / 60 % 60, day % 60)
}

/// Writes one line to stderr when `severity` passes the current level.
/// Write failures are ignored.
pub fn log(severity: Severity, args: Arguments) {
    if !enabled(severity) {
        return;
    }
    let (h, m, s) = clock();
    let mut out = std::io::stderr().lock();
    let _ = writeln!(
        out,
        "{h:02}:{m:02}:{s:02} [\u{001b}[{}m{}\u{001b}[0m] infercore -- {args}",
        severity.ansi_color(),
        severity.label(),
    );
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Severity::Trace, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Severity::Warning, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Severity::Error, format_args!($($arg)*))
    };
}

/// Always printed, whatever the trace level.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Severity::Critical, format_args!($($arg)*))
    };
}
