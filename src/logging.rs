//! Logging gate
//!
//! A single process-wide severity threshold decides which library log lines
//! are emitted. Call sites use [`log_if`], which yields a [`Logger`] only when
//! the requested level clears the threshold:
//!
//! ```rust,ignore
//! if let Some(logger) = log_if(LogLevel::Debug) {
//!     logger.debug(format!("sending {} bytes", body.len()));
//! }
//! ```
//!
//! Lines are emitted as `tracing` events under the `aiproxy` target.
//! [`init_stdout_logging`] installs a subscriber that prints them to stdout as
//! `[<timestamp>] [<LEVEL>] [<subsystem>/<category>] <message>`.

use std::fmt;
use std::sync::{OnceLock, RwLock};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::error::{AiProxyError, Result};

/// Target attached to every event emitted by the gate
pub const LOG_TARGET: &str = "aiproxy";

const CATEGORY: &str = "AIProxy";

/// Severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn is_at_or_above(self, threshold: LogLevel) -> bool {
        self >= threshold
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity threshold guarded by a reader/writer lock.
///
/// Writes are exclusive with every other access; reads run concurrently and
/// observe the last completed write.
#[derive(Debug)]
pub struct LogThreshold {
    level: RwLock<LogLevel>,
}

impl LogThreshold {
    pub const fn new(level: LogLevel) -> Self {
        Self {
            level: RwLock::new(level),
        }
    }

    pub fn get(&self) -> LogLevel {
        // A poisoned lock still holds a fully written `Copy` value.
        match self.level.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set(&self, level: LogLevel) {
        match self.level.write() {
            Ok(mut guard) => *guard = level,
            Err(poisoned) => *poisoned.into_inner() = level,
        }
    }

    pub fn allows(&self, level: LogLevel) -> bool {
        level.is_at_or_above(self.get())
    }
}

impl Default for LogThreshold {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

static THRESHOLD: LogThreshold = LogThreshold::new(LogLevel::Warning);

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Set the process-wide threshold.
pub fn set_log_level(level: LogLevel) {
    THRESHOLD.set(level);
}

/// Current process-wide threshold.
pub fn log_level() -> LogLevel {
    THRESHOLD.get()
}

/// Returns the library logger when `level` clears the current threshold.
#[inline]
pub fn log_if(level: LogLevel) -> Option<&'static Logger> {
    THRESHOLD.allows(level).then(logger)
}

/// The library logger without the threshold check.
///
/// Used for output the caller opted into explicitly, such as request and
/// response bodies.
pub fn ungated_logger() -> &'static Logger {
    logger()
}

fn logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(default_subsystem(), CATEGORY))
}

/// Name of the running program, standing in for an application identifier.
fn default_subsystem() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "UnknownApp".to_string())
}

/// Emits library log lines tagged with a subsystem and category.
#[derive(Debug, Clone)]
pub struct Logger {
    subsystem: String,
    category: String,
}

macro_rules! emit {
    ($level:expr, $logger:expr, $severity:expr, $message:expr) => {
        tracing::event!(
            target: LOG_TARGET,
            $level,
            severity = $severity,
            subsystem = %$logger.subsystem,
            category = %$logger.category,
            "{}",
            $message
        )
    };
}

impl Logger {
    pub fn new(subsystem: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            subsystem: subsystem.into(),
            category: category.into(),
        }
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message.as_ref());
    }

    pub fn critical(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Critical, message.as_ref());
    }

    fn log(&self, level: LogLevel, message: &str) {
        if THRESHOLD.allows(level) {
            self.emit(level, message);
        }
    }

    /// Emit regardless of the process-wide threshold.
    pub fn emit(&self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        let severity = level.as_str();
        match level {
            LogLevel::Debug => emit!(Level::DEBUG, self, severity, message),
            LogLevel::Info => emit!(Level::INFO, self, severity, message),
            LogLevel::Warning => emit!(Level::WARN, self, severity, message),
            LogLevel::Error | LogLevel::Critical => emit!(Level::ERROR, self, severity, message),
        }
    }
}

/// Render one log line.
pub fn format_line(
    timestamp: DateTime<Utc>,
    severity: &str,
    subsystem: &str,
    category: &str,
    message: &str,
) -> String {
    format!(
        "[{}] [{}] [{}/{}] {}",
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        severity.to_uppercase(),
        subsystem,
        category,
        message
    )
}

/// Event formatter producing the gate's line format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

#[derive(Default)]
struct LineVisitor {
    severity: Option<String>,
    subsystem: Option<String>,
    category: Option<String>,
    message: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "severity" => self.severity = Some(value.to_string()),
            "subsystem" => self.subsystem = Some(value.to_string()),
            "category" => self.category = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        match field.name() {
            "severity" => self.severity = Some(rendered),
            "subsystem" => self.subsystem = Some(rendered),
            "category" => self.category = Some(rendered),
            "message" => self.message = rendered,
            _ => {}
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let severity = visitor
            .severity
            .unwrap_or_else(|| event.metadata().level().to_string());
        writeln!(
            writer,
            "{}",
            format_line(
                Utc::now(),
                &severity,
                visitor.subsystem.as_deref().unwrap_or("UnknownApp"),
                visitor.category.as_deref().unwrap_or(CATEGORY),
                &visitor.message,
            )
        )
    }
}

/// Install a stdout subscriber for the library's log lines.
///
/// Fails if a global subscriber is already installed.
pub fn init_stdout_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!("{LOG_TARGET}=trace")))
        .event_format(LineFormat)
        .try_init()
        .map_err(|e| AiProxyError::ConfigurationError(format!("Failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tracing_test::traced_test;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
        assert_eq!(LogLevel::default(), LogLevel::Warning);
    }

    #[test]
    fn test_threshold_gates_levels() {
        let threshold = LogThreshold::default();
        assert!(!threshold.allows(LogLevel::Info));
        assert!(threshold.allows(LogLevel::Warning));
        assert!(threshold.allows(LogLevel::Critical));

        threshold.set(LogLevel::Debug);
        assert!(threshold.allows(LogLevel::Debug));

        threshold.set(LogLevel::Critical);
        assert!(!threshold.allows(LogLevel::Error));
    }

    #[test]
    fn test_concurrent_reads_never_observe_torn_values() {
        let threshold = LogThreshold::new(LogLevel::Warning);

        std::thread::scope(|scope| {
            let readers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..10_000)
                            .map(|_| threshold.get())
                            .all(|level| matches!(level, LogLevel::Warning | LogLevel::Error))
                    })
                })
                .collect();

            scope.spawn(|| {
                for _ in 0..1_000 {
                    threshold.set(LogLevel::Error);
                    threshold.set(LogLevel::Warning);
                }
                threshold.set(LogLevel::Error);
            });

            for reader in readers {
                assert!(reader.join().unwrap());
            }
        });

        assert_eq!(threshold.get(), LogLevel::Error);
    }

    #[test]
    fn test_format_line() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 27, 9, 30, 0).unwrap();
        let line = format_line(ts, "warning", "MyApp", "AIProxy", "hello");
        assert_eq!(line, "[2025-01-27T09:30:00Z] [WARNING] [MyApp/AIProxy] hello");
    }

    #[test]
    fn test_level_serde_names() {
        let level: LogLevel = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(level, LogLevel::Critical);
        assert_eq!(serde_json::to_string(&LogLevel::Info).unwrap(), "\"info\"");
    }

    #[test]
    #[traced_test]
    fn test_logger_emits_at_or_above_default_threshold() {
        let logger = Logger::new("TestApp", "AIProxy");
        logger.error("request failed hard");
        logger.debug("noisy detail");

        assert!(logs_contain("request failed hard"));
        assert!(!logs_contain("noisy detail"));
    }
}
