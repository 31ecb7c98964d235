/*
[INPUT]:  Logging call sites (tracing events, direct recorder calls)
[OUTPUT]: Immutable LogMessage records, severity levels, hierarchical sources, styled text items
[POS]:    Data layer - shared log record types (no pipeline logic)
[UPDATE]: When adding message fields or changing level ordering
*/

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const SOURCE_SEPARATOR: &str = "::";

/// Severity of a log message, ordered from most to least severe.
///
/// `Error < Warn < Info < Debug < Trace`, so "up to `Info`" means the
/// inclusive range `Error..=Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::TRACE => LogLevel::Trace,
        }
    }
}

/// Compact set of severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelSet(u8);

impl LevelSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::up_to(LogLevel::Trace)
    }

    /// Levels `Error..=level`.
    pub fn up_to(level: LogLevel) -> Self {
        LogLevel::ALL
            .iter()
            .filter(|l| **l <= level)
            .fold(Self::empty(), |set, l| set.with(*l))
    }

    pub fn with(self, level: LogLevel) -> Self {
        Self(self.0 | level.bit())
    }

    pub fn without(self, level: LogLevel) -> Self {
        Self(self.0 & !level.bit())
    }

    pub fn contains(self, level: LogLevel) -> bool {
        self.0 & level.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = LogLevel> {
        LogLevel::ALL.into_iter().filter(move |l| self.contains(*l))
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Hierarchical origin of a log message, e.g. `hyper::client::pool`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogSource(Arc<str>);

impl LogSource {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SOURCE_SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Last path segment, used as the tree label.
    pub fn leaf(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    pub fn parent(&self) -> Option<LogSource> {
        self.0
            .rfind(SOURCE_SEPARATOR)
            .map(|pos| LogSource::new(&self.0[..pos]))
    }

    /// This source followed by every ancestor, nearest first.
    pub fn ancestry(&self) -> Vec<LogSource> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(parent) = current {
            current = parent.parent();
            chain.push(parent);
        }
        chain
    }

    /// Whether this source equals `other` or lives underneath it.
    pub fn is_within(&self, other: &LogSource) -> bool {
        let own = self.as_str();
        let prefix = other.as_str();
        own == prefix
            || (own.len() > prefix.len()
                && own.starts_with(prefix)
                && own[prefix.len()..].starts_with(SOURCE_SEPARATOR))
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogSource {
    fn from(value: &str) -> Self {
        LogSource::new(value)
    }
}

/// Captured error plus its `source()` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTrace {
    pub message: String,
    pub causes: Vec<String>,
}

impl ErrorTrace {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    pub fn capture(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut current = err.source();
        while let Some(cause) = current {
            causes.push(cause.to_string());
            current = cause.source();
        }
        Self {
            message: err.to_string(),
            causes,
        }
    }
}

/// Extra data carried by a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Location of the logging call.
    CallSite { file: String, line: u32 },
    /// Structured field that is not the message text.
    Field { name: String, value: String },
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::CallSite { file, line } => write!(f, "{file}:{line}"),
            Attachment::Field { name, value } => write!(f, "{name}={value}"),
        }
    }
}

/// One immutable log record.
#[derive(Debug, Clone)]
pub struct LogMessage {
    source: LogSource,
    level: LogLevel,
    text: String,
    error: Option<ErrorTrace>,
    attachments: Vec<Attachment>,
    time: DateTime<Local>,
}

impl LogMessage {
    pub fn new(source: impl Into<LogSource>, level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            level,
            text: text.into(),
            error: None,
            attachments: Vec::new(),
            time: Local::now(),
        }
    }

    pub fn with_error(mut self, error: ErrorTrace) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn at(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&ErrorTrace> {
        self.error.as_ref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn time(&self) -> DateTime<Local> {
        self.time
    }

    pub fn has_call_site(&self) -> bool {
        self.attachments
            .iter()
            .any(|a| matches!(a, Attachment::CallSite { .. }))
    }
}

/// Style key for one rendered fragment; the host maps it to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LevelStyle {
    #[default]
    Plain,
    Level(LogLevel),
}

impl From<LogLevel> for LevelStyle {
    fn from(level: LogLevel) -> Self {
        LevelStyle::Level(level)
    }
}

/// A (style, text) pair produced for one surviving message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledText {
    pub style: LevelStyle,
    pub text: String,
}

impl StyledText {
    pub fn new(style: LevelStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(LevelStyle::Plain, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LogLevel::Error, vec![LogLevel::Error])]
    #[case(LogLevel::Info, vec![LogLevel::Error, LogLevel::Warn, LogLevel::Info])]
    #[case(LogLevel::Trace, LogLevel::ALL.to_vec())]
    fn up_to_is_inclusive(#[case] level: LogLevel, #[case] expected: Vec<LogLevel>) {
        assert_eq!(LevelSet::up_to(level).iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn level_set_add_remove() {
        let set = LevelSet::empty().with(LogLevel::Debug);
        assert!(set.contains(LogLevel::Debug));
        assert!(!set.contains(LogLevel::Info));
        assert!(set.without(LogLevel::Debug).is_empty());
    }

    #[test]
    fn source_hierarchy() {
        let source = LogSource::new("hyper::client::pool");
        assert_eq!(source.leaf(), "pool");
        assert_eq!(source.parent(), Some(LogSource::new("hyper::client")));
        assert_eq!(
            source.ancestry(),
            vec![
                LogSource::new("hyper::client::pool"),
                LogSource::new("hyper::client"),
                LogSource::new("hyper"),
            ]
        );
        assert!(source.is_within(&LogSource::new("hyper")));
        assert!(source.is_within(&source));
        assert!(!LogSource::new("hyperx").is_within(&LogSource::new("hyper")));
        assert_eq!(LogSource::new("root").parent(), None);
    }

    #[test]
    fn error_trace_captures_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let outer = std::io::Error::new(std::io::ErrorKind::Other, Wrapped(inner));
        let trace = ErrorTrace::capture(&outer);
        assert_eq!(trace.message, "wrapped");
        assert_eq!(trace.causes, vec!["missing file".to_string()]);
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("wrapped")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn parse_level_names() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
