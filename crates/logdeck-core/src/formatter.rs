/*
[INPUT]:  LogMessage records + visible field selection (optionally persisted)
[OUTPUT]: One formatted, newline-terminated text block per message
[POS]:    Presentation layer - message to text rendering
[UPDATE]: When adding fields or changing the bracketed layout
*/

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::warn;

use crate::message::LogMessage;
use crate::preferences::{PreferenceMap, PreferenceStore};

const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogField {
    Time,
    Level,
    Source,
    Message,
    Error,
    Attachment,
}

impl LogField {
    pub const ALL: [LogField; 6] = [
        LogField::Time,
        LogField::Level,
        LogField::Source,
        LogField::Message,
        LogField::Error,
        LogField::Attachment,
    ];

    /// Order in which fields appear in a formatted entry.
    const RENDER_ORDER: [LogField; 6] = [
        LogField::Time,
        LogField::Level,
        LogField::Source,
        LogField::Attachment,
        LogField::Message,
        LogField::Error,
    ];

    /// Name used as the persisted preference key.
    pub fn name(self) -> &'static str {
        match self {
            LogField::Time => "TIME",
            LogField::Level => "LEVEL",
            LogField::Source => "SOURCE",
            LogField::Message => "MESSAGE",
            LogField::Error => "ERROR",
            LogField::Attachment => "ATTACHMENT",
        }
    }

    fn default_visible(self) -> bool {
        self != LogField::Attachment
    }
}

struct Persistence {
    store: Arc<dyn PreferenceStore>,
    key: String,
}

/// Renders messages as `[time] [LEVEL] [source] [attachments] text`.
pub struct LogFormatter {
    visible: ArcSwap<BTreeSet<LogField>>,
    time_format: String,
    persistence: Option<Persistence>,
}

impl fmt::Debug for LogFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFormatter")
            .field("visible", &self.visible.load_full())
            .field("time_format", &self.time_format)
            .field("key", &self.persistence.as_ref().map(|p| p.key.as_str()))
            .finish()
    }
}

impl Default for LogFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFormatter {
    /// Formatter with default fields and session-only settings.
    pub fn new() -> Self {
        let visible = LogField::ALL
            .into_iter()
            .filter(|f| f.default_visible())
            .collect::<BTreeSet<_>>();
        Self {
            visible: ArcSwap::from_pointee(visible),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            persistence: None,
        }
    }

    /// Formatter whose field settings are loaded from, and saved to, `store`
    /// under `key`.
    pub fn with_preferences(store: Arc<dyn PreferenceStore>, key: impl Into<String>) -> Self {
        let mut formatter = Self::new();
        let key = key.into();

        match store.load(&key) {
            Ok(Some(saved)) => {
                let current = formatter.visible.load_full();
                let visible = LogField::ALL
                    .into_iter()
                    .filter(|field| {
                        saved
                            .get(field.name())
                            .and_then(|v| v.parse::<bool>().ok())
                            .unwrap_or_else(|| current.contains(field))
                    })
                    .collect::<BTreeSet<_>>();
                formatter.visible.store(Arc::new(visible));
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, key = %key, "failed to load log formatter settings"),
        }

        formatter.persistence = Some(Persistence { store, key });
        formatter
    }

    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    pub fn is_visible(&self, field: LogField) -> bool {
        self.visible.load().contains(&field)
    }

    pub fn visible_fields(&self) -> Vec<LogField> {
        self.visible.load().iter().copied().collect()
    }

    /// Publishes a new visible-field snapshot, then saves it if a store is
    /// configured.
    pub fn set_visible(&self, field: LogField, visible: bool) {
        self.visible.rcu(|current| {
            let mut next = BTreeSet::clone(current);
            if visible {
                next.insert(field);
            } else {
                next.remove(&field);
            }
            next
        });
        self.persist();
    }

    fn persist(&self) {
        let Some(persistence) = self.persistence.as_ref() else {
            return;
        };

        let visible = self.visible.load();
        let values = LogField::ALL
            .into_iter()
            .map(|field| (field.name().to_string(), visible.contains(&field).to_string()))
            .collect::<PreferenceMap>();

        if let Err(err) = persistence.store.store(&persistence.key, values) {
            warn!(error = %err, key = %persistence.key, "failed to persist log formatter settings");
        }
    }

    /// Never fails: rendering errors produce a placeholder line.
    pub fn format(&self, message: &LogMessage) -> String {
        let mut out = String::with_capacity(message.text().len() + 64);
        match self.write_message(&mut out, message) {
            Ok(()) => out,
            Err(err) => format!("<unformattable log message: {err}>\n"),
        }
    }

    fn write_message(&self, out: &mut String, message: &LogMessage) -> fmt::Result {
        let visible = self.visible.load();

        for field in LogField::RENDER_ORDER {
            if !visible.contains(&field) {
                continue;
            }
            match field {
                LogField::Time => {
                    write!(out, "[{}] ", message.time().format(&self.time_format))?;
                }
                LogField::Level => write!(out, "[{}] ", message.level())?,
                LogField::Source => write!(out, "[{}] ", message.source())?,
                LogField::Attachment => {
                    if !message.attachments().is_empty() {
                        out.push('[');
                        for (i, attachment) in message.attachments().iter().enumerate() {
                            if i > 0 {
                                out.push_str(", ");
                            }
                            write!(out, "{attachment}")?;
                        }
                        out.push_str("] ");
                    }
                }
                LogField::Message => {
                    out.push_str(message.text());
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                LogField::Error => {
                    if let Some(error) = message.error() {
                        if !out.is_empty() && !out.ends_with('\n') {
                            out.push('\n');
                        }
                        writeln!(out, "{}", error.message)?;
                        for cause in &error.causes {
                            writeln!(out, "    caused by: {cause}")?;
                        }
                    }
                }
            }
        }

        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(())
    }
}
