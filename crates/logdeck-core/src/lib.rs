/*
[INPUT]:  Public API exports for logdeck-core crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod append_log;
pub mod formatter;
pub mod message;
pub mod panel;
pub mod preferences;
pub mod recorder;
pub mod render;
pub mod source_filter;
pub mod ui_queue;

// Re-export main types for convenience
pub use append_log::ExpandableAppendLog;
pub use formatter::{LogField, LogFormatter};
pub use message::{Attachment, ErrorTrace, LevelStyle, LogLevel, LogMessage, LogSource, StyledText};
pub use panel::{LoggingPanel, TextFilter};
pub use preferences::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore};
pub use recorder::{LogRecorder, ObserverHandle};
pub use render::{Document, ItemTextPane, RenderError, TextView};
pub use source_filter::{SourceFilter, SourcePredicate};
pub use ui_queue::{UiHandle, UiQueue};
