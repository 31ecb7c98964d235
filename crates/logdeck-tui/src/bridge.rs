/*
[INPUT]:  tracing events from every thread in the process
[OUTPUT]: LogMessage records delivered to LogRecorder::message_logged
[POS]:    Producer bridge between tracing and the log pipeline
[UPDATE]: When changing how event fields map onto message parts
*/

use std::fmt;

use logdeck_core::{Attachment, ErrorTrace, LogMessage, LogRecorder};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const MESSAGE_FIELD: &str = "message";

/// Layer that records every event into a [`LogRecorder`].
///
/// The event target becomes the source, the `message` field the text, the
/// first error-valued field the error trace, and remaining fields become
/// attachments. When the recorder tracks calling sites, the event's
/// file and line are attached as well.
#[derive(Debug, Clone)]
pub struct RecorderLayer {
    recorder: LogRecorder,
}

impl RecorderLayer {
    pub fn new(recorder: LogRecorder) -> Self {
        Self { recorder }
    }
}

impl<S: Subscriber> Layer<S> for RecorderLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let level = (*metadata.level()).into();
        let mut message = LogMessage::new(metadata.target(), level, visitor.text);
        if let Some(error) = visitor.error {
            message = message.with_error(error);
        }
        for (name, value) in visitor.fields {
            message = message.with_attachment(Attachment::Field { name, value });
        }
        if self.recorder.record_calling_class() {
            if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
                message = message.with_attachment(Attachment::CallSite {
                    file: file.to_string(),
                    line,
                });
            }
        }

        self.recorder.message_logged(message);
    }
}

#[derive(Default)]
struct MessageVisitor {
    text: String,
    error: Option<ErrorTrace>,
    fields: Vec<(String, String)>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.text = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.error.is_none() {
            self.error = Some(ErrorTrace::capture(value));
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            self.text = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}
