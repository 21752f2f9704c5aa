use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub const LOG_CAPACITY: usize = 200;

const CLOCK: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// One captured tracing event, ready for the log panel.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// `12:00:01 INFO  workflow message | key=value ...`, with the crate
    /// prefix dropped from the target.
    pub fn line(&self) -> String {
        let target = self
            .target
            .split_once("::")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.target);
        let mut line = format!(
            "{} {:<5} {target} {}",
            self.timestamp, self.level, self.message
        );
        if !self.fields.is_empty() {
            let extras: Vec<String> = self
                .fields
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            line.push_str(" | ");
            line.push_str(&extras.join(" "));
        }
        line
    }
}

/// Ring buffer shared between the tracing layer and the UI.
#[derive(Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// The newest `count` entries, oldest first.
    pub fn tail(&self, count: usize) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| {
                let skip = entries.len().saturating_sub(count);
                entries.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }
}

pub struct LogLayer {
    buffer: LogBuffer,
}

impl LogLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        self.buffer.push(LogEntry {
            timestamp: clock(OffsetDateTime::now_utc()),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Vec<(String, String)>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.push(field, format!("{value:?}"));
    }
}

fn clock(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(CLOCK)
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp: "12:34:56".to_string(),
            level: Level::INFO,
            target: "reposync_core::sync_queue".to_string(),
            message: message.to_string(),
            fields: vec![("repo".to_string(), "acme/widgets".to_string())],
        }
    }

    #[test]
    fn line_drops_crate_prefix_and_appends_fields() {
        assert_eq!(
            entry("Cloned repository").line(),
            "12:34:56 INFO  sync_queue Cloned repository | repo=acme/widgets"
        );
    }

    #[test]
    fn buffer_evicts_oldest_first() {
        let buffer = LogBuffer::new(2);
        buffer.push(entry("one"));
        buffer.push(entry("two"));
        buffer.push(entry("three"));
        let messages: Vec<String> = buffer.tail(10).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(buffer.tail(1)[0].message, "three");
    }

    #[test]
    fn layer_captures_message_and_fields() {
        let buffer = LogBuffer::new(LOG_CAPACITY);
        let subscriber = tracing_subscriber::registry().with(LogLayer::new(buffer.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(index = 2, repo = "acme/api", "Repository exists");
        });
        let entries = buffer.tail(1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(entries[0].level, Level::WARN);
        assert_eq!(entries[0].message, "Repository exists");
        assert_eq!(
            entries[0].fields,
            vec![
                ("index".to_string(), "2".to_string()),
                ("repo".to_string(), "acme/api".to_string()),
            ]
        );
    }
}
