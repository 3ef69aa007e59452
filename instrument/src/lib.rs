//! Test instrumentation for the simulation engine.
//!
//! Engine code emits `tracing` events (targets like `completion`, `drop`,
//! `death`, `stun`) with primitive fields. Tests install the recorder,
//! drive the engine, then drain the captured rows and assert on the event
//! stream instead of poking at internal state.
//!
//! ```ignore
//! // In engine code:
//! tracing::info!(target: "completion", action = name, ticks);
//!
//! // In a test:
//! instrument::install_recorder();
//! // ... run simulation ...
//! let events = instrument::drain();
//! let deaths = events.iter().filter(|e| e.target == "death").count();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// One primitive event field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            Value::I64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A recorded event: its target plus every primitive field.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub target: String,
    pub fields: HashMap<String, Value>,
}

impl SimEvent {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

thread_local! {
    static EVENTS: RefCell<Vec<SimEvent>> = const { RefCell::new(Vec::new()) };
}

struct FieldCollector {
    fields: HashMap<String, Value>,
}

impl Visit for FieldCollector {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().into(), Value::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().into(), Value::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().into(), Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().into(), Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .insert(field.name().into(), Value::Str(value.into()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().into(), Value::Str(format!("{value:?}")));
    }
}

/// A subscriber that appends every event to the thread-local buffer.
struct RecordingSubscriber;

impl Subscriber for RecordingSubscriber {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _attrs: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut collector = FieldCollector {
            fields: HashMap::new(),
        };
        event.record(&mut collector);
        EVENTS.with(|events| {
            events.borrow_mut().push(SimEvent {
                target: event.metadata().target().to_string(),
                fields: collector.fields,
            });
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install the recording subscriber as the global default. Only the first
/// call wins; the buffer itself is thread-local, so parallel tests do not
/// see each other's events.
pub fn install_recorder() {
    let _ = tracing::subscriber::set_global_default(RecordingSubscriber);
}

/// Take every event recorded on this thread since the last drain.
pub fn drain() -> Vec<SimEvent> {
    EVENTS.with(|events| events.take())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_and_drains_events() {
        install_recorder();
        drain(); // discard anything earlier code on this thread produced

        tracing::info!(target: "completion", action = "Normal Tree", ticks = 30u64);
        tracing::info!(target: "death", action = "Man");

        let events = drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].target, "completion");
        assert_eq!(
            events[0].field("action").and_then(Value::as_str),
            Some("Normal Tree")
        );
        assert_eq!(events[0].field("ticks").and_then(Value::as_u64), Some(30));
        assert_eq!(events[1].target, "death");
        assert!(drain().is_empty());
    }
}
