use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Opaque identifier of a [TimeEvent]. Freshly created events get a random UUID, ids read back
/// from storage are kept as they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Arc<str>);

impl EventId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

/// A logged instant with an optional free text label. The event lasts until the next one
/// starts, so no end is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEvent {
    pub id: EventId,
    pub start: DateTime<Utc>,
    pub label: String,
}

impl TimeEvent {
    pub fn new(start: DateTime<Utc>, label: impl Into<String>) -> Self {
        Self {
            id: EventId::generate(),
            start,
            label: label.into(),
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    /// Events recorded from the lock screen start without a name.
    pub fn is_unlabeled(&self) -> bool {
        self.label.trim().is_empty()
    }
}

/// The struct used for storing an event. Start is kept as epoch milliseconds.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct TimeEventEntity {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub label: String,
}

impl From<&TimeEvent> for TimeEventEntity {
    fn from(event: &TimeEvent) -> Self {
        Self {
            id: event.id.to_string(),
            start: event.start,
            label: event.label.clone(),
        }
    }
}

impl TimeEventEntity {
    fn into_event(self) -> Option<TimeEvent> {
        if self.id.trim().is_empty() {
            return None;
        }
        Some(TimeEvent {
            id: self.id.into(),
            start: self.start,
            label: self.label,
        })
    }
}

pub fn encode_events(events: &[TimeEvent]) -> Value {
    Value::Array(
        events
            .iter()
            .map(TimeEventEntity::from)
            .filter_map(|entity| {
                serde_json::to_value(entity)
                    .inspect_err(|e| warn!("Failed to encode event {e}"))
                    .ok()
            })
            .collect(),
    )
}

/// Decodes whatever is stored under the events key. Each entry is decoded on its own so one bad
/// record doesn't take the rest of the log with it. The array may also arrive wrapped in a
/// string, which is how older data was written.
pub fn decode_events(value: Value) -> Vec<TimeEvent> {
    let items = match value {
        Value::Array(items) => items,
        Value::String(raw) => match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!("Stored events are not a json array: {e}");
                return vec![];
            }
        },
        Value::Null => return vec![],
        other => {
            warn!("Stored events have unexpected shape {other}");
            return vec![];
        }
    };

    let mut events: Vec<TimeEvent> = Vec::with_capacity(items.len());
    for item in items {
        let event = match serde_json::from_value::<TimeEventEntity>(item.clone()) {
            Ok(entity) => entity.into_event(),
            Err(e) => {
                warn!("Skipping illegal event record {item}: {e}");
                continue;
            }
        };
        match event {
            Some(event) if events.iter().any(|v| v.id == event.id) => {
                warn!("Skipping duplicate event id {}", event.id)
            }
            Some(event) => events.push(event),
            None => warn!("Skipping event record without id {item}"),
        }
    }
    events
}
