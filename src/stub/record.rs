//! Records with possibly broken fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What kind of record a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Event,
    Message,
}

impl RecordKind {
    /// Field holding the record's own identifier.
    pub fn id_field(&self) -> &'static str {
        match self {
            RecordKind::Event => "eventId",
            RecordKind::Message => "messageId",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Event => f.write_str("event"),
            RecordKind::Message => f.write_str("message"),
        }
    }
}

/// A field value, or the marker for a value that could not be fetched.
///
/// Two `Broken` markers of the same kind are equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Concrete(Value),
    Broken(RecordKind),
}

impl Field {
    pub fn is_broken(&self) -> bool {
        matches!(self, Field::Broken(_))
    }

    pub fn as_concrete(&self) -> Option<&Value> {
        match self {
            Field::Concrete(value) => Some(value),
            Field::Broken(_) => None,
        }
    }
}

/// Field layout shared by real and stub records of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTemplate {
    kind: RecordKind,
    fields: Vec<String>,
}

impl RecordTemplate {
    /// The identifier field is always part of the layout.
    pub fn new<I, S>(kind: RecordKind, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if !fields.iter().any(|f| f == kind.id_field()) {
            fields.insert(0, kind.id_field().to_string());
        }
        Self { kind, fields }
    }

    pub fn event() -> Self {
        Self::new(
            RecordKind::Event,
            [
                "eventId",
                "bookId",
                "scope",
                "batchId",
                "isBatched",
                "eventName",
                "eventType",
                "startTimestamp",
                "endTimestamp",
                "parentEventId",
                "successful",
                "attachedMessageIds",
                "body",
            ],
        )
    }

    pub fn message() -> Self {
        Self::new(
            RecordKind::Message,
            [
                "messageId",
                "timestamp",
                "direction",
                "sessionId",
                "sequence",
                "attachedEventIds",
                "body",
                "bodyBase64",
            ],
        )
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Placeholder for `id`: the identifier field is set, the rest broken.
    pub fn stub(&self, id: &str) -> Record {
        let id_field = self.kind.id_field();
        let fields = self
            .fields
            .iter()
            .map(|name| {
                let field = if name == id_field {
                    Field::Concrete(Value::String(id.to_string()))
                } else {
                    Field::Broken(self.kind)
                };
                (name.clone(), field)
            })
            .collect();
        Record {
            kind: self.kind,
            fields,
        }
    }

    /// Wrap a fetched object in the template's layout.
    ///
    /// Template fields the object lacks become `null`; keys outside the
    /// template are dropped, so a real record and a stub of the same
    /// template always carry the same field names. A non-object value is
    /// kept as `body`.
    pub fn record(&self, value: Value) -> Record {
        let mut source = match value {
            Value::Object(map) => map,
            other => Map::from_iter([("body".to_string(), other)]),
        };
        let fields = self
            .fields
            .iter()
            .map(|name| {
                let value = source.remove(name).unwrap_or(Value::Null);
                (name.clone(), Field::Concrete(value))
            })
            .collect::<BTreeMap<_, _>>();
        if !source.is_empty() {
            tracing::trace!(
                "Dropping {} field(s) outside the {} layout",
                source.len(),
                self.kind
            );
        }
        Record {
            kind: self.kind,
            fields,
        }
    }
}

/// A looked-up record, real or stub.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: RecordKind,
    fields: BTreeMap<String, Field>,
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    /// The record's identifier, if it is a string.
    pub fn id(&self) -> Option<&str> {
        self.get(self.kind.id_field())
            .and_then(Field::as_concrete)
            .and_then(Value::as_str)
    }

    /// True when any field is a broken marker.
    pub fn is_stub(&self) -> bool {
        self.fields.values().any(Field::is_broken)
    }

    /// JSON view; broken fields render as `null`.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, field)| {
                let value = field.as_concrete().cloned().unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect();
        Value::Object(map)
    }
}
