//! SSE frame and line types.

use serde::{Deserialize, Serialize};

/// Event type assumed when a frame carries no `event:` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One parsed SSE block, terminated on the wire by a blank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Value of the `event:` field, or [`DEFAULT_EVENT_TYPE`].
    pub event_type: String,
    /// All `data:` lines of the block joined with `\n`.
    pub data: String,
    /// Value of the last `id:` field, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Reconnection delay in milliseconds from a valid `retry:` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<u64>,
}

impl Frame {
    /// A frame of the given type with the given data and no id/retry.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }
}

/// A single classified SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// Blank line: dispatch the pending frame.
    Empty,
    /// `: comment`
    Comment(String),
    /// `event: <type>`
    Event(String),
    /// `data: <payload>`
    Data(String),
    /// `id: <last event id>`
    Id(String),
    /// `retry: <milliseconds>`
    Retry(String),
    /// Any other field name; ignored.
    Unknown { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new() {
        let frame = Frame::new("close", "");
        assert_eq!(frame.event_type, "close");
        assert!(frame.data.is_empty());
        assert!(frame.id.is_none());
        assert!(frame.retry.is_none());
    }

    #[test]
    fn test_frame_json_shape() {
        let mut frame = Frame::new("message", "{\"a\":1}");
        frame.id = Some("7".to_string());

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"eventType": "message", "data": "{\"a\":1}", "id": "7"})
        );
        let parsed: Frame = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, frame);
    }
}
