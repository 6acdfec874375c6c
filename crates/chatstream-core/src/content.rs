/// A single chat message exchanged with the backend.
///
/// Messages are opaque JSON values; the core never inspects them beyond the
/// convenience accessors below and treats them as immutable once received.
/// Ordering is positional: no id field is assumed to be unique.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Message(serde_json::Value);

impl Message {
    /// Wraps an arbitrary JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Builds a user message in the backend's `{type, content}` shape.
    pub fn human(content: impl Into<String>) -> Self {
        Self(serde_json::json!({
            "type": "human",
            "content": content.into(),
            "example": false,
        }))
    }

    /// Returns the `type` field (`human`, `ai`, `tool`, ...) when present.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(|v| v.as_str())
    }

    /// Returns the text content when the message carries a string `content`
    /// or is itself a bare string.
    pub fn content(&self) -> Option<&str> {
        match &self.0 {
            serde_json::Value::String(text) => Some(text.as_str()),
            value => value.get("content").and_then(|v| v.as_str()),
        }
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Self(serde_json::Value::String(value.to_string()))
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
