use std::fmt;

/// Identifier of a persisted conversation thread.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl ThreadId {
    /// Creates a thread id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the thread id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ThreadId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Server-assigned run identifier, delivered by a `metadata` event.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Creates a run id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the run id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque run configuration forwarded to the backend as the `config` field.
///
/// The backend reads per-run settings from the `configurable` object; the
/// thread a run belongs to is `configurable.thread_id`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RunConfig(serde_json::Value);

impl Default for RunConfig {
    fn default() -> Self {
        Self(serde_json::json!({}))
    }
}

impl RunConfig {
    /// Wraps an arbitrary JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Creates a config bound to `thread_id`.
    pub fn for_thread(thread_id: impl Into<ThreadId>) -> Self {
        Self::default().with_configurable("thread_id", thread_id.into().0)
    }

    /// Sets `configurable.<key>`, creating the object when missing.
    ///
    /// A non-object root is replaced by an empty object first.
    pub fn with_configurable(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        if !self.0.is_object() {
            self.0 = serde_json::json!({});
        }
        let root = &mut self.0["configurable"];
        if !root.is_object() {
            *root = serde_json::json!({});
        }
        root[key] = value.into();
        self
    }

    /// Returns `configurable.thread_id` when present.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.0
            .get("configurable")
            .and_then(|c| c.get("thread_id"))
            .and_then(|v| v.as_str())
            .map(ThreadId::new)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_thread_sets_configurable_thread_id() {
        let config = RunConfig::for_thread("t-1");
        assert_eq!(
            config.as_value(),
            &serde_json::json!({"configurable": {"thread_id": "t-1"}})
        );
        assert_eq!(config.thread_id(), Some(ThreadId::new("t-1")));
    }

    #[test]
    fn with_configurable_keeps_existing_keys() {
        let config = RunConfig::new(serde_json::json!({"configurable": {"tools": ["a"]}, "x": 1}))
            .with_configurable("thread_id", "t-2");
        assert_eq!(config.as_value()["x"], 1);
        assert_eq!(config.as_value()["configurable"]["tools"][0], "a");
        assert_eq!(config.thread_id().map(|t| t.0), Some("t-2".to_string()));
    }

    #[test]
    fn missing_thread_id_is_none() {
        assert_eq!(RunConfig::default().thread_id(), None);
        assert_eq!(RunConfig::new(serde_json::json!(null)).thread_id(), None);
    }
}
