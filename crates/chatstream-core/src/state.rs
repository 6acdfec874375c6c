use crate::content::Message;
use crate::model::{RunId, ThreadId};
use crate::stream::StreamEvent;

/// Lifecycle status of one stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    /// Events are still being folded.
    Inflight,
    /// The server closed the stream normally.
    Done,
    /// The transport failed or an event payload was malformed.
    Error,
    /// The caller stopped the stream without clearing it.
    Cancelled,
}

impl StreamStatus {
    /// Whether no further events can change a stream in this status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Inflight)
    }
}

/// Accumulated state of a single run's stream.
///
/// Only `apply` and `settle` mutate it, and both refuse to touch a state that
/// has left `Inflight`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StreamState {
    pub status: StreamStatus,
    pub messages: Vec<Message>,
    pub run_id: Option<RunId>,
    pub thread_id: Option<ThreadId>,
    #[serde(skip)]
    pub(crate) stream_id: uuid::Uuid,
}

impl StreamState {
    /// Creates an inflight state seeded with the user's input message.
    pub fn start(input: Message, thread_id: Option<ThreadId>) -> Self {
        Self {
            status: StreamStatus::Inflight,
            messages: vec![input],
            run_id: None,
            thread_id,
            stream_id: uuid::Uuid::new_v4(),
        }
    }

    /// Local identity of this stream instance.
    pub fn stream_id(&self) -> uuid::Uuid {
        self.stream_id
    }

    /// Whether events are still being folded into this state.
    pub fn is_inflight(&self) -> bool {
        self.status == StreamStatus::Inflight
    }

    /// Folds one event into the state. Returns whether anything changed.
    pub fn apply(&mut self, event: &StreamEvent) -> bool {
        if !self.is_inflight() {
            return false;
        }
        match event {
            StreamEvent::Data { messages } => {
                self.messages.extend(messages.iter().cloned());
                !messages.is_empty()
            }
            StreamEvent::Metadata { run_id } => {
                if self.run_id.as_ref() == Some(run_id) {
                    return false;
                }
                self.run_id = Some(run_id.clone());
                true
            }
            StreamEvent::Unknown { .. } => false,
        }
    }

    /// Moves an inflight state to `status`, freezing messages and run id.
    pub fn settle(&mut self, status: StreamStatus) -> bool {
        if !self.is_inflight() || status == StreamStatus::Inflight {
            return false;
        }
        self.status = status;
        true
    }
}
