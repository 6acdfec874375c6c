use crate::content::Message;
use crate::model::{RunId, ThreadId};
use crate::state::{StreamState, StreamStatus};

/// Committed message history of one thread, as loaded by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationHistory {
    pub thread_id: ThreadId,
    /// `None` until the initial fetch completes.
    pub messages: Option<Vec<Message>>,
}

impl ConversationHistory {
    /// History whose initial fetch has not finished yet.
    pub fn loading(thread_id: impl Into<ThreadId>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: None,
        }
    }

    pub fn loaded(thread_id: impl Into<ThreadId>, messages: Vec<Message>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Some(messages),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.messages.is_some()
    }

    /// Appends a settled stream's messages to this history.
    ///
    /// Returns `false` without changing anything when the stream is still
    /// inflight, belongs to another thread, or the history is not loaded.
    pub fn commit(&mut self, stream: &StreamState) -> bool {
        if !stream.status.is_terminal() || !belongs_to(stream, &self.thread_id) {
            return false;
        }
        match &mut self.messages {
            Some(messages) => {
                messages.extend(stream.messages.iter().cloned());
                true
            }
            None => false,
        }
    }
}

fn belongs_to(stream: &StreamState, thread_id: &ThreadId) -> bool {
    stream.thread_id.as_ref() == Some(thread_id)
}

/// Derives the message list to render.
///
/// Returns `None` while history is still loading so callers can tell
/// "loading" apart from an empty conversation. Otherwise the result is the
/// history followed by the stream's messages when the stream belongs to the
/// same thread. No reordering, dedup or filtering is applied.
pub fn project(
    history: &ConversationHistory,
    stream: Option<&StreamState>,
) -> Option<Vec<Message>> {
    let persisted = history.messages.as_ref()?;
    let streamed = stream
        .filter(|s| belongs_to(s, &history.thread_id))
        .map(|s| s.messages.as_slice())
        .unwrap_or_default();
    let mut out = Vec::with_capacity(persisted.len() + streamed.len());
    out.extend_from_slice(persisted);
    out.extend_from_slice(streamed);
    Some(out)
}

/// Whether the user may submit a new message.
pub fn input_enabled(stream: Option<&StreamState>) -> bool {
    stream.is_none_or(|s| s.status != StreamStatus::Inflight)
}

/// Whether a pending indicator should follow the rendered messages.
pub fn show_pending(projected: Option<&[Message]>, stream: Option<&StreamState>) -> bool {
    projected.is_none() || stream.is_some_and(StreamState::is_inflight)
}

/// Run id to attach to the message at `index` of a list of `len` messages.
///
/// Only the last rendered message carries the current stream's run id.
pub fn run_id_for<'a>(
    index: usize,
    len: usize,
    stream: Option<&'a StreamState>,
) -> Option<&'a RunId> {
    if len == 0 || index + 1 != len {
        return None;
    }
    stream.and_then(|s| s.run_id.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamEvent;

    fn msgs(items: &[&str]) -> Vec<Message> {
        items.iter().map(|s| Message::from(*s)).collect()
    }

    fn stream_for(thread: Option<&str>, items: &[&str]) -> StreamState {
        let mut state = StreamState::start(Message::from("q"), thread.map(ThreadId::new));
        state.apply(&StreamEvent::Data {
            messages: msgs(items),
        });
        state
    }

    #[test]
    fn loading_history_projects_to_none() {
        let history = ConversationHistory::loading("t1");
        let stream = stream_for(Some("t1"), &["a"]);
        assert_eq!(project(&history, Some(&stream)), None);
        assert_eq!(project(&history, None), None);
    }

    #[test]
    fn empty_history_is_distinct_from_loading() {
        let history = ConversationHistory::loaded("t1", Vec::new());
        assert_eq!(project(&history, None), Some(Vec::new()));
    }

    #[test]
    fn history_then_stream_in_arrival_order() {
        let history = ConversationHistory::loaded("t1", msgs(&["h1", "h2"]));
        let stream = stream_for(Some("t1"), &["a", "b"]);
        assert_eq!(
            project(&history, Some(&stream)),
            Some(msgs(&["h1", "h2", "q", "a", "b"]))
        );
    }

    #[test]
    fn stream_from_another_thread_is_not_merged() {
        let history = ConversationHistory::loaded("t1", msgs(&["h1"]));
        for stream in [stream_for(Some("t2"), &["a"]), stream_for(None, &["a"])] {
            assert_eq!(project(&history, Some(&stream)), Some(msgs(&["h1"])));
        }
    }

    #[test]
    fn projection_does_not_dedup() {
        let history = ConversationHistory::loaded("t1", msgs(&["same"]));
        let stream = stream_for(Some("t1"), &["same"]);
        assert_eq!(
            project(&history, Some(&stream)),
            Some(msgs(&["same", "q", "same"]))
        );
    }

    #[test]
    fn commit_appends_only_settled_streams_of_the_same_thread() {
        let mut history = ConversationHistory::loaded("t1", msgs(&["h1"]));
        let mut stream = stream_for(Some("t1"), &["a"]);
        assert!(!history.commit(&stream));

        stream.settle(StreamStatus::Done);
        assert!(history.commit(&stream));
        assert_eq!(history.messages, Some(msgs(&["h1", "q", "a"])));

        let mut other = stream_for(Some("t2"), &["x"]);
        other.settle(StreamStatus::Done);
        assert!(!history.commit(&other));

        let mut loading = ConversationHistory::loading("t1");
        assert!(!loading.commit(&stream));
        assert!(!loading.is_loaded());
    }

    #[test]
    fn input_is_disabled_only_while_inflight() {
        let mut stream = stream_for(Some("t1"), &[]);
        assert!(input_enabled(None));
        assert!(!input_enabled(Some(&stream)));
        stream.settle(StreamStatus::Error);
        assert!(input_enabled(Some(&stream)));
    }

    #[test]
    fn pending_indicator_while_loading_or_inflight() {
        let mut stream = stream_for(Some("t1"), &[]);
        let rendered = msgs(&["h1"]);
        assert!(show_pending(None, None));
        assert!(show_pending(Some(&rendered), Some(&stream)));
        stream.settle(StreamStatus::Done);
        assert!(!show_pending(Some(&rendered), Some(&stream)));
        assert!(!show_pending(Some(&rendered), None));
    }

    #[test]
    fn run_id_attaches_to_last_message_only() {
        let mut stream = stream_for(Some("t1"), &["a"]);
        stream.apply(&StreamEvent::Metadata {
            run_id: RunId::new("r1"),
        });
        assert_eq!(run_id_for(2, 3, Some(&stream)), Some(&RunId::new("r1")));
        assert_eq!(run_id_for(1, 3, Some(&stream)), None);
        assert_eq!(run_id_for(0, 0, Some(&stream)), None);
        assert_eq!(run_id_for(2, 3, None), None);
    }
}
