//! Common imports for typical usage.
pub use crate::{
    ClientConfig, ConversationHistory, HttpTransport, Message, RunConfig, RunId, StreamController,
    StreamError, StreamEvent, StreamState, StreamStatus, ThreadId, Transport, TransportError,
};
