//! Client-side reconciliation of chat run streams.
//!
//! A [`StreamController`] submits one user message to the backend, folds the
//! resulting server-sent events into a [`StreamState`], and publishes every
//! new snapshot to subscribers. [`projector::project`] merges that state with
//! a thread's persisted history into the list a UI renders.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chatstream_core::prelude::*;
//! use chatstream_core::projector;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(ClientConfig::new("http://localhost:8100"))?;
//! let controller = StreamController::new(Arc::new(transport));
//!
//! let status = controller
//!     .start_stream(Message::human("hello"), RunConfig::for_thread("t1"))
//!     .await?;
//!
//! let history = ConversationHistory::loaded("t1", Vec::new());
//! let rendered = projector::project(&history, controller.stream().as_ref());
//! println!("{status:?}: {rendered:?}");
//! # Ok(())
//! # }
//! ```

/// Immutable chat message values.
pub mod content;
/// HTTP transport configuration.
pub mod config;
/// Stream lifecycle ownership and event folding.
pub mod controller;
/// Error types for transports and streams.
pub mod errors;
/// Thread, run and config identifiers.
pub mod model;
/// Tracing subscriber setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Pure merge of persisted history and stream state.
pub mod projector;
/// Stream state and its transition function.
pub mod state;
/// Decoded inbound events.
pub mod stream;
/// Transport trait, SSE decoding and the HTTP implementation.
pub mod transport;

pub use config::ClientConfig;
pub use content::Message;
pub use controller::StreamController;
pub use errors::{StreamError, TransportError};
pub use model::{RunConfig, RunId, ThreadId};
pub use projector::ConversationHistory;
pub use state::{StreamState, StreamStatus};
pub use stream::StreamEvent;
pub use transport::{FrameStream, HttpTransport, SseDecoder, SseFrame, StreamRequest, Transport};
