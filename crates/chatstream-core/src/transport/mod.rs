//! Transport seam between the stream controller and the network.
//!
//! A transport opens one push subscription per request and yields decoded
//! SSE frames. End of the frame stream is a normal close; an `Err` item is a
//! transport failure and ends the stream.
mod http;
mod sse;

pub use http::HttpTransport;
pub use sse::{SseDecoder, SseFrame};

use std::pin::Pin;

use crate::content::Message;
use crate::errors::TransportError;
use crate::model::RunConfig;

/// Frames delivered by an open subscription, in server order.
pub type FrameStream =
    Pin<Box<dyn futures::Stream<Item = Result<SseFrame, TransportError>> + Send + 'static>>;

/// Body of the outbound stream request: `{ "input": ..., "config": ... }`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StreamRequest {
    pub input: Message,
    pub config: RunConfig,
}

/// Opens push-style event subscriptions for runs.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Opens a subscription for `request`.
    ///
    /// Dropping the returned stream must release the underlying connection.
    async fn open(&self, request: StreamRequest) -> Result<FrameStream, TransportError>;
}
