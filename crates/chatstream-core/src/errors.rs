/// Errors produced by a `Transport` while opening or reading a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with a non-success status.
    #[error("stream request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    /// Reading the response body failed mid-stream.
    #[error("stream read failed: {0}")]
    Read(String),
    /// The transport could not be configured.
    #[error("transport config error: {0}")]
    Config(String),
}

impl TransportError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

/// Error returned by `StreamController::start_stream` once the stream has
/// settled into the `Error` status.
///
/// Cancellation is not represented here; a stopped stream resolves to
/// `Ok(StreamStatus::Cancelled)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The transport failed to open or broke mid-stream.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A `data` or `metadata` event carried a payload that did not decode.
    #[error("malformed `{event}` event: {message}")]
    Decode { event: String, message: String },
}

impl StreamError {
    pub(crate) fn decode(event: impl Into<String>, err: &serde_json::Error) -> Self {
        Self::Decode {
            event: event.into(),
            message: err.to_string(),
        }
    }
}
