use serde::Deserialize;

use crate::content::Message;
use crate::errors::StreamError;
use crate::model::RunId;
use crate::transport::SseFrame;

/// Event name carrying a batch of new messages.
pub const DATA_EVENT: &str = "data";
/// Event name carrying the server-assigned run id.
pub const METADATA_EVENT: &str = "metadata";

/// Inbound run events after decoding.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// Zero or more messages to append, in payload order.
    Data { messages: Vec<Message> },
    /// Run id assignment.
    Metadata { run_id: RunId },
    /// Any other event name. Never faults the stream.
    Unknown { event: Option<String> },
}

#[derive(Deserialize)]
struct DataPayload {
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct MetadataPayload {
    run_id: RunId,
}

impl StreamEvent {
    /// Decodes a wire frame.
    ///
    /// Only `data` and `metadata` payloads are parsed; a payload that fails
    /// to decode is fatal to the stream.
    pub fn from_frame(frame: &SseFrame) -> Result<Self, StreamError> {
        match frame.event.as_deref() {
            Some(DATA_EVENT) => {
                let payload: DataPayload = serde_json::from_str(&frame.data)
                    .map_err(|e| StreamError::decode(DATA_EVENT, &e))?;
                Ok(Self::Data {
                    messages: payload.messages,
                })
            }
            Some(METADATA_EVENT) => {
                let payload: MetadataPayload = serde_json::from_str(&frame.data)
                    .map_err(|e| StreamError::decode(METADATA_EVENT, &e))?;
                Ok(Self::Metadata {
                    run_id: payload.run_id,
                })
            }
            other => Ok(Self::Unknown {
                event: other.map(ToOwned::to_owned),
            }),
        }
    }
}
