use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt as _;
use tokio::sync::watch;
use tracing::{Instrument as _, debug, info, info_span, warn};

use crate::content::Message;
use crate::errors::StreamError;
use crate::model::{RunConfig, ThreadId};
use crate::state::{StreamState, StreamStatus};
use crate::stream::StreamEvent;
use crate::transport::{StreamRequest, Transport};

/// Ownership token for one open subscription.
///
/// Only the controller holds it. `cancel` consumes the handle, so a
/// subscription can be released at most once.
struct TransportHandle {
    stream_id: uuid::Uuid,
    abort: watch::Sender<bool>,
}

impl TransportHandle {
    fn new(stream_id: uuid::Uuid) -> (Self, watch::Receiver<bool>) {
        let (abort, abort_rx) = watch::channel(false);
        (Self { stream_id, abort }, abort_rx)
    }

    /// Stops event delivery for the owning run.
    fn cancel(self) {
        let _ = self.abort.send(true);
    }
}

/// Owns the lifecycle of at most one live stream and publishes its state.
///
/// Share it as `Arc<StreamController>` so `stop_stream` can be called while a
/// `start_stream` future is pending. Observers use `subscribe` to receive
/// every new snapshot.
pub struct StreamController {
    transport: Arc<dyn Transport>,
    state: watch::Sender<Option<StreamState>>,
    active: Mutex<Option<TransportHandle>>,
}

impl StreamController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            transport,
            state,
            active: Mutex::new(None),
        }
    }

    /// Returns a snapshot of the current stream, if any.
    pub fn stream(&self) -> Option<StreamState> {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<StreamState>> {
        self.state.subscribe()
    }

    /// Whether a transport handle is currently live.
    pub fn is_live(&self) -> bool {
        self.handle_slot().is_some()
    }

    /// Starts a new run for `input`.
    ///
    /// The fresh inflight state is published before this method returns,
    /// ahead of any network I/O. A live stream from an earlier call is
    /// cancelled and replaced; its future resolves to
    /// `Ok(StreamStatus::Cancelled)`.
    ///
    /// The returned future resolves once the stream is terminal:
    /// `Ok(Done)` on normal close, `Ok(Cancelled)` when stopped or
    /// superseded, and `Err` after the state has settled to `Error`.
    pub fn start_stream(
        &self,
        input: Message,
        config: RunConfig,
    ) -> impl Future<Output = Result<StreamStatus, StreamError>> + Send + '_ {
        let state = StreamState::start(input.clone(), config.thread_id());
        let stream_id = state.stream_id();
        let (handle, abort_rx) = TransportHandle::new(stream_id);
        if let Some(previous) = self.replace_handle(Some(handle)) {
            debug!(superseded = %previous.stream_id, %stream_id, "superseding live stream");
            previous.cancel();
        }
        let span = info_span!(
            "stream",
            %stream_id,
            thread_id = state.thread_id.as_ref().map(ThreadId::as_str)
        );
        span.in_scope(|| info!("stream started"));
        self.state.send_replace(Some(state));

        ActiveRun {
            controller: self,
            stream_id,
            abort_rx,
        }
        .drive(StreamRequest { input, config })
        .instrument(span)
    }

    /// Cancels the live stream, if any.
    ///
    /// With `clear`, the published state is discarded regardless of its
    /// status. Without it, an inflight stream settles to `Cancelled` and a
    /// terminal one is left untouched. Calling this with nothing live is a
    /// no-op.
    pub fn stop_stream(&self, clear: bool) {
        let handle = self.replace_handle(None);
        if clear {
            self.state.send_replace(None);
        } else if let Some(handle) = &handle {
            self.settle(handle.stream_id, StreamStatus::Cancelled);
        }
        if let Some(handle) = handle {
            info!(stream_id = %handle.stream_id, clear, "stream stopped");
            handle.cancel();
        }
    }

    fn handle_slot(&self) -> MutexGuard<'_, Option<TransportHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_handle(&self, next: Option<TransportHandle>) -> Option<TransportHandle> {
        std::mem::replace(&mut *self.handle_slot(), next)
    }

    fn release(&self, stream_id: uuid::Uuid) {
        let mut slot = self.handle_slot();
        if slot.as_ref().is_some_and(|h| h.stream_id == stream_id) {
            slot.take();
            debug!(%stream_id, "transport handle released");
        }
    }

    fn fold(&self, stream_id: uuid::Uuid, event: &StreamEvent) -> bool {
        self.state.send_if_modified(|current| match current {
            Some(state) if state.stream_id() == stream_id => state.apply(event),
            _ => false,
        })
    }

    fn settle(&self, stream_id: uuid::Uuid, status: StreamStatus) -> bool {
        self.state.send_if_modified(|current| match current {
            Some(state) if state.stream_id() == stream_id => state.settle(status),
            _ => false,
        })
    }
}

/// One `start_stream` call in progress.
///
/// Dropping it (including dropping the caller's future early) settles a
/// still-inflight state to `Cancelled` and releases its handle.
struct ActiveRun<'a> {
    controller: &'a StreamController,
    stream_id: uuid::Uuid,
    abort_rx: watch::Receiver<bool>,
}

impl ActiveRun<'_> {
    async fn drive(mut self, request: StreamRequest) -> Result<StreamStatus, StreamError> {
        let transport = self.controller.transport.clone();
        let opened = tokio::select! {
            biased;
            _ = self.abort_rx.changed() => return Ok(StreamStatus::Cancelled),
            opened = transport.open(request) => opened,
        };
        let mut frames = match opened {
            Ok(frames) => frames,
            Err(err) => return self.fail(err.into()),
        };

        loop {
            tokio::select! {
                biased;
                _ = self.abort_rx.changed() => return Ok(StreamStatus::Cancelled),
                next = frames.next() => match next {
                    Some(Ok(frame)) => {
                        let event = match StreamEvent::from_frame(&frame) {
                            Ok(event) => event,
                            Err(err) => return self.fail(err),
                        };
                        let changed = self.controller.fold(self.stream_id, &event);
                        debug!(stream_id = %self.stream_id, event = ?frame.event, changed, "folded stream event");
                    }
                    Some(Err(err)) => return self.fail(err.into()),
                    None => return Ok(self.finish()),
                },
            }
        }
    }

    fn finish(&self) -> StreamStatus {
        if self.controller.settle(self.stream_id, StreamStatus::Done) {
            info!(stream_id = %self.stream_id, "stream done");
            StreamStatus::Done
        } else {
            StreamStatus::Cancelled
        }
    }

    fn fail(&self, err: StreamError) -> Result<StreamStatus, StreamError> {
        if self.controller.settle(self.stream_id, StreamStatus::Error) {
            warn!(stream_id = %self.stream_id, error = %err, "stream failed");
            Err(err)
        } else {
            debug!(stream_id = %self.stream_id, error = %err, "error after stream was stopped");
            Ok(StreamStatus::Cancelled)
        }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.controller.settle(self.stream_id, StreamStatus::Cancelled);
        self.controller.release(self.stream_id);
    }
}
