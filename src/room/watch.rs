//! Async stream notifications
//!
//! Bridges a member's synchronous stream handlers to a tokio channel, so
//! transport tasks can await newly visible streams instead of doing work
//! inside the handler.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::error::RoomError;
use super::member::{HandlerId, Member};
use super::stream::StreamRef;

/// Receiving side of a member's stream notifications
///
/// Unbounded: handlers never block on a slow receiver.
#[derive(Debug)]
pub struct StreamWatch {
    handler_id: HandlerId,
    rx: mpsc::UnboundedReceiver<StreamRef>,
}

/// Register a handler on `member` that forwards every newly visible stream
pub fn watch_streams(member: &dyn Member) -> StreamWatch {
    let (tx, rx) = mpsc::unbounded_channel();

    let handler_id = member.add_on_stream_handler(Arc::new(move |stream: &StreamRef| {
        // Receiver dropped; nothing left to notify
        let _ = tx.send(Arc::clone(stream));
    }));

    tracing::trace!(member = member.id(), handler = %handler_id, "Stream watch attached");

    StreamWatch { handler_id, rx }
}

impl StreamWatch {
    /// Id of the forwarding handler
    pub fn handler_id(&self) -> HandlerId {
        self.handler_id
    }

    /// Wait for the next stream
    ///
    /// Returns `None` once the handler is detached and queued streams are drained.
    pub async fn recv(&mut self) -> Option<StreamRef> {
        self.rx.recv().await
    }

    /// Take the next queued stream without waiting
    pub fn try_recv(&mut self) -> Option<StreamRef> {
        self.rx.try_recv().ok()
    }

    /// Remove the forwarding handler from `member`
    pub fn detach(&self, member: &dyn Member) -> Result<(), RoomError> {
        member.remove_on_stream_handler(self.handler_id)?;
        tracing::trace!(member = member.id(), handler = %self.handler_id, "Stream watch detached");
        Ok(())
    }
}
