//! Room members and stream observers
//!
//! A member is a participant with a fixed role. It keeps its own set of
//! visible streams and a list of handlers fired, in registration order,
//! whenever a stream becomes visible to it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::error::RoomError;
use super::stream::{Stream, StreamRef};

/// Role of a member, used to filter stream visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRole {
    /// Receives streams
    Viewer,
    /// Publishes and receives streams
    Presenter,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRole::Viewer => write!(f, "viewer"),
            MemberRole::Presenter => write!(f, "presenter"),
        }
    }
}

/// Opaque identifier of a registered stream handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

impl HandlerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for HandlerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Callback fired when a stream becomes visible to a member
pub type StreamCallback = Arc<dyn Fn(&StreamRef) + Send + Sync>;

/// A registered stream handler
#[derive(Clone)]
pub struct StreamHandler {
    id: HandlerId,
    callback: StreamCallback,
}

impl StreamHandler {
    /// Handler id
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke the callback
    pub fn call(&self, stream: &StreamRef) {
        (self.callback)(stream)
    }
}

impl fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandler")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A participant in a room
///
/// `add_stream` fires handlers synchronously on the calling thread. A
/// handler may read the member and register handlers on it; a handler
/// registered during dispatch first fires for the next stream. Adding or
/// removing streams from inside a handler is unsupported.
pub trait Member: Send + Sync {
    /// Member id, intended unique within a room
    fn id(&self) -> &str;

    /// Member role, fixed at construction
    fn role(&self) -> MemberRole;

    /// Make a stream visible and notify every handler
    fn add_stream(&self, stream: StreamRef);

    /// Drop a visible stream without notifying handlers
    fn remove_stream(&self, stream: &dyn Stream) -> Result<(), RoomError>;

    /// Snapshot of visible streams
    fn get_streams(&self) -> HashMap<String, StreamRef>;

    /// Number of visible streams
    fn count_streams(&self) -> usize;

    /// Append a handler; handlers fire in registration order
    fn add_on_stream_handler(&self, callback: StreamCallback) -> HandlerId;

    /// Remove exactly one handler, returning it
    fn remove_on_stream_handler(&self, id: HandlerId) -> Result<StreamHandler, RoomError>;

    /// Snapshot of registered handlers, in registration order
    fn get_on_stream_handlers(&self) -> Vec<StreamHandler>;

    /// Register a closure as a stream handler
    fn on_stream<F>(&self, callback: F) -> HandlerId
    where
        F: Fn(&StreamRef) + Send + Sync + 'static,
        Self: Sized,
    {
        self.add_on_stream_handler(Arc::new(callback))
    }
}

/// Default member implementation
#[derive(Debug)]
pub struct RoomMember {
    id: String,
    role: MemberRole,
    streams: Mutex<HashMap<String, StreamRef>>,
    handlers: Mutex<Vec<StreamHandler>>,
}

impl RoomMember {
    /// Create a member with no visible streams and no handlers
    pub fn new(id: impl Into<String>, role: MemberRole) -> Self {
        Self {
            id: id.into(),
            role,
            streams: Mutex::new(HashMap::new()),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Create a viewer
    pub fn viewer(id: impl Into<String>) -> Self {
        Self::new(id, MemberRole::Viewer)
    }

    /// Create a presenter
    pub fn presenter(id: impl Into<String>) -> Self {
        Self::new(id, MemberRole::Presenter)
    }
}

impl Member for RoomMember {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> MemberRole {
        self.role
    }

    fn add_stream(&self, stream: StreamRef) {
        self.streams
            .lock()
            .insert(stream.id().to_owned(), Arc::clone(&stream));

        // Handlers run without any member lock held
        let handlers = self.handlers.lock().clone();

        tracing::trace!(
            member = %self.id,
            stream = stream.id(),
            handlers = handlers.len(),
            "Stream visible to member"
        );

        for handler in &handlers {
            handler.call(&stream);
        }
    }

    fn remove_stream(&self, stream: &dyn Stream) -> Result<(), RoomError> {
        let mut streams = self.streams.lock();

        if streams.remove(stream.id()).is_none() {
            return Err(RoomError::MemberStreamNotFound {
                member: self.id.clone(),
                stream: stream.id().to_owned(),
            });
        }

        Ok(())
    }

    fn get_streams(&self) -> HashMap<String, StreamRef> {
        self.streams.lock().clone()
    }

    fn count_streams(&self) -> usize {
        self.streams.lock().len()
    }

    fn add_on_stream_handler(&self, callback: StreamCallback) -> HandlerId {
        let handler = StreamHandler {
            id: HandlerId::new(),
            callback,
        };
        let id = handler.id;
        self.handlers.lock().push(handler);
        id
    }

    fn remove_on_stream_handler(&self, id: HandlerId) -> Result<StreamHandler, RoomError> {
        let mut handlers = self.handlers.lock();

        let index = handlers
            .iter()
            .position(|h| h.id == id)
            .ok_or(RoomError::HandlerNotFound(id))?;

        Ok(handlers.remove(index))
    }

    fn get_on_stream_handlers(&self) -> Vec<StreamHandler> {
        self.handlers.lock().clone()
    }
}
