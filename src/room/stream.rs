//! Stream identity types
//!
//! A stream is an opaque identity token for one publishable channel. The
//! transport behind it lives elsewhere; the registry only tracks ids and
//! which member roles may see each stream.

use std::fmt;
use std::sync::Arc;

use super::member::MemberRole;

/// Shared handle to a stream
pub type StreamRef = Arc<dyn Stream>;

/// A publishable channel, identified by id
///
/// Implementations are treated as immutable. The same stream may be
/// registered in several rooms and seen by many members at once.
pub trait Stream: Send + Sync + fmt::Debug {
    /// Stream id, unique among the streams active in one room
    fn id(&self) -> &str;
}

/// Kind of media carried by a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Video track
    Video,
    /// Audio track
    Audio,
    /// Data channel
    Data,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
            StreamKind::Data => write!(f, "data"),
        }
    }
}

/// Plain stream identity with a media kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseStream {
    id: String,
    kind: StreamKind,
}

impl BaseStream {
    /// Create a new stream identity
    pub fn new(id: impl Into<String>, kind: StreamKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Create a video stream identity
    pub fn video(id: impl Into<String>) -> Self {
        Self::new(id, StreamKind::Video)
    }

    /// Create an audio stream identity
    pub fn audio(id: impl Into<String>) -> Self {
        Self::new(id, StreamKind::Audio)
    }

    /// Create a data channel identity
    pub fn data(id: impl Into<String>) -> Self {
        Self::new(id, StreamKind::Data)
    }

    /// Media kind
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> StreamRef {
        Arc::new(self)
    }
}

impl Stream for BaseStream {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A stream registered in a room, with its recipient filter
///
/// An empty recipient list means every role sees the stream.
#[derive(Debug, Clone)]
pub struct RoomStream {
    stream: StreamRef,
    recipients: Vec<MemberRole>,
}

impl RoomStream {
    /// Wrap a stream with a recipient filter
    pub fn new(stream: StreamRef, recipients: impl IntoIterator<Item = MemberRole>) -> Self {
        Self {
            stream,
            recipients: recipients.into_iter().collect(),
        }
    }

    /// Stream id
    pub fn id(&self) -> &str {
        self.stream.id()
    }

    /// The wrapped stream
    pub fn stream(&self) -> &StreamRef {
        &self.stream
    }

    /// Roles allowed to see this stream (empty = all)
    pub fn recipients(&self) -> &[MemberRole] {
        &self.recipients
    }

    /// Check if the stream is visible to every role
    pub fn is_broadcast(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Check if a member with `role` should see this stream
    pub fn is_visible_to(&self, role: MemberRole) -> bool {
        self.recipients.is_empty() || self.recipients.contains(&role)
    }
}
