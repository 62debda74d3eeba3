//! Room error types
//!
//! Error types for room, member and handler operations.

use super::member::HandlerId;

/// Error type for room registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under this id
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// Stream is not active in the room
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    /// Stream is not visible to the member
    #[error("stream {stream} not found on member {member}")]
    MemberStreamNotFound {
        /// Member id
        member: String,
        /// Stream id
        stream: String,
    },

    /// No stream handler is registered under this id
    #[error("stream handler not found: {0}")]
    HandlerNotFound(HandlerId),

    /// Stream left the room but some members failed to drop it
    #[error("stream {stream} removed from room, {} member(s) failed", .failures.len())]
    PartialRemoval {
        /// Stream id
        stream: String,
        /// Per-member failures, in member order
        failures: Vec<RoomError>,
    },
}

impl RoomError {
    /// Check whether this error means a referenced id does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RoomError::RoomNotFound(_)
                | RoomError::StreamNotFound(_)
                | RoomError::MemberStreamNotFound { .. }
                | RoomError::HandlerNotFound(_)
        )
    }
}
