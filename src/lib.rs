//! In-memory room registry for real-time media servers
//!
//! Tracks rooms, their members and the streams active in them, and notifies
//! members synchronously when a stream becomes visible to their role.
//!
//! ```
//! use std::sync::Arc;
//!
//! use rtc_rooms::{BaseStream, Member, MemberRole, RoomManager, RoomMember, Stream};
//!
//! let manager = RoomManager::new();
//! let room = manager.create_room("standup");
//!
//! let viewer = Arc::new(RoomMember::viewer("alice"));
//! viewer.on_stream(|stream| println!("alice can now see {}", stream.id()));
//! room.add_member(viewer.clone());
//!
//! room.add_stream(BaseStream::video("bob-camera").into_ref(), &[]);
//! room.add_stream(BaseStream::video("bob-notes").into_ref(), &[MemberRole::Presenter]);
//!
//! assert_eq!(viewer.count_streams(), 1);
//! ```

pub mod room;
pub mod stats;

pub use room::{
    watch_streams, BaseStream, HandlerId, ManagerConfig, Member, MemberRef, MemberRole, Room,
    RoomConfig, RoomError, RoomManager, RoomMember, RoomStream, Stream, StreamCallback,
    StreamHandler, StreamKind, StreamRef, StreamWatch,
};
pub use stats::{ManagerStats, RoomStats};
