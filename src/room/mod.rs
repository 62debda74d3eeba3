//! Room registry for member/stream fan-out
//!
//! The registry tracks which members belong to which room and which streams
//! are active in it, and pushes stream availability to members according to
//! each stream's recipient filter.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<RoomManager>
//!                  ┌──────────────────────────┐
//!                  │ rooms: HashMap<Id, Room> │
//!                  └────────────┬─────────────┘
//!                               │
//!                               ▼
//!                         Arc<Room> {
//!                           members: [Member],
//!                           streams: [RoomStream { filter }],
//!                         }
//!                               │
//!        add_stream() ──────────┼──────────── add_member()
//!                               │  (replay active streams)
//!         ┌─────────────────────┼─────────────────────┐
//!         ▼                     ▼                     ▼
//!   [Viewer Member]      [Presenter Member]    [Presenter Member]
//!   visible streams      visible streams       visible streams
//!         │                     │                     │
//!         └──► on_stream handlers (sync) ──► transport layer
//! ```
//!
//! # Locking
//!
//! Each aggregate owns its own locks. Member locks nest inside room locks,
//! and room locks nest inside the manager lock. Within a room the member
//! table is always locked before the stream table.

pub mod config;
pub mod error;
pub mod manager;
pub mod member;
#[allow(clippy::module_inception)]
pub mod room;
pub mod stream;
mod table;
pub mod watch;

pub use config::{ManagerConfig, RoomConfig};
pub use error::RoomError;
pub use manager::RoomManager;
pub use member::{HandlerId, Member, MemberRole, RoomMember, StreamCallback, StreamHandler};
pub use room::{MemberRef, Room};
pub use stream::{BaseStream, RoomStream, Stream, StreamKind, StreamRef};
pub use watch::{watch_streams, StreamWatch};
