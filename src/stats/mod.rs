//! Point-in-time statistics snapshots

pub mod metrics;

pub use metrics::{ManagerStats, RoomStats};
