//! Room manager
//!
//! Process-wide table of live rooms keyed by room id. One manager is meant
//! to be shared (behind an `Arc`) by all signaling handlers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::config::ManagerConfig;
use super::error::RoomError;
use super::room::Room;
use crate::stats::ManagerStats;

/// Registry of live rooms
///
/// Every operation serializes on one manager-wide lock. Nothing takes the
/// manager lock while holding a room lock.
pub struct RoomManager {
    /// Map of room id to room
    rooms: Mutex<HashMap<String, Arc<Room>>>,

    /// Configuration
    config: ManagerConfig,
}

impl RoomManager {
    /// Create a new room manager with default configuration
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create a new room manager with custom configuration
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::with_capacity(config.room_capacity)),
            config,
        }
    }

    /// Get the manager configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Get the room with this id, creating it if absent
    pub fn create_room(&self, id: &str) -> Arc<Room> {
        let mut rooms = self.rooms.lock();

        if let Some(room) = rooms.get(id) {
            return Arc::clone(room);
        }

        let room = Arc::new(Room::with_config(id, self.config.room));
        rooms.insert(id.to_owned(), Arc::clone(&room));

        tracing::info!(room = %id, rooms = rooms.len(), "Room created");

        room
    }

    /// Close a room and remove it from the manager
    ///
    /// Returns the closed room. Holders of other references to it see an
    /// empty room from now on.
    pub fn destroy_room(&self, id: &str) -> Result<Arc<Room>, RoomError> {
        let mut rooms = self.rooms.lock();

        let room = rooms
            .get(id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(id.to_owned()))?;

        room.close();
        rooms.remove(id);

        tracing::info!(room = %id, rooms = rooms.len(), "Room destroyed");

        Ok(room)
    }

    /// Look up a room by id
    pub fn get_room(&self, id: &str) -> Result<Arc<Room>, RoomError> {
        self.rooms
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(id.to_owned()))
    }

    /// Snapshot of all rooms keyed by id
    pub fn get_rooms(&self) -> HashMap<String, Arc<Room>> {
        self.rooms.lock().clone()
    }

    /// Number of live rooms
    pub fn count_rooms(&self) -> usize {
        self.rooms.lock().len()
    }

    /// Aggregate statistics across all rooms
    pub fn stats(&self) -> ManagerStats {
        // Read each room outside the manager lock
        let rooms = self.get_rooms();

        rooms.values().fold(
            ManagerStats {
                rooms: rooms.len(),
                ..ManagerStats::default()
            },
            |mut acc, room| {
                acc.members += room.count_members();
                acc.streams += room.count_streams();
                acc
            },
        )
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
