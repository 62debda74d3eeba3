//! Room and manager configuration

/// Per-room configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Initial capacity of the member table
    pub member_capacity: usize,

    /// Initial capacity of the active stream table
    pub stream_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            member_capacity: 16,
            stream_capacity: 8,
        }
    }
}

impl RoomConfig {
    /// Set the initial member table capacity
    pub fn member_capacity(mut self, capacity: usize) -> Self {
        self.member_capacity = capacity;
        self
    }

    /// Set the initial stream table capacity
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }
}

/// Room manager configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Initial capacity of the room table
    pub room_capacity: usize,

    /// Configuration applied to every room the manager creates
    pub room: RoomConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            room_capacity: 64,
            room: RoomConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Set the initial room table capacity
    pub fn room_capacity(mut self, capacity: usize) -> Self {
        self.room_capacity = capacity;
        self
    }

    /// Set the configuration for created rooms
    pub fn room(mut self, room: RoomConfig) -> Self {
        self.room = room;
        self
    }
}
