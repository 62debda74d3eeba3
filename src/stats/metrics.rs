//! Statistics for rooms and the room manager

/// Room-level statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomStats {
    /// Room id
    pub id: String,
    /// Current members
    pub members: usize,
    /// Members with the presenter role
    pub presenters: usize,
    /// Members with the viewer role
    pub viewers: usize,
    /// Active streams
    pub streams: usize,
    /// Active streams with no recipient filter
    pub broadcast_streams: usize,
}

impl RoomStats {
    /// Active streams restricted to some roles
    pub fn filtered_streams(&self) -> usize {
        self.streams - self.broadcast_streams
    }

    /// Check if the room has neither members nor streams
    pub fn is_empty(&self) -> bool {
        self.members == 0 && self.streams == 0
    }
}

/// Manager-wide statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Live rooms
    pub rooms: usize,
    /// Members across all rooms
    pub members: usize,
    /// Active streams across all rooms
    pub streams: usize,
}

impl ManagerStats {
    /// Average members per room
    pub fn average_members(&self) -> f64 {
        if self.rooms > 0 {
            self.members as f64 / self.rooms as f64
        } else {
            0.0
        }
    }
}
