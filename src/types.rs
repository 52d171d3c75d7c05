//! Basic type definitions for the relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: small per-room player identifier sent on the wire
//! - `ClientKey`: identifier plus connection serial, used internally
//! - `RoomName`: name of a preconfigured room

/// Per-room client identifier (newtype pattern)
///
/// Allocated from `[0, max_id]` and reused once its owner disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u16);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one admitted connection within a room
///
/// Identifiers are recycled, so the room also stamps every admission with
/// a monotonically increasing serial. Requests carrying a key whose serial
/// does not match the current holder of the identifier are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub id: ClientId,
    pub serial: u64,
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.id, self.serial)
    }
}

/// Room name
///
/// Rooms are served at `/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(pub String);

impl RoomName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
