//! Error types for the relay
//!
//! Defines application-level errors, protocol errors and outbound queue
//! errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::RoomName;

/// Application-level errors
///
/// Connection failures, admission failures and bootstrap failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal for the connection)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON deserialization error (sprite manifest)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (room or client queue gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Every identifier in the room is taken
    #[error("Room {0} is full")]
    RoomFull(RoomName),

    /// Upgrade requested on a path that names no room
    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Protocol errors
///
/// Every malformed, out-of-range or disallowed frame collapses into the
/// same classification carrying the offending text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    pub fn invalid(frame: &str) -> Self {
        Self::InvalidMessage(frame.to_string())
    }
}

/// Outbound queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The queue is at capacity (slow consumer)
    #[error("Channel full")]
    Full,

    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_carries_raw_frame() {
        let err = ProtocolError::invalid("spd\u{FFFF}11");
        assert_eq!(err.to_string(), "Invalid message: spd\u{FFFF}11");
    }

    #[test]
    fn test_room_full_display() {
        let err = AppError::RoomFull(RoomName::from("4"));
        assert_eq!(err.to_string(), "Room 4 is full");
    }
}
