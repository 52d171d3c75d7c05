//! Message protocol definitions
//!
//! Frames are plain text: fields joined by U+FFFF, a codepoint that can
//! never appear in a name or sprite key. The first field is the tag.
//! Integers travel as decimal text.

use std::fmt;

use crate::error::ProtocolError;
use crate::types::ClientId;

/// Field separator
pub const DELIMITER: char = '\u{FFFF}';

/// Highest speed a client may request
pub const MAX_SPEED: i64 = 10;

/// Longest accepted player name
pub const MAX_NAME_LEN: usize = 7;

/// Integer field, kept as it appeared on the wire
///
/// Rebroadcasts repeat the sender's text (`010` stays `010`); values the
/// room produces itself use plain decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntField {
    value: i64,
    text: String,
}

impl IntField {
    fn parse(text: &str) -> Option<Self> {
        let value = text.parse().ok()?;
        Some(Self {
            value,
            text: text.to_string(),
        })
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

impl From<i64> for IntField {
    fn from(value: i64) -> Self {
        Self {
            value,
            text: value.to_string(),
        }
    }
}

impl fmt::Display for IntField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Client → Server message
///
/// Only structural validation happens here (field count, integer parsing,
/// ranges, name charset). Checks that depend on room or client state are
/// made by the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `m` — "I moved to x, y"
    Move { x: IntField, y: IntField },
    /// `spd` — change my speed
    Speed(IntField),
    /// `spr` — change my sprite
    Sprite { name: String, index: IntField },
    /// `say` — chat text
    Say(String),
    /// `name` — pick my display name
    Name(String),
}

impl ClientMessage {
    /// Parse one inbound frame
    ///
    /// Empty fields are discarded before dispatch, so consecutive delimiters
    /// collapse into one.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::invalid(frame);
        let fields: Vec<&str> = frame.split(DELIMITER).filter(|f| !f.is_empty()).collect();

        match fields.as_slice() {
            ["m", x, y] => {
                let x = IntField::parse(x).ok_or_else(invalid)?;
                let y = IntField::parse(y).ok_or_else(invalid)?;
                Ok(Self::Move { x, y })
            }
            ["spd", speed] => {
                let speed = IntField::parse(speed).ok_or_else(invalid)?;
                if !(0..=MAX_SPEED).contains(&speed.value()) {
                    return Err(invalid());
                }
                Ok(Self::Speed(speed))
            }
            ["spr", name, index] => {
                let index = IntField::parse(index).ok_or_else(invalid)?;
                if index.value() < 0 {
                    return Err(invalid());
                }
                Ok(Self::Sprite {
                    name: name.to_string(),
                    index,
                })
            }
            ["say", text] => Ok(Self::Say(text.to_string())),
            ["name", name] if is_valid_name(name) => Ok(Self::Name(name.to_string())),
            _ => Err(invalid()),
        }
    }
}

/// `[A-Za-z0-9]+`, at most `MAX_NAME_LEN` characters
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `s` — your identifier
    Assigned(ClientId),
    /// `c` — a client is present / has connected
    Connected(ClientId),
    /// `d` — a client has disconnected
    Disconnected(ClientId),
    /// `m` — a client's position
    Moved {
        id: ClientId,
        x: IntField,
        y: IntField,
    },
    /// `spd` — a client's speed
    Speed { id: ClientId, speed: IntField },
    /// `spr` — a client's sprite
    Sprite {
        id: ClientId,
        name: String,
        index: IntField,
    },
    /// `say` — chat line, rendered as `<name> text`
    Say { name: String, text: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const D: char = DELIMITER;
        match self {
            Self::Assigned(id) => write!(f, "s{D}{id}"),
            Self::Connected(id) => write!(f, "c{D}{id}"),
            Self::Disconnected(id) => write!(f, "d{D}{id}"),
            Self::Moved { id, x, y } => write!(f, "m{D}{id}{D}{x}{D}{y}"),
            Self::Speed { id, speed } => write!(f, "spd{D}{id}{D}{speed}"),
            Self::Sprite { id, name, index } => write!(f, "spr{D}{id}{D}{name}{D}{index}"),
            Self::Say { name, text } => write!(f, "say{D}<{name}> {text}"),
        }
    }
}
