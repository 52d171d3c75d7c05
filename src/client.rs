//! Client struct definition
//!
//! Represents a player connected to a room with their synchronized state
//! and the sending half of their outbound frame queue.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::{IntField, ServerMessage};
use crate::types::{ClientId, ClientKey};

/// Speed every client starts with
pub const DEFAULT_SPEED: i64 = 3;

/// A validated sprite selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub name: String,
    pub index: i64,
}

/// Connected client information
///
/// Dropping a `Client` drops the only sender of its outbound queue, which
/// ends the connection's writer task.
#[derive(Debug)]
pub struct Client {
    /// Identifier and connection serial
    pub key: ClientKey,
    pub x: i64,
    pub y: i64,
    /// Display name (None until set; never changes afterwards)
    pub name: Option<String>,
    pub speed: i64,
    /// Sprite selection (None until a valid one is received)
    pub sprite: Option<Sprite>,
    /// Room → Client frame queue
    sender: mpsc::Sender<String>,
}

impl Client {
    /// Create a client at the origin with default speed and no name or sprite
    pub fn new(key: ClientKey, sender: mpsc::Sender<String>) -> Self {
        Self {
            key,
            x: 0,
            y: 0,
            name: None,
            speed: DEFAULT_SPEED,
            sprite: None,
            sender,
        }
    }

    pub fn id(&self) -> ClientId {
        self.key.id
    }

    /// Queue a message, waiting for room in the queue
    pub async fn send(&self, msg: &ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg.to_string())
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Queue an already encoded frame without waiting
    pub fn try_send(&self, frame: String) -> Result<(), SendError> {
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Set the display name
    ///
    /// Returns false if a name was already set.
    pub fn set_name(&mut self, name: String) -> bool {
        if self.name.is_some() {
            return false;
        }
        self.name = Some(name);
        true
    }

    /// Messages describing this client to a newcomer
    ///
    /// Presence, position and speed, plus the sprite only if one is set.
    pub fn snapshot(&self) -> Vec<ServerMessage> {
        let id = self.id();
        let mut messages = vec![
            ServerMessage::Connected(id),
            ServerMessage::Moved {
                id,
                x: IntField::from(self.x),
                y: IntField::from(self.y),
            },
            ServerMessage::Speed {
                id,
                speed: IntField::from(self.speed),
            },
        ];
        if let Some(sprite) = &self.sprite {
            messages.push(ServerMessage::Sprite {
                id,
                name: sprite.name.clone(),
                index: IntField::from(sprite.index),
            });
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u16) -> ClientKey {
        ClientKey {
            id: ClientId(id),
            serial: 1,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let client = Client::new(key(4), tx);

        assert_eq!(client.id(), ClientId(4));
        assert_eq!((client.x, client.y), (0, 0));
        assert_eq!(client.speed, DEFAULT_SPEED);
        assert!(client.name.is_none());
        assert!(client.sprite.is_none());
    }

    #[tokio::test]
    async fn test_client_name_set_once() {
        let (tx, _rx) = mpsc::channel(32);
        let mut client = Client::new(key(0), tx);

        assert!(client.set_name("Alice".to_string()));
        assert!(!client.set_name("Bob".to_string()));
        assert_eq!(client.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_snapshot_includes_sprite_only_when_set() {
        let (tx, _rx) = mpsc::channel(32);
        let mut client = Client::new(key(2), tx);
        assert_eq!(client.snapshot().len(), 3);

        client.sprite = Some(Sprite {
            name: "hero".to_string(),
            index: 1,
        });
        let snapshot = client.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[0], ServerMessage::Connected(ClientId(2)));
        assert_eq!(
            snapshot[3],
            ServerMessage::Sprite {
                id: ClientId(2),
                name: "hero".to_string(),
                index: IntField::from(1)
            }
        );
    }

    #[tokio::test]
    async fn test_try_send_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let client = Client::new(key(0), tx);

        assert_eq!(client.try_send("a".to_string()), Ok(()));
        assert_eq!(client.try_send("b".to_string()), Err(SendError::Full));

        drop(rx);
        assert_eq!(
            client.try_send("c".to_string()),
            Err(SendError::ChannelClosed)
        );
    }
}
