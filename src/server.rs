//! Room set and accept loop
//!
//! All rooms are spawned once at startup and live as long as the process.
//! The accept loop hands every TCP connection to its own handler task,
//! which picks the room from the request path.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::RelayConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::room::{Room, RoomHandle};
use crate::sprites::SpriteSet;
use crate::types::RoomName;

/// Fixed collection of running rooms, keyed by name
#[derive(Debug)]
pub struct RoomSet {
    rooms: HashMap<String, RoomHandle>,
    outbound_capacity: usize,
}

impl RoomSet {
    /// Spawn one room actor per name, all sharing the same sprite set
    pub fn spawn(names: Vec<RoomName>, sprites: SpriteSet, config: &RelayConfig) -> Self {
        let rooms = names
            .into_iter()
            .map(|name| {
                let key = name.0.clone();
                (key, Room::spawn(name, sprites.clone(), config))
            })
            .collect();

        Self {
            rooms,
            outbound_capacity: config.outbound_capacity,
        }
    }

    pub fn get(&self, name: &str) -> Option<&RoomHandle> {
        self.rooms.get(name)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Bound of each client's outbound frame queue
    pub fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }
}

/// Accept connections forever
pub async fn serve(listener: TcpListener, rooms: Arc<RoomSet>) -> Result<(), AppError> {
    info!(
        "Relay listening on {} with {} rooms",
        listener.local_addr()?,
        rooms.len()
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let rooms = Arc::clone(&rooms);

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    match handle_connection(stream, rooms).await {
                        Ok(()) => {}
                        Err(AppError::UnknownRoom(path)) => {
                            warn!("Refused {}: no room at {:?}", addr, path);
                        }
                        Err(e) => error!("Connection handler error for {}: {}", addr, e),
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_room_set_spawns_every_name() {
        let config = RelayConfig {
            room_count: 4,
            ..RelayConfig::default()
        };
        let rooms = RoomSet::spawn(config.room_names(), SpriteSet::default(), &config);

        assert_eq!(rooms.len(), 4);
        assert!(!rooms.is_empty());
        for name in ["0", "1", "2", "3"] {
            assert_eq!(rooms.get(name).map(|r| r.name().as_str()), Some(name));
        }
        assert!(rooms.get("4").is_none());
        assert!(rooms.get("").is_none());
        assert_eq!(rooms.outbound_capacity(), 256);
    }
}
