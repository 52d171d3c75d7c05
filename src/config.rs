//! Relay configuration
//!
//! A single explicit value handed to the room set and the connection
//! handlers. Defaults can be overridden through environment variables:
//! - `PORT`: listen port
//! - `ORBS_ROOMS`: number of rooms
//! - `ORBS_MAX_ID`: highest client identifier per room
//! - `ORBS_SPRITE_INDEX`: path of the asset index listing sprite keys

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;
use crate::types::RoomName;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ROOM_COUNT: usize = 180;
pub const DEFAULT_MAX_ID: u16 = 512;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_SPRITE_INDEX: &str = "public/play/gamesdefault/index.json";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the TCP listener binds to
    pub bind_addr: String,
    /// Rooms `"0"..room_count` are created at startup
    pub room_count: usize,
    /// Client identifiers range over `[0, max_id]`
    pub max_id: u16,
    /// Per-client outbound frame queue bound
    pub outbound_capacity: usize,
    /// Bound of each room's inbound event queues
    pub event_capacity: usize,
    /// Asset index the sprite set is loaded from
    pub sprite_index: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            room_count: DEFAULT_ROOM_COUNT,
            max_id: DEFAULT_MAX_ID,
            outbound_capacity: DEFAULT_QUEUE_CAPACITY,
            event_capacity: DEFAULT_QUEUE_CAPACITY,
            sprite_index: PathBuf::from(DEFAULT_SPRITE_INDEX),
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by whatever is set in the environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            let port: u16 = parse_var("PORT", &port)?;
            config.bind_addr = format!("0.0.0.0:{}", port);
        }
        if let Some(rooms) = lookup("ORBS_ROOMS") {
            config.room_count = parse_var("ORBS_ROOMS", &rooms)?;
        }
        if let Some(max_id) = lookup("ORBS_MAX_ID") {
            config.max_id = parse_var("ORBS_MAX_ID", &max_id)?;
        }
        if let Some(path) = lookup("ORBS_SPRITE_INDEX") {
            config.sprite_index = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Names of the rooms to create: `"0"` through `"room_count - 1"`
    pub fn room_names(&self) -> Vec<RoomName> {
        (0..self.room_count)
            .map(|i| RoomName(i.to_string()))
            .collect()
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{}={:?}", key, value)))
}
