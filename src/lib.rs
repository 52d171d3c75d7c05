//! Room-based WebSocket State Relay Library
//!
//! Relays player position, speed, sprite and chat between everyone in the
//! same room, using tokio-tungstenite and the Actor pattern.
//!
//! # Protocol
//! One WebSocket text message carries one frame: fields joined by U+FFFF,
//! tag first.
//! - Client → server: `m x y`, `spd n`, `spr name index`, `say text`, `name n`
//! - Server → client: `s id`, `c id`, `d id`, `m id x y`, `spd id n`,
//!   `spr id name index`, `say <name> text`
//!
//! # Architecture
//! - Each room is an actor task that owns its clients; rooms are created at
//!   startup and served at `/<room name>`
//! - Each connection has a reader and a writer task that only talk to the
//!   room through queues
//! - Clients that cannot keep up with broadcasts are disconnected
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use orbs_relay::{serve, RelayConfig, RoomSet, SpriteSet};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RelayConfig::default();
//!     let sprites = SpriteSet::new(["hero", "ghost"]);
//!     let rooms = Arc::new(RoomSet::spawn(config.room_names(), sprites, &config));
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     serve(listener, rooms).await.unwrap();
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod id_pool;
pub mod message;
pub mod room;
pub mod server;
pub mod sprites;
pub mod types;

// Re-export main types for convenience
pub use client::{Client, Sprite};
pub use config::RelayConfig;
pub use error::{AppError, ProtocolError, SendError};
pub use handler::handle_connection;
pub use id_pool::IdPool;
pub use message::{ClientMessage, IntField, ServerMessage, DELIMITER};
pub use room::{Envelope, Room, RoomHandle};
pub use server::{serve, RoomSet};
pub use sprites::SpriteSet;
pub use types::{ClientId, ClientKey, RoomName};
