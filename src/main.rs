//! Orbs relay - Entry Point
//!
//! Loads configuration and the sprite set, spawns the rooms and accepts
//! connections.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orbs_relay::{serve, RelayConfig, RoomSet, SpriteSet};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=orbs_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orbs_relay=info")),
        )
        .init();

    let config = RelayConfig::from_env()?;

    let sprites = SpriteSet::load(&config.sprite_index)?;
    info!(
        "Loaded {} sprites from {}",
        sprites.len(),
        config.sprite_index.display()
    );
    if sprites.is_empty() {
        warn!("Sprite set is empty, every sprite change will be rejected");
    }

    let rooms = Arc::new(RoomSet::spawn(config.room_names(), sprites, &config));
    info!("Started {} rooms", rooms.len());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    serve(listener, rooms).await?;

    Ok(())
}
