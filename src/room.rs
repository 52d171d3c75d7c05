//! Room actor implementation
//!
//! Each room is a single task that owns its clients and identifier pool.
//! Connection handlers talk to it only through three queues: connect
//! requests, disconnect requests and inbound frames. No locks are needed
//! since nothing else touches room state.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::{Client, Sprite};
use crate::config::RelayConfig;
use crate::error::{AppError, ProtocolError};
use crate::id_pool::IdPool;
use crate::message::{ClientMessage, ServerMessage};
use crate::sprites::SpriteSet;
use crate::types::{ClientId, ClientKey, RoomName};

/// Admission request sent by a connection handler
#[derive(Debug)]
pub struct ConnectRequest {
    /// Sending half of the new client's outbound queue
    pub sender: mpsc::Sender<String>,
    /// Receives the assigned key, or the reason admission was refused
    pub reply: oneshot::Sender<Result<ClientKey, AppError>>,
}

/// A raw inbound frame tagged with its sender
#[derive(Debug, Clone)]
pub struct Envelope {
    pub sender: ClientKey,
    pub frame: String,
}

/// Handle to a running room. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    name: RoomName,
    connect_tx: mpsc::Sender<ConnectRequest>,
    unregister_tx: mpsc::Sender<ClientKey>,
    inbound_tx: mpsc::Sender<Envelope>,
}

impl RoomHandle {
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// Ask the room to admit a client whose frames go to `sender`
    pub async fn connect(&self, sender: mpsc::Sender<String>) -> Result<ClientKey, AppError> {
        let (reply, reply_rx) = oneshot::channel();
        self.connect_tx
            .send(ConnectRequest { sender, reply })
            .await
            .map_err(|_| AppError::ChannelSend)?;
        reply_rx.await.map_err(|_| AppError::ChannelSend)?
    }

    /// Ask the room to drop a client
    pub async fn disconnect(&self, key: ClientKey) -> Result<(), AppError> {
        self.unregister_tx
            .send(key)
            .await
            .map_err(|_| AppError::ChannelSend)
    }

    /// Hand an inbound frame to the room
    pub async fn deliver(&self, sender: ClientKey, frame: String) -> Result<(), AppError> {
        self.inbound_tx
            .send(Envelope { sender, frame })
            .await
            .map_err(|_| AppError::ChannelSend)
    }
}

/// The room actor state
pub struct Room {
    name: RoomName,
    /// Connected clients by identifier
    clients: HashMap<ClientId, Client>,
    ids: IdPool,
    sprites: SpriteSet,
    /// Serial handed to the most recent admission
    last_serial: u64,
}

impl Room {
    pub fn new(name: RoomName, sprites: SpriteSet, config: &RelayConfig) -> Self {
        Self {
            name,
            clients: HashMap::new(),
            ids: IdPool::new(config.max_id),
            sprites,
            last_serial: 0,
        }
    }

    /// Start the room's event loop on its own task
    pub fn spawn(name: RoomName, sprites: SpriteSet, config: &RelayConfig) -> RoomHandle {
        let (connect_tx, connect_rx) = mpsc::channel(config.event_capacity);
        let (unregister_tx, unregister_rx) = mpsc::channel(config.event_capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.event_capacity);

        let room = Self::new(name.clone(), sprites, config);
        tokio::spawn(room.run(connect_rx, unregister_rx, inbound_rx));

        RoomHandle {
            name,
            connect_tx,
            unregister_tx,
            inbound_tx,
        }
    }

    /// Run the room event loop
    ///
    /// Events of one kind are handled in arrival order. When several kinds
    /// are ready at once the pick is random, so there is no ordering between
    /// kinds. Ends once every handle is dropped.
    pub async fn run(
        mut self,
        mut connect_rx: mpsc::Receiver<ConnectRequest>,
        mut unregister_rx: mpsc::Receiver<ClientKey>,
        mut inbound_rx: mpsc::Receiver<Envelope>,
    ) {
        debug!("Room {} started", self.name);

        loop {
            tokio::select! {
                Some(request) = connect_rx.recv() => {
                    let result = self.handle_connect(request.sender).await;
                    let _ = request.reply.send(result);
                }
                Some(key) = unregister_rx.recv() => {
                    self.handle_disconnect(key);
                }
                Some(envelope) = inbound_rx.recv() => {
                    if let Err(e) = self.handle_message(&envelope) {
                        warn!("Room {} client {}: {}", self.name, envelope.sender.id, e);
                    }
                }
                else => break,
            }
        }

        debug!("Room {} shutting down", self.name);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// Handle new client admission
    ///
    /// The newcomer first gets its identifier and the state of every
    /// present client; only then is it registered and its arrival announced
    /// to everyone, itself included.
    ///
    /// The snapshot is queued with a waiting send, not the evicting
    /// `try_send` used for broadcasts. A newcomer whose socket never drains
    /// therefore stalls this room's whole event loop until its writer task
    /// fails; there is no timeout.
    pub async fn handle_connect(
        &mut self,
        sender: mpsc::Sender<String>,
    ) -> Result<ClientKey, AppError> {
        let Some(id) = self.ids.acquire() else {
            warn!("Room {} is full, refusing connection", self.name);
            return Err(AppError::RoomFull(self.name.clone()));
        };
        self.last_serial += 1;
        let key = ClientKey {
            id,
            serial: self.last_serial,
        };
        let client = Client::new(key, sender);

        let mut snapshot = vec![ServerMessage::Assigned(id)];
        snapshot.extend(self.clients.values().flat_map(Client::snapshot));

        // The writer is already draining, so waiting here only stalls the
        // room while the newcomer catches up.
        for msg in &snapshot {
            if client.send(msg).await.is_err() {
                debug!("Client {} went away during admission", key);
                self.ids.release(id);
                return Err(AppError::ChannelSend);
            }
        }

        self.clients.insert(id, client);
        info!(
            "Client {} joined room {} ({} clients)",
            id,
            self.name,
            self.clients.len()
        );
        self.broadcast(&ServerMessage::Connected(id));

        Ok(key)
    }

    /// Handle a disconnect request
    ///
    /// Stale keys (the identifier now belongs to someone else, or the
    /// client was already evicted) are ignored.
    pub fn handle_disconnect(&mut self, key: ClientKey) {
        if self.is_current(key) {
            self.remove_client(key.id);
        } else {
            debug!("Ignoring stale disconnect for {} in room {}", key, self.name);
        }
    }

    /// Validate and apply one inbound frame
    ///
    /// On error the sender's state is untouched and nothing is broadcast.
    pub fn handle_message(&mut self, envelope: &Envelope) -> Result<(), ProtocolError> {
        if !self.is_current(envelope.sender) {
            debug!("Dropping frame from stale client {}", envelope.sender);
            return Ok(());
        }
        let msg = ClientMessage::parse(&envelope.frame)?;
        let invalid = || ProtocolError::invalid(&envelope.frame);

        let Some(client) = self.clients.get_mut(&envelope.sender.id) else {
            return Ok(());
        };
        let id = client.id();

        let outgoing = match msg {
            ClientMessage::Move { x, y } => {
                client.x = x.value();
                client.y = y.value();
                ServerMessage::Moved { id, x, y }
            }
            ClientMessage::Speed(speed) => {
                client.speed = speed.value();
                ServerMessage::Speed { id, speed }
            }
            ClientMessage::Sprite { name, index } => {
                if !self.sprites.contains(&name) {
                    return Err(invalid());
                }
                client.sprite = Some(Sprite {
                    name: name.clone(),
                    index: index.value(),
                });
                ServerMessage::Sprite { id, name, index }
            }
            ClientMessage::Say(text) => {
                let Some(name) = client.name.clone() else {
                    return Err(invalid());
                };
                ServerMessage::Say { name, text }
            }
            ClientMessage::Name(name) => {
                if !client.set_name(name) {
                    return Err(invalid());
                }
                debug!("Client {} in room {} named {:?}", id, self.name, client.name);
                return Ok(());
            }
        };

        self.broadcast(&outgoing);
        Ok(())
    }

    fn is_current(&self, key: ClientKey) -> bool {
        self.clients.get(&key.id).is_some_and(|c| c.key == key)
    }

    /// Release the identifier, close the outbound queue and tell the rest
    fn remove_client(&mut self, id: ClientId) {
        if self.clients.remove(&id).is_none() {
            return;
        }
        self.ids.release(id);
        info!(
            "Client {} left room {} ({} clients)",
            id,
            self.name,
            self.clients.len()
        );
        self.broadcast(&ServerMessage::Disconnected(id));
    }

    /// Queue a message for every client without blocking
    ///
    /// Clients whose queue is full or closed are evicted once the pass is
    /// done; their departure is broadcast in turn.
    fn broadcast(&mut self, msg: &ServerMessage) {
        let frame = msg.to_string();
        let lagging: Vec<ClientId> = self
            .clients
            .values()
            .filter_map(|client| match client.try_send(frame.clone()) {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        "Evicting client {} from room {}: {}",
                        client.id(),
                        self.name,
                        e
                    );
                    Some(client.id())
                }
            })
            .collect();

        for id in lagging {
            self.remove_client(id);
        }
    }
}
