//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake and room
//! selection, then the reader and writer tasks moving frames between the
//! socket and the room.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::room::RoomHandle;
use crate::server::RoomSet;

/// Handle a new TCP connection
///
/// The request path names the room (`/<room>`); unknown rooms are refused
/// with 404 during the handshake. A requested subprotocol is echoed back.
pub async fn handle_connection(stream: TcpStream, rooms: Arc<RoomSet>) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let mut selected: Option<RoomHandle> = None;
    let mut requested_path = String::new();
    let callback = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        let path = request.uri().path();
        requested_path = path.to_string();
        let Some(room) = rooms.get(path.trim_start_matches('/')) else {
            let mut refusal = ErrorResponse::new(Some(format!("unknown room {}", path)));
            *refusal.status_mut() = StatusCode::NOT_FOUND;
            return Err(refusal);
        };
        selected = Some(room.clone());

        if let Some(protocols) = request.headers().get(SEC_WEBSOCKET_PROTOCOL) {
            response
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, protocols.clone());
        }
        Ok(response)
    };

    // WebSocket handshake
    let handshake = tokio_tungstenite::accept_hdr_async(stream, callback).await;
    let (room, ws_stream) = match (selected, handshake) {
        (Some(room), Ok(ws_stream)) => (room, ws_stream),
        // The callback saw a path but refused it
        (None, _) if !requested_path.is_empty() => {
            return Err(AppError::UnknownRoom(requested_path))
        }
        (_, Err(e)) => return Err(e.into()),
        (None, Ok(_)) => return Err(AppError::UnknownRoom(requested_path)),
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Room -> client frame queue
    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(rooms.outbound_capacity());

    // Writer task starts first so the room can stream the admission
    // snapshot while we wait for the reply.
    let mut write_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(frame.into())).await {
                debug!("WebSocket send failed, ending write task: {}", e);
                return;
            }
        }
        debug!("Outbound queue closed, ending write task");

        // Send close frame when the room lets go of us
        let _ = ws_sender.close().await;
    });

    let key = match room.connect(frame_tx).await {
        Ok(key) => key,
        Err(e) => {
            // The room dropped our sender, so the writer closes the socket
            let _ = write_task.await;
            return Err(e);
        }
    };
    info!("Client {} connected to room {} from {}", key.id, room.name(), peer_addr);

    // Read task (WebSocket -> room)
    let read_room = room.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            let frame = match msg_result {
                Ok(Message::Text(text)) => text.to_string(),
                Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => text,
                    Err(_) => {
                        debug!("Dropping non-UTF-8 binary frame from {}", key);
                        continue;
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", key);
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    error!("WebSocket error for {}: {}", key, e);
                    break;
                }
            };
            if read_room.deliver(key, frame).await.is_err() {
                debug!("Room closed, ending read task for {}", key);
                break;
            }
        }
        debug!("Read task ended for {}", key);
    });

    // Wait for either task to complete, then stop the other
    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", key);
            write_task.abort();
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", key);
            read_task.abort();
        }
    }

    // Stale if the room already evicted us; the room ignores it then
    let _ = room.disconnect(key).await;

    info!("Client {} disconnected from room {}", key.id, room.name());

    Ok(())
}
