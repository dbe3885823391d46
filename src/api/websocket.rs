use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::rest::AppState;
use crate::messaging::EventMessage;

/// Upgrade handler for the `/ws` event feed. Each client gets its own bus
/// subscription, dropped when the socket closes.
pub async fn handle_ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let events = state.bus.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

async fn handle_socket(socket: WebSocket, mut events: broadcast::Receiver<EventMessage>) {
    // Split the socket into sender and receiver
    let (sender, mut receiver) = socket.split();

    // Share the sender between the fan-out and ping-reply tasks
    let sender = Arc::new(tokio::sync::Mutex::new(sender));
    let forward_sender = sender.clone();

    // Fan bus events out to this client until it disconnects
    let mut forward_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Failed to encode event frame: {}", e);
                            continue;
                        }
                    };

                    if forward_sender
                        .lock()
                        .await
                        .send(Message::Text(frame))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // A slow client drops its oldest events; there is no replay.
                    warn!("Event feed lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Drain client frames; a text "ping" is answered with "pong"
    let reply_sender = sender.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) if text == "ping" => {
                    if reply_sender
                        .lock()
                        .await
                        .send(Message::Text("pong".to_string()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Whichever side finishes first tears the other down
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    debug!("Event feed client disconnected");
}
