pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::{ClientFrame, ServerFrame};
use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle one WebSocket connection for its whole lifetime.
///
/// All outbound traffic for the connection funnels through one unbounded
/// channel owned by the registry, so broadcasts from other tasks and direct
/// replies share a single ordered writer.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // The registry holds the only sender; once `disconnect` drops the
    // connection record the recv() arm below sees the channel close and
    // the task shuts down. Direct replies go through the registry too.
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerFrame>();
    let connection_id = state.register_connection(outbound_tx).await;
    tracing::info!(%connection_id, "websocket connected");

    let mut heartbeat = tokio::time::interval(state.config.heartbeat_interval);

    loop {
        tokio::select! {
            // Outbound frames: direct replies and room broadcasts alike
            frame = outbound_rx.recv() => {
                let Some(frame) = frame else {
                    // Registry dropped the sender (e.g. liveness reaper)
                    break;
                };
                match serde_json::to_string(&frame) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(%connection_id, error = %e, "frame serialization failed"),
                }
            }

            // Liveness probe; the pong (or any frame) refreshes last_seen
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            // Inbound frames
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        state.touch(&connection_id).await;

                        let reply = match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(frame) => {
                                handlers::handle_frame(frame, &connection_id, &state).await
                            }
                            Err(e) => {
                                tracing::warn!(%connection_id, error = %e, "malformed frame");
                                Some(ServerFrame::Error {
                                    message: format!("invalid message format: {e}"),
                                })
                            }
                        };
                        if let Some(reply) = reply {
                            if !state.send_to_connection(&connection_id, reply).await {
                                // Unregistered out from under us (reaper)
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        state.touch(&connection_id).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!(%connection_id, "client closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(%connection_id, error = %e, "websocket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.disconnect(&connection_id).await;
    tracing::info!(%connection_id, "websocket closed");
}
