//! Frame dispatch.
//!
//! Every inbound frame is a `ClientFrame` variant; the match below is
//! exhaustive, so adding a frame type without routing it is a compile
//! error. The returned frame, if any, goes back to the originating
//! connection only; broadcasts happen inside the state methods.

use crate::error::BrokerError;
use crate::protocol::{ClientFrame, ServerFrame};
use crate::state::AppState;
use crate::types::ConnectionId;
use std::sync::Arc;

pub async fn handle_frame(
    frame: ClientFrame,
    connection_id: &ConnectionId,
    state: &Arc<AppState>,
) -> Option<ServerFrame> {
    match frame {
        ClientFrame::Auth { user_id, user_name } => {
            match state.authenticate(connection_id, user_id, user_name).await {
                Ok(user) => Some(ServerFrame::AuthSuccess {
                    user_id: user.id,
                    user_name: user.name,
                }),
                Err(e) => {
                    tracing::warn!(%connection_id, error = %e, "auth failed");
                    Some(ServerFrame::AuthError {
                        message: e.to_string(),
                    })
                }
            }
        }

        ClientFrame::JoinEvent { event_id } => {
            match state.join_event(connection_id, &event_id).await {
                Ok(()) => Some(ServerFrame::JoinedEvent { event_id }),
                Err(e) => {
                    tracing::warn!(%connection_id, %event_id, error = %e, "join failed");
                    Some(ServerFrame::JoinError {
                        event_id,
                        error: e.to_string(),
                    })
                }
            }
        }

        ClientFrame::LeaveEvent { event_id } => {
            match state.leave_event(connection_id, &event_id).await {
                Ok(()) => Some(ServerFrame::LeftEvent { event_id }),
                Err(e) => Some(ServerFrame::Error {
                    message: e.to_string(),
                }),
            }
        }

        ClientFrame::SendMessage {
            event_id,
            content,
            reply_to_id,
        } => {
            match state
                .send_chat_message(connection_id, &event_id, content, reply_to_id)
                .await
            {
                // The sender hears the message through the room broadcast
                Ok(_) => None,
                Err(e) => {
                    log_failure(connection_id, &e, "send_message");
                    Some(ServerFrame::MessageError {
                        message: e.to_string(),
                    })
                }
            }
        }

        ClientFrame::LoadMessages {
            event_id,
            limit,
            offset,
        } => {
            match state
                .load_history(connection_id, &event_id, limit, offset)
                .await
            {
                Ok((messages, has_more)) => Some(ServerFrame::MessagesLoaded {
                    event_id,
                    messages,
                    has_more,
                }),
                Err(e) => {
                    log_failure(connection_id, &e, "load_messages");
                    Some(ServerFrame::LoadMessagesError {
                        event_id,
                        message: e.to_string(),
                    })
                }
            }
        }

        ClientFrame::Typing {
            event_id,
            is_typing,
        } => match state.relay_typing(connection_id, &event_id, is_typing).await {
            Ok(()) => None,
            Err(e) => Some(ServerFrame::Error {
                message: e.to_string(),
            }),
        },
    }
}

fn log_failure(connection_id: &ConnectionId, error: &BrokerError, op: &str) {
    match error {
        BrokerError::Persistence(e) => {
            tracing::error!(%connection_id, op, error = %e, "store failure");
        }
        other => {
            tracing::warn!(%connection_id, op, error = %other, "request rejected");
        }
    }
}
