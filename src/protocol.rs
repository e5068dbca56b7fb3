use crate::types::*;
use serde::{Deserialize, Serialize};

/// Frames sent by clients. Each WebSocket text frame carries one JSON
/// object tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientFrame {
    Auth {
        user_id: UserId,
        user_name: String,
    },
    JoinEvent {
        event_id: EventId,
    },
    LeaveEvent {
        event_id: EventId,
    },
    SendMessage {
        event_id: EventId,
        content: String,
        #[serde(default)]
        reply_to_id: Option<MessageId>,
    },
    LoadMessages {
        event_id: EventId,
        #[serde(default)]
        limit: Option<u32>,
        #[serde(default)]
        offset: Option<u32>,
    },
    Typing {
        event_id: EventId,
        is_typing: bool,
    },
}

/// Frames sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerFrame {
    /// Acknowledges a freshly opened connection
    Connection {
        connection_id: ConnectionId,
    },
    AuthSuccess {
        user_id: UserId,
        user_name: String,
    },
    AuthError {
        message: String,
    },
    JoinedEvent {
        event_id: EventId,
    },
    JoinError {
        event_id: EventId,
        error: String,
    },
    LeftEvent {
        event_id: EventId,
    },
    UserJoined {
        event_id: EventId,
        user: ChatUser,
    },
    UserLeft {
        event_id: EventId,
        user: ChatUser,
    },
    NewMessage {
        event_id: EventId,
        message: MessageInfo,
    },
    MessageError {
        message: String,
    },
    MessagesLoaded {
        event_id: EventId,
        messages: Vec<MessageInfo>,
        has_more: bool,
    },
    LoadMessagesError {
        event_id: EventId,
        message: String,
    },
    UserTyping {
        event_id: EventId,
        user: ChatUser,
        is_typing: bool,
    },
    /// Malformed-frame fallback
    Error {
        message: String,
    },
}
