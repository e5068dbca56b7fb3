use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type ConnectionId = String;
pub type UserId = String;
pub type EventId = String;
pub type MessageId = String;

/// Minimal user identity attached to presence and typing broadcasts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatUser {
    pub id: UserId,
    pub name: String,
}

/// User row as held by the external user store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub display_name: String,
    pub username: String,
}

/// Event row as held by the external event store (only the fields the broker consults)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    pub organizer_id: UserId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeStatus {
    Pending,
    Approved,
    Rejected,
}

/// Attendance row linking a user to an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeRecord {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: AttendeeStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    System,
}

/// Persisted chat message row. Soft-deleted rows keep their content but
/// carry `deleted_at` and are excluded from history reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub event_id: EventId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Sender identity joined onto a message for the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderInfo {
    pub id: UserId,
    pub name: String,
    pub username: String,
}

impl From<&UserRecord> for SenderInfo {
    fn from(u: &UserRecord) -> Self {
        Self {
            id: u.id.clone(),
            name: u.display_name.clone(),
            username: u.username.clone(),
        }
    }
}

/// Message enriched with sender identity, as broadcast to rooms and
/// returned from history reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: MessageId,
    pub event_id: EventId,
    pub sender: SenderInfo,
    pub content: String,
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
}

impl MessageInfo {
    pub fn from_row(row: &ChatMessage, sender: &UserRecord) -> Self {
        Self {
            id: row.id.clone(),
            event_id: row.event_id.clone(),
            sender: SenderInfo::from(sender),
            content: row.content.clone(),
            message_type: row.message_type,
            reply_to_id: row.reply_to_id.clone(),
            created_at: row.created_at,
        }
    }
}
