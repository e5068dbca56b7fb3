//! External-collaborator seams.
//!
//! The broker owns no durable state; user, event, attendee, and message
//! data live behind these traits. The binary currently wires the in-memory
//! implementation; a database-backed deployment swaps in its own.

pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::*;

pub use memory::MemoryStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_event_by_id(&self, event_id: &EventId)
        -> Result<Option<EventRecord>, StoreError>;
}

#[async_trait]
pub trait AttendeeStore: Send + Sync {
    /// Whether `user_id` has an approved attendance record for `event_id`
    async fn is_approved_attendee(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, StoreError>;
}

/// Fields for a new message; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub event_id: EventId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to_id: Option<MessageId>,
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message and return its assigned id
    async fn insert(&self, message: NewMessage) -> Result<MessageId, StoreError>;

    /// Fetch one persisted message joined with its sender identity
    async fn fetch_enriched(&self, id: &MessageId) -> Result<Option<MessageInfo>, StoreError>;

    /// Page of messages for an event, newest first, soft-deleted rows
    /// excluded. Deletion itself belongs to the application that owns the
    /// store; the broker only ever filters deleted rows out.
    async fn list_for_event(
        &self,
        event_id: &EventId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MessageInfo>, StoreError>;
}
