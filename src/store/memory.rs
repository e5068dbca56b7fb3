//! In-memory store implementation.
//!
//! Backs local development and tests. Messages are appended in arrival
//! order, so reverse iteration gives the newest-first ordering history
//! queries expect.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AttendeeStore, EventStore, MessageStore, NewMessage, UserStore};
use crate::error::StoreError;
use crate::types::*;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
    events: RwLock<HashMap<EventId, EventRecord>>,
    attendees: RwLock<Vec<AttendeeRecord>>,
    messages: RwLock<Vec<ChatMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn add_event(&self, event: EventRecord) {
        self.events.write().await.insert(event.id.clone(), event);
    }

    pub async fn add_attendee(&self, attendee: AttendeeRecord) {
        self.attendees.write().await.push(attendee);
    }

    /// Mark a message deleted without erasing it. The broker never deletes
    /// messages itself; this stands in for the owning application's
    /// moderation surface so the read-side filtering can be exercised.
    pub async fn soft_delete(&self, id: &MessageId) -> Result<(), StoreError> {
        let mut messages = self.messages.write().await;
        let row = messages
            .iter_mut()
            .find(|m| m.id == *id)
            .ok_or(StoreError::NotFound("message"))?;
        row.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn get_event_by_id(
        &self,
        event_id: &EventId,
    ) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.events.read().await.get(event_id).cloned())
    }
}

#[async_trait]
impl AttendeeStore for MemoryStore {
    async fn is_approved_attendee(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<bool, StoreError> {
        Ok(self.attendees.read().await.iter().any(|a| {
            a.event_id == *event_id && a.user_id == *user_id && a.status == AttendeeStatus::Approved
        }))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: NewMessage) -> Result<MessageId, StoreError> {
        let row = ChatMessage {
            id: ulid::Ulid::new().to_string(),
            event_id: message.event_id,
            sender_id: message.sender_id,
            content: message.content,
            message_type: message.message_type,
            reply_to_id: message.reply_to_id,
            created_at: Utc::now(),
            deleted_at: None,
        };
        let id = row.id.clone();
        self.messages.write().await.push(row);
        Ok(id)
    }

    async fn fetch_enriched(&self, id: &MessageId) -> Result<Option<MessageInfo>, StoreError> {
        let messages = self.messages.read().await;
        let Some(row) = messages.iter().find(|m| m.id == *id) else {
            return Ok(None);
        };
        let users = self.users.read().await;
        let sender = users
            .get(&row.sender_id)
            .ok_or(StoreError::NotFound("sender"))?;
        Ok(Some(MessageInfo::from_row(row, sender)))
    }

    async fn list_for_event(
        &self,
        event_id: &EventId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MessageInfo>, StoreError> {
        let messages = self.messages.read().await;
        let users = self.users.read().await;

        messages
            .iter()
            .rev()
            .filter(|m| m.event_id == *event_id && m.deleted_at.is_none())
            .skip(offset)
            .take(limit)
            .map(|row| {
                let sender = users
                    .get(&row.sender_id)
                    .ok_or(StoreError::NotFound("sender"))?;
                Ok(MessageInfo::from_row(row, sender))
            })
            .collect()
    }
}
