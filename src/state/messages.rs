//! Message service: validation, persistence, enrichment, history.

use super::AppState;
use crate::error::{BrokerError, BrokerResult, StoreError};
use crate::protocol::ServerFrame;
use crate::store::NewMessage;
use crate::types::*;

/// Hard cap on history page size
pub const HISTORY_LIMIT_MAX: u32 = 100;
/// Page size used when the client does not ask for one
pub const HISTORY_LIMIT_DEFAULT: u32 = 50;

impl AppState {
    /// Validate, persist, enrich, and broadcast a chat message.
    ///
    /// The broadcast happens strictly after the store accepted the row; a
    /// persistence failure reaches only the sender and nothing is fanned
    /// out.
    pub async fn send_chat_message(
        &self,
        connection_id: &ConnectionId,
        event_id: &EventId,
        content: String,
        reply_to_id: Option<MessageId>,
    ) -> BrokerResult<MessageInfo> {
        let user = self.require_auth(connection_id).await?;

        if content.trim().is_empty() {
            return Err(BrokerError::InvalidMessage(
                "message content must not be empty".to_string(),
            ));
        }

        if !self.verifier.can_access(&user.id, event_id).await? {
            return Err(BrokerError::Forbidden(format!(
                "no access to event {event_id}"
            )));
        }

        let message_id = self
            .messages
            .insert(NewMessage {
                event_id: event_id.clone(),
                sender_id: user.id.clone(),
                content,
                message_type: MessageType::Text,
                reply_to_id,
            })
            .await?;

        // Re-read the persisted row joined with sender identity so the
        // broadcast carries exactly what history will later return
        let message = self
            .messages
            .fetch_enriched(&message_id)
            .await?
            .ok_or(StoreError::NotFound("message"))?;

        tracing::debug!(%connection_id, %event_id, %message_id, "message persisted");
        self.broadcast_to_room(
            event_id,
            ServerFrame::NewMessage {
                event_id: event_id.clone(),
                message: message.clone(),
            },
            None,
        )
        .await;

        Ok(message)
    }

    /// Paginated history, oldest-first within the returned page.
    ///
    /// Rows are fetched newest-first (cheap pagination against the store)
    /// and reversed into chronological reading order; `has_more` reports
    /// whether the fetched page was full.
    pub async fn load_history(
        &self,
        connection_id: &ConnectionId,
        event_id: &EventId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> BrokerResult<(Vec<MessageInfo>, bool)> {
        let user = self.require_auth(connection_id).await?;

        if !self.verifier.can_access(&user.id, event_id).await? {
            return Err(BrokerError::Forbidden(format!(
                "no access to event {event_id}"
            )));
        }

        let limit = limit.unwrap_or(HISTORY_LIMIT_DEFAULT).min(HISTORY_LIMIT_MAX) as usize;
        let offset = offset.unwrap_or(0) as usize;

        let mut messages = self.messages.list_for_event(event_id, limit, offset).await?;
        let has_more = limit > 0 && messages.len() == limit;
        messages.reverse();

        Ok((messages, has_more))
    }

    /// Relay an ephemeral typing indicator to the room, excluding the
    /// sender. Nothing is persisted.
    pub async fn relay_typing(
        &self,
        connection_id: &ConnectionId,
        event_id: &EventId,
        is_typing: bool,
    ) -> BrokerResult<()> {
        let user = self.require_auth(connection_id).await?;

        self.broadcast_to_room(
            event_id,
            ServerFrame::UserTyping {
                event_id: event_id.clone(),
                user,
                is_typing,
            },
            Some(connection_id),
        )
        .await;

        Ok(())
    }
}
