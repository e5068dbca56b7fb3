//! Room membership: which connections are subscribed to which event's chat.

use std::collections::{HashMap, HashSet};

use super::AppState;
use crate::error::{BrokerError, BrokerResult};
use crate::protocol::ServerFrame;
use crate::types::*;

/// Event-room table with a reverse index for O(1) cleanup.
///
/// Invariant: a connection is a member of at most one room. `join` enforces
/// it by removing the connection from its previous room first; `rooms` and
/// `member_of` always describe the same membership.
#[derive(Default)]
pub struct RoomManager {
    rooms: HashMap<EventId, HashSet<ConnectionId>>,
    member_of: HashMap<ConnectionId, EventId>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to an event's room, creating the room lazily.
    /// Returns the previous room the connection was implicitly removed
    /// from, if it was in a different one.
    pub fn join(&mut self, connection_id: ConnectionId, event_id: EventId) -> Option<EventId> {
        let previous = match self.member_of.get(&connection_id) {
            Some(current) if *current == event_id => return None,
            Some(_) => self.remove(&connection_id),
            None => None,
        };

        self.rooms
            .entry(event_id.clone())
            .or_default()
            .insert(connection_id.clone());
        self.member_of.insert(connection_id, event_id);
        previous
    }

    /// Remove membership if present. Leaving a room one is not in is a
    /// no-op; returns whether the connection actually was a member.
    pub fn leave(&mut self, connection_id: &ConnectionId, event_id: &EventId) -> bool {
        match self.member_of.get(connection_id) {
            Some(current) if current == event_id => {
                self.remove(connection_id);
                true
            }
            _ => false,
        }
    }

    /// Remove a connection from whatever room it is in (at most one).
    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> Option<EventId> {
        self.remove(connection_id)
    }

    /// Current member set snapshot for broadcast.
    pub fn members(&self, event_id: &EventId) -> Vec<ConnectionId> {
        self.rooms
            .get(event_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&EventId> {
        self.member_of.get(connection_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove(&mut self, connection_id: &ConnectionId) -> Option<EventId> {
        let event_id = self.member_of.remove(connection_id)?;
        if let Some(members) = self.rooms.get_mut(&event_id) {
            members.remove(connection_id);
            // Empty rooms are dropped, not kept around
            if members.is_empty() {
                self.rooms.remove(&event_id);
            }
        }
        Some(event_id)
    }
}

impl AppState {
    /// Join an event's room, implicitly leaving any prior room. Requires
    /// authentication and verifier approval.
    pub async fn join_event(
        &self,
        connection_id: &ConnectionId,
        event_id: &EventId,
    ) -> BrokerResult<()> {
        let user = self.require_auth(connection_id).await?;

        if !self.verifier.can_access(&user.id, event_id).await? {
            tracing::warn!(%connection_id, user_id = %user.id, %event_id, "join denied");
            return Err(BrokerError::Forbidden(format!(
                "no access to event {event_id}"
            )));
        }

        let previous = self
            .rooms
            .write()
            .await
            .join(connection_id.clone(), event_id.clone());

        if let Some(prev) = previous {
            self.broadcast_to_room(
                &prev,
                ServerFrame::UserLeft {
                    event_id: prev.clone(),
                    user: user.clone(),
                },
                None,
            )
            .await;
        }

        tracing::info!(%connection_id, user_id = %user.id, %event_id, "joined room");
        self.broadcast_to_room(
            event_id,
            ServerFrame::UserJoined {
                event_id: event_id.clone(),
                user,
            },
            Some(connection_id),
        )
        .await;

        Ok(())
    }

    /// Leave an event's room. Idempotent.
    pub async fn leave_event(
        &self,
        connection_id: &ConnectionId,
        event_id: &EventId,
    ) -> BrokerResult<()> {
        let user = self.require_auth(connection_id).await?;

        let was_member = self.rooms.write().await.leave(connection_id, event_id);
        if was_member {
            tracing::info!(%connection_id, user_id = %user.id, %event_id, "left room");
            self.broadcast_to_room(
                event_id,
                ServerFrame::UserLeft {
                    event_id: event_id.clone(),
                    user,
                },
                None,
            )
            .await;
        }

        Ok(())
    }

    /// Transport-close / fatal-error cleanup: drop the connection record
    /// and its room membership, announcing the departure to the room.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let Some(conn) = self.registry.write().await.unregister(connection_id) else {
            return;
        };

        let left_room = self.rooms.write().await.remove_connection(connection_id);
        tracing::info!(%connection_id, ?left_room, "connection closed");

        if let (Some(event_id), Some(user)) = (left_room, conn.chat_user()) {
            self.broadcast_to_room(
                &event_id,
                ServerFrame::UserLeft {
                    event_id: event_id.clone(),
                    user,
                },
                None,
            )
            .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_is_in_at_most_one_room() {
        let mut rooms = RoomManager::new();

        assert_eq!(rooms.join("c1".to_string(), "42".to_string()), None);
        assert_eq!(rooms.room_of(&"c1".to_string()), Some(&"42".to_string()));

        // Joining another event implicitly leaves the first room
        let previous = rooms.join("c1".to_string(), "43".to_string());
        assert_eq!(previous, Some("42".to_string()));
        assert_eq!(rooms.room_of(&"c1".to_string()), Some(&"43".to_string()));
        assert!(rooms.members(&"42".to_string()).is_empty());
    }

    #[test]
    fn rejoining_same_room_is_a_no_op() {
        let mut rooms = RoomManager::new();
        rooms.join("c1".to_string(), "42".to_string());
        assert_eq!(rooms.join("c1".to_string(), "42".to_string()), None);
        assert_eq!(rooms.members(&"42".to_string()).len(), 1);
    }

    #[test]
    fn leave_is_idempotent() {
        let mut rooms = RoomManager::new();
        rooms.join("c1".to_string(), "42".to_string());

        assert!(rooms.leave(&"c1".to_string(), &"42".to_string()));
        assert!(!rooms.leave(&"c1".to_string(), &"42".to_string()));
        // Leaving a room one is not in is a no-op
        assert!(!rooms.leave(&"c2".to_string(), &"42".to_string()));
    }

    #[test]
    fn empty_rooms_are_dropped() {
        let mut rooms = RoomManager::new();
        rooms.join("c1".to_string(), "42".to_string());
        rooms.join("c2".to_string(), "42".to_string());
        assert_eq!(rooms.room_count(), 1);

        rooms.leave(&"c1".to_string(), &"42".to_string());
        assert_eq!(rooms.room_count(), 1);
        rooms.remove_connection(&"c2".to_string());
        assert_eq!(rooms.room_count(), 0);
    }

    #[test]
    fn remove_connection_reports_the_room_left() {
        let mut rooms = RoomManager::new();
        rooms.join("c1".to_string(), "42".to_string());

        assert_eq!(
            rooms.remove_connection(&"c1".to_string()),
            Some("42".to_string())
        );
        assert_eq!(rooms.remove_connection(&"c1".to_string()), None);
    }
}
