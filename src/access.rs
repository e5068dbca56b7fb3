//! Room access decisions.
//!
//! Access to an event's room is granted to the event's organizer and to
//! users with an approved attendance record. There is deliberately no
//! silent fallback: anything else is denied unless the broker was started
//! with the permissive policy, which is an explicit and logged choice.

use std::sync::Arc;

use crate::config::AccessPolicy;
use crate::error::StoreError;
use crate::store::{AttendeeStore, EventStore};
use crate::types::{EventId, UserId};

pub struct AccessVerifier {
    events: Arc<dyn EventStore>,
    attendees: Arc<dyn AttendeeStore>,
    policy: AccessPolicy,
}

impl AccessVerifier {
    pub fn new(
        events: Arc<dyn EventStore>,
        attendees: Arc<dyn AttendeeStore>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            events,
            attendees,
            policy,
        }
    }

    /// Whether `user_id` may read/write `event_id`'s room.
    pub async fn can_access(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<bool, StoreError> {
        if let Some(event) = self.events.get_event_by_id(event_id).await? {
            if event.organizer_id == *user_id {
                return Ok(true);
            }
        }

        if self.attendees.is_approved_attendee(event_id, user_id).await? {
            return Ok(true);
        }

        match self.policy {
            AccessPolicy::Strict => Ok(false),
            AccessPolicy::Permissive => {
                tracing::debug!(%user_id, %event_id, "permissive policy granting access");
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{AttendeeRecord, AttendeeStatus, EventRecord};

    async fn store_with_event() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .add_event(EventRecord {
                id: "42".to_string(),
                title: "Rooftop meetup".to_string(),
                organizer_id: "1".to_string(),
            })
            .await;
        store
            .add_attendee(AttendeeRecord {
                event_id: "42".to_string(),
                user_id: "2".to_string(),
                status: AttendeeStatus::Approved,
            })
            .await;
        store
            .add_attendee(AttendeeRecord {
                event_id: "42".to_string(),
                user_id: "3".to_string(),
                status: AttendeeStatus::Pending,
            })
            .await;
        store
    }

    fn verifier(store: Arc<MemoryStore>, policy: AccessPolicy) -> AccessVerifier {
        AccessVerifier::new(store.clone(), store, policy)
    }

    #[tokio::test]
    async fn organizer_and_approved_attendee_have_access() {
        let v = verifier(store_with_event().await, AccessPolicy::Strict);
        assert!(v.can_access(&"1".to_string(), &"42".to_string()).await.unwrap());
        assert!(v.can_access(&"2".to_string(), &"42".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn strict_policy_denies_everyone_else() {
        let v = verifier(store_with_event().await, AccessPolicy::Strict);
        // Pending attendee
        assert!(!v.can_access(&"3".to_string(), &"42".to_string()).await.unwrap());
        // Complete stranger
        assert!(!v.can_access(&"9".to_string(), &"42".to_string()).await.unwrap());
        // Unknown event
        assert!(!v.can_access(&"1".to_string(), &"99".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn permissive_policy_admits_strangers() {
        let v = verifier(store_with_event().await, AccessPolicy::Permissive);
        assert!(v.can_access(&"9".to_string(), &"42".to_string()).await.unwrap());
    }
}
