mod messages;
mod registry;
mod rooms;

pub use messages::{HISTORY_LIMIT_DEFAULT, HISTORY_LIMIT_MAX};
pub use registry::{Connection, ConnectionRegistry};
pub use rooms::RoomManager;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::access::AccessVerifier;
use crate::config::BrokerConfig;
use crate::store::{AttendeeStore, EventStore, MessageStore, UserStore};

/// Shared broker state.
///
/// The connection and room tables are owned here and mutated only through
/// their own methods; guarded sections are short and never held across a
/// store await.
pub struct AppState {
    pub config: BrokerConfig,
    pub registry: RwLock<ConnectionRegistry>,
    pub rooms: RwLock<RoomManager>,
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) verifier: AccessVerifier,
    pub(crate) messages: Arc<dyn MessageStore>,
}

impl AppState {
    pub fn new(
        config: BrokerConfig,
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        attendees: Arc<dyn AttendeeStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        let verifier = AccessVerifier::new(events, attendees, config.access_policy);
        Self {
            config,
            registry: RwLock::new(ConnectionRegistry::new()),
            rooms: RwLock::new(RoomManager::new()),
            users,
            verifier,
            messages,
        }
    }
}
