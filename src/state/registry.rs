//! Connection registry: every live transport session, authenticated or not.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::AppState;
use crate::error::{BrokerError, BrokerResult};
use crate::protocol::ServerFrame;
use crate::types::*;

/// One live connection. Owned exclusively by the registry; every other
/// component refers to it by `ConnectionId` only.
pub struct Connection {
    pub id: ConnectionId,
    outbound: mpsc::UnboundedSender<ServerFrame>,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub authenticated: bool,
    pub last_seen: Instant,
}

impl Connection {
    /// Queue a frame for this connection's writer task. A closed channel
    /// means the socket is already going away; the frame is simply dropped.
    pub fn send(&self, frame: ServerFrame) {
        let _ = self.outbound.send(frame);
    }

    /// Identity for presence broadcasts; `None` until authenticated.
    pub fn chat_user(&self) -> Option<ChatUser> {
        match (&self.user_id, &self.user_name) {
            (Some(id), Some(name)) => Some(ChatUser {
                id: id.clone(),
                name: name.clone(),
            }),
            _ => None,
        }
    }
}

/// Table of live connections, constructed once at broker start-up.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unauthenticated connection record and return its id.
    pub fn register(&mut self, outbound: mpsc::UnboundedSender<ServerFrame>) -> ConnectionId {
        let id = ulid::Ulid::new().to_string();
        self.connections.insert(
            id.clone(),
            Connection {
                id: id.clone(),
                outbound,
                user_id: None,
                user_name: None,
                authenticated: false,
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Store identity on a connection after the user lookup succeeded.
    /// Returns false if the connection is already gone.
    pub fn mark_authenticated(
        &mut self,
        connection_id: &ConnectionId,
        user_id: UserId,
        user_name: String,
    ) -> bool {
        match self.connections.get_mut(connection_id) {
            Some(conn) => {
                conn.user_id = Some(user_id);
                conn.user_name = Some(user_name);
                conn.authenticated = true;
                true
            }
            None => false,
        }
    }

    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(connection_id)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    /// Record inbound traffic (frames or pongs) for liveness tracking.
    pub fn touch(&mut self, connection_id: &ConnectionId) {
        if let Some(conn) = self.connections.get_mut(connection_id) {
            conn.last_seen = Instant::now();
        }
    }

    /// Connections silent for longer than `timeout`, candidates for reaping.
    pub fn stale_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        let now = Instant::now();
        self.connections
            .values()
            .filter(|c| now.duration_since(c.last_seen) > timeout)
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl AppState {
    /// Register a freshly opened transport connection and acknowledge it
    /// with a `connection` frame.
    pub async fn register_connection(
        &self,
        outbound: mpsc::UnboundedSender<ServerFrame>,
    ) -> ConnectionId {
        let mut registry = self.registry.write().await;
        let connection_id = registry.register(outbound);
        if let Some(conn) = registry.get(&connection_id) {
            conn.send(ServerFrame::Connection {
                connection_id: connection_id.clone(),
            });
        }
        connection_id
    }

    /// Validate `user_id` against the user store and mark the connection
    /// authenticated. Failure leaves the connection usable for retry.
    pub async fn authenticate(
        &self,
        connection_id: &ConnectionId,
        user_id: UserId,
        user_name: String,
    ) -> BrokerResult<ChatUser> {
        if user_id.trim().is_empty() || user_name.trim().is_empty() {
            return Err(BrokerError::Auth(
                "userId and userName are required".to_string(),
            ));
        }

        let user = self
            .users
            .get_user_by_id(&user_id)
            .await?
            .ok_or_else(|| BrokerError::Auth(format!("unknown user {user_id}")))?;

        let mut registry = self.registry.write().await;
        if !registry.mark_authenticated(connection_id, user.id.clone(), user_name.clone()) {
            return Err(BrokerError::Auth("connection is gone".to_string()));
        }

        tracing::info!(%connection_id, user_id = %user.id, "connection authenticated");
        Ok(ChatUser {
            id: user.id,
            name: user_name,
        })
    }

    /// Queue a frame on a connection's outbound channel via the registry,
    /// which holds the only sender. Returns false if the connection has
    /// been unregistered, signalling the socket task to shut down.
    pub async fn send_to_connection(
        &self,
        connection_id: &ConnectionId,
        frame: ServerFrame,
    ) -> bool {
        match self.registry.read().await.get(connection_id) {
            Some(conn) => {
                conn.send(frame);
                true
            }
            None => false,
        }
    }

    /// Refresh a connection's liveness timestamp.
    pub async fn touch(&self, connection_id: &ConnectionId) {
        self.registry.write().await.touch(connection_id);
    }

    /// The authenticated identity behind a connection, or an auth error.
    pub(crate) async fn require_auth(
        &self,
        connection_id: &ConnectionId,
    ) -> BrokerResult<ChatUser> {
        self.registry
            .read()
            .await
            .get(connection_id)
            .filter(|c| c.authenticated)
            .and_then(Connection::chat_user)
            .ok_or_else(|| BrokerError::Auth("not authenticated".to_string()))
    }
}
