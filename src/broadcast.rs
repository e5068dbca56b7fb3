//! Room fan-out and connection liveness.

use crate::protocol::ServerFrame;
use crate::state::AppState;
use crate::types::{ConnectionId, EventId};
use std::sync::Arc;

impl AppState {
    /// Deliver a frame to every current member of an event's room, except
    /// `exclude` if given.
    ///
    /// Delivery is a snapshot of the member set at call time: rooms with no
    /// subscribers silently drop the frame, and nothing is buffered for
    /// absent members.
    pub async fn broadcast_to_room(
        &self,
        event_id: &EventId,
        frame: ServerFrame,
        exclude: Option<&ConnectionId>,
    ) {
        let members = self.rooms.read().await.members(event_id);
        if members.is_empty() {
            return;
        }

        let registry = self.registry.read().await;
        let mut delivered = 0usize;
        for connection_id in &members {
            if Some(connection_id) == exclude {
                continue;
            }
            if let Some(conn) = registry.get(connection_id) {
                conn.send(frame.clone());
                delivered += 1;
            }
        }
        tracing::trace!(%event_id, delivered, "room broadcast");
    }
}

/// Spawn a background task that reaps connections which stopped answering
/// pings, so half-closed sockets cannot grow the registry and room tables
/// without bound.
pub fn spawn_liveness_reaper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state.config.heartbeat_interval);
        loop {
            interval.tick().await;

            let stale = state
                .registry
                .read()
                .await
                .stale_connections(state.config.heartbeat_timeout);

            for connection_id in stale {
                tracing::warn!(%connection_id, "reaping unresponsive connection");
                // Same cleanup path as a normal disconnect; closing the
                // outbound channel ends the socket task as well
                state.disconnect(&connection_id).await;
            }
        }
    });
}
