use crate::outbox::{Enqueued, Outbox};
use axum::extract::ws::Utf8Bytes;
use log::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// Type alias for user IDs (web layer converts domain::Id to String)
pub type UserId = String;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-side view of a registered connection: its identity and the outbox
/// the hub fills for it.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: UserId,
    outbox: Arc<Outbox>,
}

impl ConnectionHandle {
    pub(crate) fn new(user_id: UserId, outbox_capacity: usize) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            outbox: Arc::new(Outbox::new(outbox_capacity)),
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }
}

/// Per-connection counters as seen by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    pub user_id: UserId,
    /// Frames waiting in the outbox.
    pub queued: usize,
    /// Frames evicted by the overflow policy.
    pub dropped: u64,
}

/// Connection information (no redundant connection_id)
#[derive(Debug)]
pub(crate) struct ConnectionInfo {
    pub(crate) user_id: UserId,
    pub(crate) outbox: Arc<Outbox>,
}

/// Tally of one fan-out pass over the registry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FanOut {
    pub(crate) delivered: u64,
    pub(crate) evicted: u64,
    pub(crate) closed: u64,
}

/// The set of live connections. Owned and mutated only by the hub
/// coordinator, so it needs no interior locking.
#[derive(Default)]
pub(crate) struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionInfo>,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Returns `false` and leaves the existing entry alone
    /// if the id is already present.
    pub(crate) fn insert(&mut self, connection_id: ConnectionId, info: ConnectionInfo) -> bool {
        if self.connections.contains_key(&connection_id) {
            return false;
        }
        self.connections.insert(connection_id, info);
        true
    }

    pub(crate) fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionInfo> {
        self.connections.remove(connection_id)
    }

    pub(crate) fn get(&self, connection_id: &ConnectionId) -> Option<&ConnectionInfo> {
        self.connections.get(connection_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    /// Enqueue the frame on every live connection - O(n). Never waits on a connection.
    pub(crate) fn broadcast(&self, frame: &Utf8Bytes) -> FanOut {
        let mut fan_out = FanOut::default();

        for (connection_id, info) in self.connections.iter() {
            match info.outbox.push(frame.clone()) {
                Enqueued::Queued => fan_out.delivered += 1,
                Enqueued::EvictedOldest => {
                    fan_out.delivered += 1;
                    fan_out.evicted += 1;

                    let dropped = info.outbox.dropped();
                    if dropped == 1 || dropped % 100 == 0 {
                        warn!(
                            "Connection {connection_id} (user {}) is falling behind; {dropped} event(s) dropped so far",
                            info.user_id
                        );
                    }
                }
                Enqueued::Closed => {
                    // The writer has already gone; its unregister is on the way.
                    fan_out.closed += 1;
                    debug!("Skipping closed outbox for connection {connection_id}");
                }
            }
        }

        fan_out
    }

    /// Closes every outbox and empties the registry. Returns how many were closed.
    pub(crate) fn close_all(&mut self) -> usize {
        let count = self.connections.len();
        for (_, info) in self.connections.drain() {
            info.outbox.close();
        }
        count
    }
}
