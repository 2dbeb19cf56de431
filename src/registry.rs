//! Connection registry — the set of live peer connections.
//!
//! DESIGN
//! ======
//! A single `std::sync::Mutex` guards both the membership map and every
//! connection's `alive` flag. All operations are synchronous and never
//! await while holding the lock, so the guard is safe to use from async
//! tasks and the per-connection and liveness paths serialize cleanly.
//!
//! Each `Connection` owns its peer's `PeerChannel`: the only `Sender` for the
//! outbound queue plus a drop guard on the peer's termination token. Removing
//! the entry drops both. The token fires at once, so the peer's task stops
//! even while a socket write is stuck on a peer that no longer reads.
//! Removal and close therefore cannot happen one without the other.
//!
//! IDs come from a counter that only moves forward inside the lock, so an ID
//! is never handed out twice even after its connection is gone.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::SendError;
use crate::payload::Outbound;

// =============================================================================
// CONNECTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the registry holds for one peer: its outbound queue and the switch
/// that ends the peer's task.
pub struct PeerChannel {
    outbound: mpsc::Sender<Outbound>,
    _terminate: DropGuard,
}

impl PeerChannel {
    /// `terminate` is cancelled when the channel is dropped, i.e. when the
    /// connection leaves the registry.
    #[must_use]
    pub fn new(outbound: mpsc::Sender<Outbound>, terminate: CancellationToken) -> Self {
        Self { outbound, _terminate: terminate.drop_guard() }
    }
}

/// A bare queue, for callers with no task to stop.
impl From<mpsc::Sender<Outbound>> for PeerChannel {
    fn from(outbound: mpsc::Sender<Outbound>) -> Self {
        Self::new(outbound, CancellationToken::new())
    }
}

/// One peer's registered channel plus its liveness flag.
pub struct Connection {
    id: ConnectionId,
    channel: PeerChannel,
    alive: bool,
}

impl Connection {
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Queue work for this peer without waiting on its socket.
    ///
    /// # Errors
    ///
    /// Returns `SendError::Full` if the peer's queue is saturated and
    /// `SendError::Closed` if its writer has already gone away.
    pub fn send(&self, outbound: Outbound) -> Result<(), SendError> {
        self.channel.outbound.try_send(outbound).map_err(SendError::from)
    }

    /// Clear the alive flag and queue a ping. The flag comes back only when
    /// the peer's pong is recorded through `Registry::mark_alive`.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`]. The flag is cleared either way.
    pub fn probe(&mut self) -> Result<(), SendError> {
        self.alive = false;
        self.send(Outbound::Probe)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Shared handle to the connection set. Clones refer to the same set.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    /// Last ID handed out. Zero means none yet.
    last_id: u64,
    /// BTreeMap keeps iteration in registration order.
    connections: BTreeMap<ConnectionId, Connection>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new live connection that owns `channel` and return its ID.
    pub fn register(&self, channel: impl Into<PeerChannel>) -> ConnectionId {
        let channel = channel.into();
        let mut inner = self.lock();
        inner.last_id += 1;
        let id = ConnectionId(inner.last_id);
        inner.connections.insert(id, Connection { id, channel, alive: true });
        id
    }

    /// Remove a connection, closing its outbound channel and firing its
    /// termination token.
    ///
    /// Returns `false` if it was already gone; calling this more than once for
    /// the same ID is expected when close and eviction race.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.lock().connections.remove(&id);
        // Sender and guard drop here, after the lock is released.
        removed.is_some()
    }

    /// Record a probe acknowledgment. Returns `false` for unknown IDs.
    pub fn mark_alive(&self, id: ConnectionId) -> bool {
        match self.lock().connections.get_mut(&id) {
            Some(conn) => {
                conn.alive = true;
                true
            }
            None => false,
        }
    }

    /// Call `f` for every registered connection except `id`, in registration
    /// order. The set cannot change while `f` runs.
    pub fn for_each_except<F>(&self, id: ConnectionId, mut f: F)
    where
        F: FnMut(&Connection),
    {
        let inner = self.lock();
        for conn in inner.connections.values().filter(|c| c.id != id) {
            f(conn);
        }
    }

    /// Call `f` for every registered connection, in registration order.
    pub fn for_each_all<F>(&self, mut f: F)
    where
        F: FnMut(&mut Connection),
    {
        let mut inner = self.lock();
        for conn in inner.connections.values_mut() {
            f(conn);
        }
    }

    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().connections.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().connections.is_empty()
    }

    /// Snapshot of registered IDs in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.lock().connections.keys().copied().collect()
    }

    /// Live clones of this handle, including `self`.
    #[cfg(test)]
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
