//! Liveness monitor — periodic ping sweep that evicts silent peers.
//!
//! DESIGN
//! ======
//! Two-phase mark/check on a fixed interval `T`. Each sweep evicts every
//! connection still marked not-alive from the previous sweep, then clears
//! the flag on the survivors and queues a ping for each. A pong, recorded by
//! the connection's own read loop, sets the flag again.
//!
//! A peer therefore always gets one full interval to answer, and a silent
//! peer is gone at most `2T` after its last pong.
//!
//! Pings are only enqueued. The sweep never waits on socket I/O; a peer that
//! cannot even accept the ping into its queue is simply caught next round.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::registry::Registry;

pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections that were alive and got a fresh ping.
    pub probed: usize,
    /// Connections removed for missing the previous ping.
    pub evicted: usize,
}

/// Run one mark/check round over the registry.
pub fn sweep(registry: &Registry) -> SweepReport {
    let mut unresponsive = Vec::new();
    let mut report = SweepReport::default();

    registry.for_each_all(|conn| {
        if !conn.is_alive() {
            unresponsive.push(conn.id());
            return;
        }
        report.probed += 1;
        if let Err(e) = conn.probe() {
            debug!(conn_id = %conn.id(), error = %e, "liveness: ping not queued");
        }
    });

    // Same removal path as an explicit close; losing the race to it is fine.
    for id in unresponsive {
        if registry.unregister(id) {
            report.evicted += 1;
            info!(conn_id = %id, "liveness: evicted unresponsive peer");
        }
    }

    debug!(probed = report.probed, evicted = report.evicted, "liveness: sweep complete");
    report
}

/// Spawn the liveness monitor. The first sweep runs one `interval` from now.
pub fn spawn_liveness_task(registry: Registry, interval: Duration) -> JoinHandle<()> {
    info!(interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX), "liveness monitor configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sweep(&registry);
        }
    })
}

#[cfg(test)]
#[path = "liveness_test.rs"]
mod tests;
