//! Broadcast forwarder — fan one inbound payload out to every other peer.
//!
//! DESIGN
//! ======
//! Forwarding only enqueues. Each destination has its own bounded outbound
//! queue drained by its own connection task, so a slow or broken peer never
//! stalls delivery to the rest. A failed enqueue is logged and counted, then
//! skipped; the broken peer is reaped later by its own close path or by the
//! liveness monitor.

use tracing::{debug, warn};

use crate::payload::{Outbound, Payload};
use crate::registry::{ConnectionId, Registry};

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardReport {
    /// Peers whose queue accepted the payload.
    pub delivered: usize,
    /// Peers whose queue was full or closed.
    pub dropped: usize,
}

/// Forward `payload` unchanged to every registered connection except `from`.
pub fn forward(registry: &Registry, from: ConnectionId, payload: &Payload) -> ForwardReport {
    let mut report = ForwardReport::default();
    registry.for_each_except(from, |peer| match peer.send(Outbound::Payload(payload.clone())) {
        Ok(()) => report.delivered += 1,
        Err(e) => {
            report.dropped += 1;
            warn!(from = %from, to = %peer.id(), error = %e, "broadcast: send to peer failed");
        }
    });
    debug!(
        from = %from,
        bytes = payload.len(),
        delivered = report.delivered,
        dropped = report.dropped,
        "broadcast: forwarded payload"
    );
    report
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
