//! WebSocket handler — upgrade, register, relay.
//!
//! DESIGN
//! ======
//! On upgrade, the connection is registered and the socket is split:
//! - Reader (this task) → payloads fanned out to every other peer, pongs
//!   recorded in the registry
//! - Writer (spawned) → peer payloads and liveness pings from the outbound
//!   queue written to the socket
//!
//! Reads never wait behind a write, so a peer's pongs are recorded even while
//! its socket is backed up. The registry holds the connection's termination
//! token. When the liveness monitor evicts the connection the token fires and
//! both halves stop at once, including a write stuck on a peer that stopped
//! reading.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register, get a fresh `ConnectionId`
//! 2. Relay until the peer closes, the transport fails, or eviction
//! 3. Evicted → writer sends a close frame (bounded by `CLOSE_TIMEOUT`);
//!    otherwise the writer is aborted
//! 4. Unregister (idempotent with eviction) → socket dropped

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::payload::{Outbound, Payload};
use crate::registry::{ConnectionId, PeerChannel};
use crate::services::broadcast;
use crate::state::AppState;

type WsSink = SplitSink<WebSocket, Message>;

/// Longest an evicted peer's close frame may hold up teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    /// Peer sent a close frame or the stream ended.
    Closed,
    /// Reading from the socket failed.
    ReadFailed,
    /// Writing to the socket failed.
    WriteFailed,
    /// Removed from the registry by the liveness monitor.
    Evicted,
}

// =============================================================================
// UPGRADE
// =============================================================================

/// Requests without a valid upgrade handshake are rejected by the extractor
/// before this runs, so nothing is registered for them.
pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_failed_upgrade(|e| warn!(error = %e, "ws: upgrade failed"))
        .on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(socket: WebSocket, state: AppState) {
    let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound>(state.outbound_capacity);
    let terminate = CancellationToken::new();
    let conn_id = state.registry.register(PeerChannel::new(outbound_tx, terminate.clone()));

    info!(%conn_id, peers = state.registry.len(), "ws: peer connected");

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(write_outbound(conn_id, sink, outbound_rx, terminate.clone()));
    let mut writer_done = false;

    let reason = loop {
        tokio::select! {
            () = terminate.cancelled() => break Disconnect::Evicted,
            written = &mut writer => {
                writer_done = true;
                break match written {
                    // The writer only stops cleanly once the token has fired.
                    Ok(Ok(())) => Disconnect::Evicted,
                    Ok(Err(e)) => {
                        warn!(%conn_id, error = %e, "ws: send failed");
                        Disconnect::WriteFailed
                    }
                    Err(e) => {
                        warn!(%conn_id, error = %e, "ws: writer task failed");
                        Disconnect::WriteFailed
                    }
                };
            }
            msg = stream.next() => {
                let Some(msg) = msg else { break Disconnect::Closed };
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(%conn_id, error = %e, "ws: receive failed");
                        break Disconnect::ReadFailed;
                    }
                };
                if handle_inbound(&state, conn_id, msg).is_break() {
                    break Disconnect::Closed;
                }
            }
        }
    };

    if !writer_done {
        if reason == Disconnect::Evicted {
            // Returns once the close frame is out or CLOSE_TIMEOUT passes.
            if let Err(e) = writer.await {
                warn!(%conn_id, error = %e, "ws: writer task failed");
            }
        } else {
            writer.abort();
        }
    }

    state.registry.unregister(conn_id);

    info!(%conn_id, ?reason, peers = state.registry.len(), "ws: peer disconnected");
}

/// Drain the outbound queue into the socket until the token fires or a write
/// fails. A fired token interrupts a pending write.
async fn write_outbound(
    conn_id: ConnectionId,
    mut sink: WsSink,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    terminate: CancellationToken,
) -> Result<(), axum::Error> {
    loop {
        let item = tokio::select! {
            biased;
            () = terminate.cancelled() => break,
            item = outbound_rx.recv() => item,
        };
        let Some(item) = item else { break };
        tokio::select! {
            biased;
            () = terminate.cancelled() => break,
            sent = sink.send(item.into()) => sent?,
        }
    }

    let frame = CloseFrame { code: close_code::AWAY, reason: "liveness timeout".into() };
    match timeout(CLOSE_TIMEOUT, sink.send(Message::Close(Some(frame)))).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(%conn_id, error = %e, "ws: close frame not delivered"),
        Err(_) => debug!(%conn_id, "ws: close frame timed out"),
    }
    Ok(())
}

/// Apply one inbound message. Breaks when the peer asked to close.
fn handle_inbound(state: &AppState, conn_id: ConnectionId, msg: Message) -> ControlFlow<()> {
    match msg {
        Message::Close(_) => return ControlFlow::Break(()),
        Message::Pong(_) => {
            state.registry.mark_alive(conn_id);
        }
        // Pings from the peer are answered by the transport.
        Message::Ping(_) => {}
        msg @ (Message::Text(_) | Message::Binary(_)) => {
            if let Some(payload) = Payload::from_message(msg) {
                broadcast::forward(&state.registry, conn_id, &payload);
            }
        }
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
