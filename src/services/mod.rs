//! Relay services used by the websocket route and the process entry point.
//!
//! ARCHITECTURE
//! ============
//! `broadcast` is called from every connection task on each inbound payload.
//! `liveness` runs as one background task for the whole process. Both touch
//! shared state only through the `Registry` API.

pub mod broadcast;
pub mod liveness;
