//! Websocket relay: every payload a peer sends is forwarded, unchanged, to
//! every other connected peer. Silent peers are found with ping/pong and
//! evicted.

pub mod config;
pub mod error;
pub mod payload;
pub mod registry;
pub mod routes;
pub mod services;
pub mod state;
