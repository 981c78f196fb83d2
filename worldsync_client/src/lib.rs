//! `worldsync_client`
//!
//! Client-side state synchronization:
//! - Object pool with a per-category index
//! - Game object contract and the concrete per-category objects
//! - Interpolation between authoritative samples
//! - Update reconciliation of per-tick world deltas
//! - Session state machine and the async connection driver

pub mod ancillary;
pub mod client;
pub mod interp;
pub mod notify;
pub mod object;
pub mod objects;
pub mod pool;
pub mod session;
pub mod settings;
pub mod timer;
pub mod world;

pub use client::GameClient;
