//! `worldsync_shared`
//!
//! Types and plumbing shared by the sync client and its test harness.
//!
//! Design goals:
//! - Wire types describe exactly what the server sends per tick.
//! - Collaborators (scene graph, transport) sit behind traits.
//! - No `unsafe`.

pub mod config;
pub mod console;
pub mod event;
pub mod math;
pub mod net;
pub mod protocol;
pub mod render;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::math::*;
    pub use crate::net::*;
    pub use crate::protocol::*;
}
