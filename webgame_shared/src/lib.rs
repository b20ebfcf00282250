//! `webgame_shared`
//!
//! Libraries shared by the client crates.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (math, protocol, net, config).
//! - Value semantics for math types; no hidden mutation.
//! - No `unsafe`.

pub mod config;
pub mod math;
pub mod net;
pub mod protocol;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::math::*;
    pub use crate::net::*;
    pub use crate::protocol::*;
}
