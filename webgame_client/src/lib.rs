//! `webgame_client`
//!
//! The client core:
//! - A session context driving the handshake state machine and routing
//!   server traffic (`session`).
//! - An entity registry mirroring authoritative world state (`entity`).
//! - Dead-reckoning between server updates (`movement`).
//! - An outbound order queue with paced flushing (`orders`).
//! - Seams for the host application's input and rendering (`input`,
//!   `render`).
//! - An async shell owning the socket (`client`).

pub mod client;
pub mod entity;
pub mod input;
pub mod movement;
pub mod orders;
pub mod render;
pub mod session;

pub use client::GameClient;
pub use session::{ConnectionState, Session};
