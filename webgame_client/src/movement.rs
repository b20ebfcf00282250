//! Dead-reckoning.
//!
//! Every entity advances along its last-known heading until the next
//! authoritative update overwrites its position outright. There is no
//! blending toward corrections.

use webgame_shared::math::Rotation;

use crate::entity::{EntityRegistry, EntityState};

/// Advances one entity by `dt` and refreshes its facing while it moves.
pub fn advance(state: &mut EntityState, dt: f32) {
    state.position = state.position + state.direction * (state.speed * dt);
    if let Some(rotation) = Rotation::from_direction(state.direction) {
        state.rotation = rotation;
    }
}

/// Advances every registered entity, the local player included.
pub fn advance_all(registry: &mut EntityRegistry, dt: f32) {
    for state in registry.iter_mut() {
        advance(state, dt);
    }
}
