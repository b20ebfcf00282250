//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! A host renderer reads everything it needs (position, rotation, asset)
//! off the registry; the core only fixes the draw order.

use webgame_shared::math::Vec2;

use crate::entity::{EntityKind, EntityRegistry, EntityState};

/// Presentation focus, set to the player's position when the handshake
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub focus: Vec2,
}

/// A minimal drawing API.
pub trait Renderer: Send + Sync {
    fn draw(&mut self, state: &EntityState, camera: &Camera);
}

/// A no-op renderer useful for headless runs.
#[derive(Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _state: &EntityState, _camera: &Camera) {}
}

/// Draws the whole registry: entities of the object family first, then
/// everyone else on top of them. A presentation ordering only; the
/// registry itself guarantees no iteration order.
pub fn render_world(registry: &EntityRegistry, camera: &Camera, renderer: &mut dyn Renderer) {
    for state in registry.iter().filter(|s| s.kind == EntityKind::Object) {
        renderer.draw(state, camera);
    }
    for state in registry.iter().filter(|s| s.kind != EntityKind::Object) {
        renderer.draw(state, camera);
    }
}
