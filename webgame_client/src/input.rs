//! Input seam.
//!
//! The host polls its input devices and hands the core one sample per
//! tick; the core never talks to device APIs. Coordinates arrive in
//! screen space and are translated through a [`ScreenMapper`].

use webgame_shared::math::Vec2;

/// One tick's worth of player input, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSample {
    /// The continuous "move toward cursor" control is held.
    pub move_held: bool,
    /// One-shot "move to this point" click, consumed this tick.
    pub move_to_click: Option<Vec2>,
    /// Current cursor position.
    pub cursor: Vec2,
}

/// Translates screen coordinates into world coordinates.
pub trait ScreenMapper: Send {
    fn to_world(&self, screen: Vec2) -> Vec2;
}

/// Passes coordinates through unchanged. Default for headless runs.
#[derive(Debug, Default)]
pub struct IdentityMapper;

impl ScreenMapper for IdentityMapper {
    fn to_world(&self, screen: Vec2) -> Vec2 {
        screen
    }
}
