//! Math types.
//!
//! This module intentionally stays small and deterministic.
//! Every operation returns a new value; nothing mutates its arguments.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Vector lengths at or below this are treated as zero.
pub const EPSILON: f32 = 1e-6;

/// 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// World "up" axis, used as the reference for facing rotations.
    pub const UP: Self = Self { x: 0.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Returns a unit vector with this heading, or zero for a zero input.
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length <= EPSILON {
            Self::ZERO
        } else {
            self * (1.0 / length)
        }
    }

    pub fn distance(self, rhs: Self) -> f32 {
        (self - rhs).length()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Facing rotation as a (cosine, sine) pair.
///
/// Derived from a heading vector rather than an angle, so the renderer can
/// consume it directly without a trigonometric round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub cos: f32,
    pub sin: f32,
}

impl Rotation {
    /// Identity facing, pointing along [`Vec2::UP`].
    pub const FACING_UP: Self = Self { cos: 1.0, sin: 0.0 };

    /// Derives the facing for `dir`.
    ///
    /// The cosine is the normalized dot product with the up axis; the sine
    /// is recovered from it, mirrored for left-pointing headings. Returns
    /// `None` when `dir` is too short to define a facing.
    pub fn from_direction(dir: Vec2) -> Option<Self> {
        if dir.length() <= EPSILON {
            return None;
        }
        let cos = dir.normalize().dot(Vec2::UP);
        let mut sin = (1.0 - cos * cos).max(0.0).sqrt();
        if dir.x < 0.0 {
            sin = -sin;
        }
        Some(Self { cos, sin })
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::FACING_UP
    }
}
