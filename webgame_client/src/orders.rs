//! Order queue.
//!
//! Pending intent messages for the local player. Orders accumulate in
//! strict FIFO order and go out in batches on a fixed cadence, so the
//! server observes them in the order the player produced them.

use std::collections::VecDeque;

use webgame_shared::math::Vec2;
use webgame_shared::protocol::Action;

/// Accumulated simulation time between flushes.
pub const FLUSH_INTERVAL: f32 = 0.1;

/// FIFO queue of orders waiting for the next flush.
#[derive(Debug)]
pub struct OrderQueue {
    pending: VecDeque<Action>,
    since_flush: f32,
}

impl OrderQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            // Already due, so the first flush happens immediately.
            since_flush: FLUSH_INTERVAL,
        }
    }

    pub fn push_change_speed(&mut self, speed: f32) {
        self.pending.push_back(Action::ChangeSpeed { speed });
    }

    pub fn push_change_dir(&mut self, dir: Vec2) {
        self.pending.push_back(Action::ChangeDir { dir });
    }

    pub fn push_move_to(&mut self, target_pos: Vec2) {
        self.pending.push_back(Action::MoveTo { target_pos });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Accumulates `dt` and, once a flush is due and the connection is
    /// synchronized, drains every pending order in FIFO order.
    ///
    /// While not synchronized nothing is drained and the cadence is not
    /// reset; queued orders wait. The cadence resets whenever a flush
    /// actually runs, even with an empty queue.
    pub fn flush(&mut self, dt: f32, synchronized: bool) -> Vec<Action> {
        self.since_flush += dt;
        if !synchronized || self.since_flush < FLUSH_INTERVAL {
            return Vec::new();
        }
        self.since_flush = 0.0;
        self.pending.drain(..).collect()
    }
}

impl Default for OrderQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns input samples into queued orders.
///
/// Tracks whether a held move is active and the last direction actually
/// sent, so identical samples do not queue duplicate direction changes.
/// It never touches entity state; the mirror only changes through
/// snapshots and prediction.
#[derive(Debug, Default)]
pub struct IntentTracker {
    moving: bool,
    last_dir: Option<Vec2>,
}

impl IntentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one tick of input for a player standing at `position`.
    /// `cursor_world` and `move_to` are already translated to world
    /// coordinates.
    pub fn apply(
        &mut self,
        move_held: bool,
        cursor_world: Vec2,
        move_to: Option<Vec2>,
        position: Vec2,
        queue: &mut OrderQueue,
    ) {
        if move_held {
            let dir = cursor_world - position;
            if !self.moving {
                self.moving = true;
                queue.push_change_speed(1.0);
                queue.push_change_dir(dir);
                self.last_dir = Some(dir);
            } else if self.last_dir != Some(dir) {
                queue.push_change_dir(dir);
                self.last_dir = Some(dir);
            }
        } else if self.moving {
            self.moving = false;
            queue.push_change_speed(0.0);
        }

        if let Some(target) = move_to {
            queue.push_change_speed(1.0);
            queue.push_move_to(target);
        }
    }
}
