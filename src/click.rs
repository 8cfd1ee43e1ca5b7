// SPDX-License-Identifier: MPL-2.0

//! Double-click detection
//!
//! Explicit two-state machine with an `Instant` deadline: the first click
//! arms a window equal to the double-click interval, a second click inside
//! that window is a double-click, and a click after the deadline re-arms as
//! a new first click. Deterministic because the instant is passed in.

use std::time::{Duration, Instant};

/// Window within which a second click counts as a double-click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// First click of a potential pair; the window is now armed.
    First,
    /// Second click inside the window.
    Double,
}

#[derive(Debug)]
pub struct DoubleClickDetector {
    /// `Some(deadline)` while awaiting a second click, `None` when idle.
    armed_until: Option<Instant>,
    window: Duration,
}

impl DoubleClickDetector {
    pub fn new(window: Duration) -> Self {
        Self {
            armed_until: None,
            window,
        }
    }

    pub fn click(&mut self, now: Instant) -> ClickOutcome {
        match self.armed_until {
            Some(deadline) if now < deadline => {
                self.armed_until = None;
                ClickOutcome::Double
            }
            _ => {
                self.armed_until = Some(now + self.window);
                ClickOutcome::First
            }
        }
    }
}

impl Default for DoubleClickDetector {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_WINDOW)
    }
}
