use std::time::{Duration, Instant};

use crate::sortable::geometry::{Point, Rect};
use crate::storage::DragConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Timing model for scrolling while the pointer rests near an edge.
///
/// Every elapsed delay yields one step, and the delay then shrinks by the
/// acceleration factor down to a floor. Leaving the band resets it.
#[derive(Debug, Clone)]
pub struct AutoScroller {
    band_px: f64,
    step_px: f64,
    initial_delay: Duration,
    min_delay: Duration,
    acceleration: f64,
    direction: Option<ScrollDirection>,
    delay: Duration,
    last_step: Option<Instant>,
}

impl AutoScroller {
    pub fn new(config: &DragConfig) -> Self {
        let initial_delay = Duration::from_millis(config.scroll_initial_delay_ms);
        Self {
            band_px: config.scroll_band_px,
            step_px: config.scroll_step_px,
            initial_delay,
            min_delay: Duration::from_millis(config.scroll_min_delay_ms),
            acceleration: config.scroll_acceleration.clamp(0.0, 1.0),
            direction: None,
            delay: initial_delay,
            last_step: None,
        }
    }

    /// Recompute the direction for `pointer` inside `container`.
    pub fn update(&mut self, pointer: Point, container: Rect, now: Instant) -> Option<ScrollDirection> {
        let inside_x = pointer.x >= container.left() && pointer.x <= container.right();
        let direction = if !inside_x {
            None
        } else if pointer.y >= container.top() && pointer.y < container.top() + self.band_px {
            Some(ScrollDirection::Up)
        } else if pointer.y <= container.bottom() && pointer.y > container.bottom() - self.band_px {
            Some(ScrollDirection::Down)
        } else {
            None
        };

        if direction != self.direction {
            self.direction = direction;
            self.delay = self.initial_delay;
            self.last_step = direction.map(|_| now);
        }
        direction
    }

    /// Scroll delta due at `now`: negative scrolls up.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let direction = self.direction?;
        let last = self.last_step?;
        if now.saturating_duration_since(last) < self.delay {
            return None;
        }
        self.last_step = Some(now);
        let next = (self.delay.as_nanos() as f64 * self.acceleration).round() as u64;
        self.delay = Duration::from_nanos(next).max(self.min_delay);
        Some(match direction {
            ScrollDirection::Up => -self.step_px,
            ScrollDirection::Down => self.step_px,
        })
    }

    pub fn stop(&mut self) {
        self.direction = None;
        self.delay = self.initial_delay;
        self.last_step = None;
    }

    pub fn direction(&self) -> Option<ScrollDirection> {
        self.direction
    }

    pub fn current_delay(&self) -> Duration {
        self.delay
    }
}
