// ReflexCube - Player Controls
//
// Debounced touch level and encoder detents for menu navigation.  Polled once
// per game tick; neither type touches hardware, the caller passes readings in.

use crate::config::{ENCODER_DETENT_DEGREES, TOUCH_DEBOUNCE_MS};
use crate::events::Turn;
use crate::sensors::filters::angular_delta;

pub struct TouchInput {
    last_raw: bool,
    last_change_ms: u32,
    stable: bool,
}

impl TouchInput {
    pub fn new(now_ms: u32) -> Self {
        Self {
            last_raw: false,
            last_change_ms: now_ms,
            stable: false,
        }
    }

    /// Feed the raw pin level; returns the debounced "touched" state.
    pub fn update(&mut self, raw: bool, now_ms: u32) -> bool {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change_ms = now_ms;
        }
        if now_ms.wrapping_sub(self.last_change_ms) >= TOUCH_DEBOUNCE_MS {
            self.stable = raw;
        }
        self.stable
    }

    pub fn is_down(&self) -> bool {
        self.stable
    }
}

/// Emits one `Turn` per detent of travel since the last emitted detent.
pub struct EncoderDetents {
    baseline: i32,
}

impl EncoderDetents {
    pub fn new(position_degrees: i32) -> Self {
        Self {
            baseline: position_degrees,
        }
    }

    pub fn poll(&mut self, position_degrees: i32) -> Option<Turn> {
        let delta = angular_delta(self.baseline, position_degrees);
        let turn = if delta >= ENCODER_DETENT_DEGREES {
            Turn::Clockwise
        } else if delta <= -ENCODER_DETENT_DEGREES {
            Turn::CounterClockwise
        } else {
            return None;
        };
        self.baseline = position_degrees;
        log::debug!("Encoder detent {:?} at {} deg", turn, position_degrees);
        Some(turn)
    }

    pub fn rebaseline(&mut self, position_degrees: i32) {
        self.baseline = position_degrees;
    }
}
