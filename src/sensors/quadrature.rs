// ReflexCube - Quadrature Decoder
//
// Turns the two out-of-phase encoder channels into a bounded rotation count.
// `on_edge` runs in the GPIO interrupt for the channel that changed; the
// position getters run in the game loop.  Every field is an atomic so the
// loop can read while an edge is being handled without masking interrupts.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::config::ENCODER_COUNTS_PER_REV;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

/// Last-known and freshly-sampled level of one channel.
struct ChannelState {
    previous: AtomicBool,
    current: AtomicBool,
}

impl ChannelState {
    const fn idle() -> Self {
        // Both channels idle HIGH on the encoder's pull-ups.
        Self {
            previous: AtomicBool::new(true),
            current: AtomicBool::new(true),
        }
    }

    fn reset(&self) {
        self.previous.store(true, Ordering::Relaxed);
        self.current.store(true, Ordering::Relaxed);
    }
}

pub struct QuadratureDecoder {
    count: AtomicI32,
    a: ChannelState,
    b: ChannelState,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self {
            count: AtomicI32::new(0),
            a: ChannelState::idle(),
            b: ChannelState::idle(),
        }
    }

    /// Feed one edge of `channel`.  Must not be re-entered for the same
    /// decoder; the interrupt controller serialises the two channel ISRs.
    pub fn on_edge(&self, channel: Channel, level: bool) {
        let (this, other) = match channel {
            Channel::A => (&self.a, &self.b),
            Channel::B => (&self.b, &self.a),
        };

        this.current.store(level, Ordering::Relaxed);
        if this.previous.load(Ordering::Relaxed) == level {
            // Bounce or a repeated interrupt: nothing moved.
            return;
        }

        let other_level = other.previous.load(Ordering::Relaxed);
        let step = match channel {
            // A rising while B is high (or falling while B is low) is CCW.
            Channel::A => {
                if level == other_level {
                    -1
                } else {
                    1
                }
            }
            // B rising while A is high (or falling while A is low) is CW.
            Channel::B => {
                if level == other_level {
                    1
                } else {
                    -1
                }
            }
        };
        this.previous.store(level, Ordering::Relaxed);
        self.apply_step(step);
    }

    /// Add one step as a single read-modify-write, so a concurrent `reset`
    /// from the other core is never overwritten with a stale count.
    fn apply_step(&self, step: i32) {
        let _ = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                let next = count + step;
                // A full turn resets to zero; it never rolls to the opposite sign.
                Some(if next.abs() >= ENCODER_COUNTS_PER_REV { 0 } else { next })
            });
    }

    /// Current count, always within (-96, 96).
    pub fn count(&self) -> i32 {
        self.count.load(Ordering::Acquire)
    }

    pub fn position_degrees(&self) -> i32 {
        self.count() * 360 / ENCODER_COUNTS_PER_REV
    }

    /// Re-baseline: zero the count and put both channels back to idle.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
        self.a.reset();
        self.b.reset();
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
