// ReflexCube - Ultrasonic Echo Rangefinder
//
// The echo pin interrupt calls `on_edge` on both edges; the game loop calls
// the `consume_*` accessors.  The flight time is computed inside the edge
// handler and published as a single atomic word, so the consumer can never
// observe a rise timestamp from one pulse paired with a fall from another.
//
// Triggering is independent of echo reception: `TriggerCycle` is advanced by
// a hardware timer and fires the next ping whether or not the last one came
// back, so a lost echo only leaves the previous reading in place.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::{SOUND_VELOCITY, TRIGGER_PULSE_US, TRIGGER_WAIT_US};

pub struct EchoRangefinder {
    rise_us: AtomicU32,
    /// Set by a rising edge, consumed by the matching falling edge.
    rise_seen: AtomicBool,
    pending_flight_us: AtomicU32,
    echo_ready: AtomicBool,
    /// Last flight time handed to a consumer.
    cached_flight_us: AtomicU32,
}

impl EchoRangefinder {
    pub const fn new() -> Self {
        Self {
            rise_us: AtomicU32::new(0),
            rise_seen: AtomicBool::new(false),
            pending_flight_us: AtomicU32::new(0),
            echo_ready: AtomicBool::new(false),
            cached_flight_us: AtomicU32::new(0),
        }
    }

    /// Edge handler.  `now_us` is the free-running microsecond counter; only
    /// differences of it are ever used, so wrap-around is harmless.
    pub fn on_edge(&self, level: bool, now_us: u32) {
        if level {
            self.rise_us.store(now_us, Ordering::Relaxed);
            self.rise_seen.store(true, Ordering::Relaxed);
            return;
        }

        // A fall with no rise of its own (power-on, missed interrupt) is dropped.
        if !self.rise_seen.swap(false, Ordering::Relaxed) {
            return;
        }
        let flight = now_us.wrapping_sub(self.rise_us.load(Ordering::Relaxed));
        self.pending_flight_us.store(flight, Ordering::Release);
        self.echo_ready.store(true, Ordering::Release);
    }

    /// Echo pulse width in microseconds.  Returns the newest completed echo
    /// once, then keeps returning it until another echo completes.
    pub fn consume_time_of_flight(&self) -> u32 {
        if self.echo_ready.swap(false, Ordering::Acquire) {
            let flight = self.pending_flight_us.load(Ordering::Acquire);
            self.cached_flight_us.store(flight, Ordering::Relaxed);
        }
        self.cached_flight_us.load(Ordering::Relaxed)
    }

    /// Distance in millimetres, same freshness rules as the flight time.
    /// 0 means no echo has completed yet.
    pub fn consume_distance_mm(&self) -> u32 {
        distance_mm(self.consume_time_of_flight())
    }

    /// Whether a completed echo is waiting to be consumed.
    pub fn echo_ready(&self) -> bool {
        self.echo_ready.load(Ordering::Acquire)
    }
}

impl Default for EchoRangefinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Round-trip time to one-way distance.  Sound covers 0.34 mm/µs; the pulse
/// covers the distance twice, hence the division by 200 on a velocity of 34.
pub fn distance_mm(flight_us: u32) -> u32 {
    flight_us.saturating_mul(SOUND_VELOCITY) / 200
}

// ---------------------------------------------------------------------------
// Trigger timing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    Trigger,
    Wait,
}

/// What to do on one timer expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerStep {
    pub pin_high: bool,
    pub next_in_us: u64,
}

/// Two-phase trigger sequencer: a short HIGH pulse, then a long LOW window
/// in which the echo can return.
pub struct TriggerCycle {
    phase: TriggerPhase,
}

impl TriggerCycle {
    pub const fn new() -> Self {
        Self {
            phase: TriggerPhase::Wait,
        }
    }

    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    pub fn on_expiry(&mut self) -> TriggerStep {
        match self.phase {
            TriggerPhase::Trigger => {
                self.phase = TriggerPhase::Wait;
                TriggerStep {
                    pin_high: true,
                    next_in_us: TRIGGER_PULSE_US,
                }
            }
            TriggerPhase::Wait => {
                self.phase = TriggerPhase::Trigger;
                TriggerStep {
                    pin_high: false,
                    next_in_us: TRIGGER_WAIT_US,
                }
            }
        }
    }
}

impl Default for TriggerCycle {
    fn default() -> Self {
        Self::new()
    }
}
