// ReflexCube - Activation Filters
//
// Each filter turns a continuous or noisy reading into a one-cycle "the
// player did it" flag.  Filters keep their own memory between calls and only
// advance when they are polled, so a signal that is already held when polling
// starts does not count until it is released and applied again.

use crate::config::{
    FACE_UP_THRESHOLD, FLEX_BENT_BELOW, PIEZO_SHOCK_ABOVE, ROTARY_ACTIVATION_DEGREES,
    ULTRASONIC_NEAR_BELOW_MM,
};
use crate::events::{AccelSample, SensorKind};

// ---------------------------------------------------------------------------
// Rising edge
// ---------------------------------------------------------------------------

/// One-shot low-to-high detector shared by the touch, infrared, flex,
/// ultrasonic and piezo sensors.
#[derive(Debug, Default, Clone)]
pub struct EdgeFilter {
    previous: bool,
}

impl EdgeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activated(&mut self, current: bool) -> bool {
        let rising = current && !self.previous;
        self.previous = current;
        rising
    }
}

pub fn flex_bent(raw: u16) -> bool {
    raw < FLEX_BENT_BELOW
}

pub fn piezo_shocked(raw: u16) -> bool {
    raw > PIEZO_SHOCK_ABOVE
}

/// A cached distance of 0 means no echo has completed yet, which is never "near".
pub fn ultrasonic_near(distance_mm: u32) -> bool {
    distance_mm > 0 && distance_mm < ULTRASONIC_NEAR_BELOW_MM
}

// ---------------------------------------------------------------------------
// Rotary
// ---------------------------------------------------------------------------

/// Signed angular step between two encoder positions, folded into
/// (-180, 180] so the decoder's reset at a full turn reads as a small step.
pub fn angular_delta(from_degrees: i32, to_degrees: i32) -> i32 {
    let delta = (to_degrees - from_degrees).rem_euclid(360);
    if delta > 180 {
        delta - 360
    } else {
        delta
    }
}

/// Fires once the encoder has travelled half a turn in total, in any mix of
/// directions.  Progress carries over between trials until it fires.
#[derive(Debug, Default, Clone)]
pub struct RotaryAccumulator {
    last_position: i32,
    travelled: u32,
}

impl RotaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activated(&mut self, position_degrees: i32) -> bool {
        let delta = angular_delta(self.last_position, position_degrees);
        if delta == 0 {
            return false;
        }
        self.last_position = position_degrees;
        self.travelled += delta.unsigned_abs();

        if self.travelled >= ROTARY_ACTIVATION_DEGREES {
            self.travelled = 0;
            return true;
        }
        false
    }

    /// Follow a decoder reset without counting the jump as travel.
    pub fn rebaseline(&mut self, position_degrees: i32) {
        self.last_position = position_degrees;
    }

    pub fn travelled(&self) -> u32 {
        self.travelled
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Which face points up, from the first axis that clearly carries gravity.
/// Checked Z, then X, then Y; `None` while the cube is tilted between faces.
pub fn face_up(sample: AccelSample) -> SensorKind {
    let (x, y, z) = sample.calibrated();
    if z > FACE_UP_THRESHOLD {
        SensorKind::Flex
    } else if z < -FACE_UP_THRESHOLD {
        SensorKind::Captouch
    } else if x > FACE_UP_THRESHOLD {
        SensorKind::Rotary
    } else if x < -FACE_UP_THRESHOLD {
        SensorKind::Piezo
    } else if y > FACE_UP_THRESHOLD {
        SensorKind::Infrared
    } else if y < -FACE_UP_THRESHOLD {
        SensorKind::Ultrasonic
    } else {
        SensorKind::None
    }
}

/// Face on the strictly dominant axis, with no magnitude threshold.
/// `None` when two axes tie for the largest magnitude.
pub fn dominant_face(sample: AccelSample) -> Option<SensorKind> {
    let (x, y, z) = sample.calibrated();
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());

    if ax > ay && ax > az {
        Some(if x > 0 { SensorKind::Rotary } else { SensorKind::Piezo })
    } else if ay > ax && ay > az {
        Some(if y > 0 { SensorKind::Infrared } else { SensorKind::Ultrasonic })
    } else if az > ax && az > ay {
        Some(if z > 0 { SensorKind::Flex } else { SensorKind::Captouch })
    } else {
        None
    }
}

/// Detects the cube being turned over onto the face opposite the one that
/// was up when the detector armed.
#[derive(Debug, Default, Clone)]
pub struct FlipDetector {
    initial_face: SensorKind,
    awaiting_flip: bool,
}

impl FlipDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first call after a reset records the starting face and never
    /// fires; later calls fire once when the opposite face comes up.
    pub fn activated(&mut self, sample: AccelSample) -> bool {
        if !self.awaiting_flip {
            if let Some(face) = dominant_face(sample) {
                self.initial_face = face;
                self.awaiting_flip = true;
                log::debug!("IMU: initial face {:?}, waiting for flip", face);
            }
            return false;
        }

        let current = face_up(sample);
        if self.initial_face.opposite_face() == Some(current) {
            log::info!("IMU: flip detected from {:?} to {:?}", self.initial_face, current);
            self.reset();
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.initial_face = SensorKind::None;
        self.awaiting_flip = false;
    }

    pub fn initial_face(&self) -> SensorKind {
        self.initial_face
    }

    pub fn awaiting_flip(&self) -> bool {
        self.awaiting_flip
    }
}
