// ReflexCube - Shared Data Types

use crate::config::{ACCEL_BIAS_X, ACCEL_BIAS_Y, ACCEL_BIAS_Z};

// ---------------------------------------------------------------------------
// Sensor identity
// ---------------------------------------------------------------------------

/// Every interactive input on the cube.  Doubles as the identity of the face
/// that is currently pointing up, since each face carries exactly one sensor
/// (the IMU is the exception: it is "the whole cube").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorKind {
    #[default]
    None,
    Captouch,
    Infrared,
    Flex,
    Ultrasonic,
    Rotary,
    Piezo,
    Imu,
}

impl SensorKind {
    /// Sensors that can be assigned as a challenge, in ordinal order.
    pub const CHALLENGES: [SensorKind; 7] = [
        Self::Captouch,
        Self::Infrared,
        Self::Flex,
        Self::Ultrasonic,
        Self::Rotary,
        Self::Piezo,
        Self::Imu,
    ];

    /// Stable wire/diagnostic number: 0 for `None`, 1..=7 for the sensors.
    pub fn ordinal(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Captouch => 1,
            Self::Infrared => 2,
            Self::Flex => 3,
            Self::Ultrasonic => 4,
            Self::Rotary => 5,
            Self::Piezo => 6,
            Self::Imu => 7,
        }
    }

    /// Uniform pick over the seven challenge sensors.
    pub fn from_random(random: u32) -> Self {
        Self::CHALLENGES[(random % Self::CHALLENGES.len() as u32) as usize]
    }

    /// The face on the other side of the cube, used by the flip detector.
    pub fn opposite_face(self) -> Option<Self> {
        match self {
            Self::Captouch => Some(Self::Flex),
            Self::Flex => Some(Self::Captouch),
            Self::Rotary => Some(Self::Piezo),
            Self::Piezo => Some(Self::Rotary),
            Self::Infrared => Some(Self::Ultrasonic),
            Self::Ultrasonic => Some(Self::Infrared),
            Self::None | Self::Imu => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

// ---------------------------------------------------------------------------
// Accelerometer sample
// ---------------------------------------------------------------------------

/// Raw 3-axis acceleration as reported by the IMU, before bias removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccelSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl AccelSample {
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Axes with the per-axis calibration bias subtracted.
    pub fn calibrated(&self) -> (i32, i32, i32) {
        (
            self.x as i32 - ACCEL_BIAS_X,
            self.y as i32 - ACCEL_BIAS_Y,
            self.z as i32 - ACCEL_BIAS_Z,
        )
    }
}

// ---------------------------------------------------------------------------
// Player controls
// ---------------------------------------------------------------------------

/// One encoder detent worth of movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Clockwise,
    CounterClockwise,
}

/// Result of one arbiter poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Poll {
    /// `SensorKind::None` when nothing activated this cycle.
    pub activated: SensorKind,
    pub latency_us: u32,
}

/// Everything the state machine consumes in one game tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInputs {
    pub touch_down: bool,
    pub turn: Option<Turn>,
    /// Only sampled while the game is in `Response`.
    pub poll: Option<Poll>,
    /// Fresh entropy for sensor assignment.
    pub random: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_faces_pair_up() {
        for kind in SensorKind::CHALLENGES {
            if let Some(other) = kind.opposite_face() {
                assert_eq!(other.opposite_face(), Some(kind));
                assert_ne!(other, kind);
            }
        }
        assert_eq!(SensorKind::Imu.opposite_face(), None);
    }

    #[test]
    fn random_pick_covers_every_challenge() {
        let picked: Vec<_> = (0..7).map(SensorKind::from_random).collect();
        assert_eq!(picked, SensorKind::CHALLENGES.to_vec());
        assert!(!SensorKind::from_random(u32::MAX).is_none());
    }

    #[test]
    fn calibration_removes_bias() {
        let sample = AccelSample::new(5, -48, -9);
        assert_eq!(sample.calibrated(), (0, 0, 0));
    }
}
