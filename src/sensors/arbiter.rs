// ReflexCube - Sensor Arbiter
//
// Decides, once per game cycle, whether the player's action satisfied a
// sensor.  Only the sensor on the face that is currently up may fire (the IMU
// flip is the exception: it is eligible whenever it is the assigned sensor),
// so handling the cube cannot trigger a neighbouring face by accident.

use crate::events::{AccelSample, Poll, SensorKind};
use crate::sensors::filters::{
    face_up, flex_bent, piezo_shocked, ultrasonic_near, EdgeFilter, FlipDetector,
    RotaryAccumulator,
};

/// Raw sensor access for the arbiter.  Implemented over the real peripherals
/// on the board and over plain fields in tests.
pub trait SensorBank {
    fn accel(&mut self) -> anyhow::Result<AccelSample>;
    fn touch(&mut self) -> bool;
    fn infrared(&mut self) -> bool;
    fn flex_raw(&mut self) -> anyhow::Result<u16>;
    fn piezo_raw(&mut self) -> anyhow::Result<u16>;
    /// Latest ultrasonic distance; may be a stale reading.
    fn distance_mm(&mut self) -> u32;
    fn position_degrees(&mut self) -> i32;
    fn now_us(&self) -> u32;
}

#[derive(Debug, Default)]
pub struct SensorArbiter {
    touch: EdgeFilter,
    infrared: EdgeFilter,
    flex: EdgeFilter,
    ultrasonic: EdgeFilter,
    piezo: EdgeFilter,
    rotary: RotaryAccumulator,
    flip: FlipDetector,
}

impl SensorArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample the sensors once and report at most one activation.
    pub fn poll<B: SensorBank>(&mut self, assigned: SensorKind, bank: &mut B) -> Poll {
        let started_us = bank.now_us();

        let face = match bank.accel() {
            Ok(sample) => face_up(sample),
            Err(e) => {
                log::warn!("IMU read error: {}", e);
                SensorKind::None
            }
        };
        let activated = self.evaluate(face, assigned, bank);

        Poll {
            activated,
            latency_us: bank.now_us().wrapping_sub(started_us),
        }
    }

    fn evaluate<B: SensorBank>(
        &mut self,
        face: SensorKind,
        assigned: SensorKind,
        bank: &mut B,
    ) -> SensorKind {
        if face == SensorKind::Flex
            && self.flex.activated(read_adc(bank.flex_raw(), "flex", flex_bent))
        {
            return SensorKind::Flex;
        }
        if face == SensorKind::Piezo
            && self.piezo.activated(read_adc(bank.piezo_raw(), "piezo", piezo_shocked))
        {
            return SensorKind::Piezo;
        }
        if face == SensorKind::Rotary && self.rotary.activated(bank.position_degrees()) {
            return SensorKind::Rotary;
        }
        if face == SensorKind::Ultrasonic
            && self.ultrasonic.activated(ultrasonic_near(bank.distance_mm()))
        {
            return SensorKind::Ultrasonic;
        }
        if face == SensorKind::Captouch && self.touch.activated(bank.touch()) {
            return SensorKind::Captouch;
        }
        if face == SensorKind::Infrared && self.infrared.activated(bank.infrared()) {
            return SensorKind::Infrared;
        }
        if assigned == SensorKind::Imu && self.flip_activated(bank) {
            return SensorKind::Imu;
        }
        SensorKind::None
    }

    fn flip_activated<B: SensorBank>(&mut self, bank: &mut B) -> bool {
        match bank.accel() {
            Ok(sample) => self.flip.activated(sample),
            Err(e) => {
                log::warn!("IMU read error: {}", e);
                false
            }
        }
    }

    /// Start a fresh response window: the flip detector re-arms on the next
    /// IMU poll.  Rotary progress is kept until it fires.
    pub fn begin_trial(&mut self) {
        self.flip.reset();
    }

    /// Follow an encoder reset without counting the jump as rotation.
    pub fn rebaseline_rotary(&mut self, position_degrees: i32) {
        self.rotary.rebaseline(position_degrees);
    }
}

/// A failed ADC conversion counts as "not activated" for this cycle.
fn read_adc(reading: anyhow::Result<u16>, name: &str, test: fn(u16) -> bool) -> bool {
    match reading {
        Ok(raw) => test(raw),
        Err(e) => {
            log::warn!("{} ADC read error: {}", name, e);
            false
        }
    }
}
