// ReflexCube - Light & Sound Scenes
//
// Maps the game status to a complete output description once per cycle.
// Every field of a `Scene` is decided every cycle, so the actuator drivers
// hold no memory of earlier calls.  Time-based effects are functions of the
// time since the current state was entered; the one effect that outlives a
// single call (the level-selection beep) is an explicit `ToneBurst` owned by
// the `Presenter`.

use crate::config::*;
use crate::events::SensorKind;
use crate::game::{level_up_span_ms, GameState, GameStatus};

/// Colour with each channel in percent (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(100, 100, 100);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn scaled(self, brightness: u8) -> Self {
        let scale = |c: u8| (c as u16 * brightness.min(100) as u16 / 100) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// PWM duty per channel in percent for a common-anode LED: 100 is dark.
    pub fn anode_duties(self, brightness: u8) -> [u8; 3] {
        let lit = self.scaled(brightness);
        [lit.r, lit.g, lit.b].map(|c| 100u8.saturating_sub(c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scene {
    pub tone_hz: Option<u32>,
    pub color: Rgb,
    pub brightness: u8,
}

impl Scene {
    pub fn led_duties(&self) -> [u8; 3] {
        self.color.anode_duties(self.brightness)
    }
}

// ---------------------------------------------------------------------------
// Per-sensor cues
// ---------------------------------------------------------------------------

pub fn sensor_color(kind: SensorKind) -> Rgb {
    match kind {
        SensorKind::None => Rgb::OFF,
        SensorKind::Captouch => Rgb::new(100, 0, 0),
        SensorKind::Infrared => Rgb::new(0, 100, 0),
        SensorKind::Flex => Rgb::new(0, 0, 100),
        SensorKind::Ultrasonic => Rgb::new(100, 100, 0),
        SensorKind::Rotary => Rgb::new(0, 100, 100),
        SensorKind::Piezo => Rgb::new(100, 0, 100),
        SensorKind::Imu => Rgb::WHITE,
    }
}

pub fn sensor_tone_hz(kind: SensorKind) -> Option<u32> {
    match kind {
        SensorKind::None => None,
        other => Some(444 * other.ordinal()),
    }
}

/// Lowest and highest tone the speaker timer can produce at its configured
/// resolution: the clock divider must stay within `1..=LEDC_MAX_DIVIDER`.
pub fn speaker_range_hz() -> (u32, u32) {
    let steps = 1u64 << SPEAKER_PWM_RESOLUTION_BITS;
    let clock = LEDC_SOURCE_CLOCK_HZ as u64;
    let lowest = clock.div_ceil(LEDC_MAX_DIVIDER as u64 * steps);
    (lowest as u32, (clock / steps) as u32)
}

// ---------------------------------------------------------------------------
// Colour wheel
// ---------------------------------------------------------------------------

/// Colour at `degrees` on the wheel: 0 is yellow, 60 red, 180 blue, 300
/// green, with linear blends between.  Any integer angle is accepted.
pub fn wheel_color(degrees: i32) -> Rgb {
    let deg = degrees.rem_euclid(360);
    // Blend between two primaries across a 120 degree zone centred on `centre`.
    let blend = |centre: i32| {
        let theta = deg - centre;
        let rising = 50 + 50 * theta / 60;
        let falling = 50 - 50 * theta / 60;
        (rising.clamp(0, 100) as u8, falling.clamp(0, 100) as u8)
    };

    if deg <= 60 || deg >= 300 {
        let centre = if deg >= 300 { 360 } else { 0 };
        let (r, g) = blend(centre);
        Rgb::new(r, g, 0)
    } else if deg <= 180 {
        let (b, r) = blend(120);
        Rgb::new(r, 0, b)
    } else {
        let (g, b) = blend(240);
        Rgb::new(0, g, b)
    }
}

/// Position on a wheel that turns once every `period_ms`.
pub fn wheel_degrees(elapsed_ms: u32, period_ms: u32) -> i32 {
    if period_ms == 0 {
        return 0;
    }
    ((elapsed_ms % period_ms) as u64 * 360 / period_ms as u64) as i32
}

// ---------------------------------------------------------------------------
// Time-based effects
// ---------------------------------------------------------------------------

/// Linear brightness ramp; holds `to` once the period is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fade {
    pub from: u8,
    pub to: u8,
    pub period_ms: u32,
}

impl Fade {
    pub fn at(&self, elapsed_ms: u32) -> u8 {
        if self.period_ms == 0 || elapsed_ms >= self.period_ms {
            return self.to;
        }
        let from = self.from as i64;
        let span = self.to as i64 - from;
        (from + span * elapsed_ms as i64 / self.period_ms as i64) as u8
    }
}

/// A tone that plays for a fixed time after `start`.  Starting again, even
/// with the same tone, restarts the period.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneBurst {
    tone_hz: u32,
    period_ms: u32,
    started_ms: u32,
    active: bool,
}

impl ToneBurst {
    pub fn start(&mut self, tone_hz: u32, period_ms: u32, now_ms: u32) {
        *self = Self {
            tone_hz,
            period_ms,
            started_ms: now_ms,
            active: true,
        };
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn tone_at(&mut self, now_ms: u32) -> Option<u32> {
        if self.active && now_ms.wrapping_sub(self.started_ms) >= self.period_ms {
            self.active = false;
        }
        self.active.then_some(self.tone_hz)
    }
}

/// Which of `parts` equal slices of `span_ms` the elapsed time falls in.
fn slice(elapsed_ms: u32, span_ms: u32, parts: u32) -> u32 {
    if span_ms == 0 {
        return parts;
    }
    (elapsed_ms as u64 * parts as u64 / span_ms as u64) as u32
}

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Presenter {
    selection_beep: ToneBurst,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Beep once per level change, higher for harder levels.
    pub fn on_level_changed(&mut self, level: u32, now_ms: u32) {
        self.selection_beep
            .start(100 * (level + 1), SELECTION_TONE_MS, now_ms);
    }

    pub fn render(&mut self, status: &GameStatus, now_ms: u32) -> Scene {
        let t = status.time_in_state_ms;
        if status.state != GameState::Selection {
            self.selection_beep.stop();
        }

        match status.state {
            GameState::Init => Scene {
                tone_hz: match slice(t, INIT_JINGLE_MS, 3) {
                    0 => Some(100),
                    1 => Some(200),
                    2 => Some(300),
                    _ => None,
                },
                color: wheel_color(wheel_degrees(t, INIT_WHEEL_PERIOD_MS)),
                brightness: 100,
            },

            GameState::Selection => Scene {
                tone_hz: self.selection_beep.tone_at(now_ms),
                color: wheel_color((60 * status.level / (LEVELS + 1)) as i32),
                brightness: 100,
            },

            GameState::Introduction => {
                let (tone, brightness) = match slice(t, INTRODUCTION_HOLD_MS, 3) {
                    0 => (400, 33),
                    1 => (800, 66),
                    _ => (1200, 100),
                };
                Scene {
                    tone_hz: Some(tone),
                    color: wheel_color(300),
                    brightness,
                }
            }

            GameState::Abortion => {
                let (tone_hz, brightness) = match slice(t, ABORTION_MS, 3) {
                    0 => (None, 100),
                    1 => (Some(800), 0),
                    2 => (Some(400), 0),
                    _ => (None, 0),
                };
                Scene {
                    tone_hz,
                    color: wheel_color(60),
                    brightness,
                }
            }

            GameState::Indication => Scene {
                tone_hz: sensor_tone_hz(status.assigned),
                color: sensor_color(status.assigned),
                brightness: 100,
            },

            GameState::Response => Scene {
                tone_hz: None,
                color: sensor_color(status.assigned),
                brightness: 100,
            },

            GameState::Lose => {
                let fade = Fade {
                    from: 100,
                    to: 0,
                    period_ms: LOSE_MS * 2 / 9,
                };
                let (tone_hz, brightness) = match slice(t, LOSE_MS, 9) {
                    0 => (None, 100),
                    1 => (Some(300), 100),
                    2 => (Some(200), 100),
                    3 => (Some(100), 100),
                    4 | 5 => (None, fade.at(t - LOSE_MS * 4 / 9)),
                    _ => (None, 0),
                };
                Scene {
                    tone_hz,
                    color: Rgb::WHITE,
                    brightness,
                }
            }

            GameState::LevelUp => {
                let span = level_up_span_ms(status.level);
                Scene {
                    tone_hz: match slice(t, span, 3) {
                        0 => Some(300),
                        1 => Some(600),
                        2 => Some(900),
                        _ => None,
                    },
                    color: wheel_color(wheel_degrees(t, status.level * 100)),
                    brightness: 100,
                }
            }

            GameState::Win => Scene {
                tone_hz: None,
                color: wheel_color(wheel_degrees(t, WIN_WHEEL_PERIOD_MS)),
                brightness: 100,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: GameState, level: u32, time_in_state_ms: u32) -> GameStatus {
        GameStatus {
            state,
            level,
            trial: 0,
            assigned: SensorKind::Piezo,
            time_in_state_ms,
            transitions: 1,
        }
    }

    #[test]
    fn wheel_hits_primaries() {
        assert_eq!(wheel_color(0), Rgb::new(50, 50, 0));
        assert_eq!(wheel_color(60), Rgb::new(100, 0, 0));
        assert_eq!(wheel_color(180), Rgb::new(0, 0, 100));
        assert_eq!(wheel_color(300), Rgb::new(0, 100, 0));
        assert_eq!(wheel_color(120), Rgb::new(50, 0, 50));
        assert_eq!(wheel_color(240), Rgb::new(0, 50, 50));
    }

    #[test]
    fn wheel_wraps_negative_and_large_angles() {
        assert_eq!(wheel_color(-60), wheel_color(300));
        assert_eq!(wheel_color(420), wheel_color(60));
        assert_eq!(wheel_color(330), Rgb::new(25, 75, 0));
    }

    #[test]
    fn wheel_degrees_cycles_with_period() {
        assert_eq!(wheel_degrees(0, 5000), 0);
        assert_eq!(wheel_degrees(2500, 5000), 180);
        assert_eq!(wheel_degrees(7500, 5000), 180);
        assert_eq!(wheel_degrees(100, 0), 0);
    }

    #[test]
    fn fade_ramps_then_holds() {
        let fade = Fade {
            from: 100,
            to: 0,
            period_ms: 2000,
        };
        assert_eq!(fade.at(0), 100);
        assert_eq!(fade.at(500), 75);
        assert_eq!(fade.at(2000), 0);
        assert_eq!(fade.at(9000), 0);
    }

    #[test]
    fn tone_burst_runs_for_its_period_only() {
        let mut burst = ToneBurst::default();
        assert_eq!(burst.tone_at(0), None);
        burst.start(300, 333, 1_000);
        assert_eq!(burst.tone_at(1_332), Some(300));
        assert_eq!(burst.tone_at(1_333), None);
        // Same arguments again are a new burst, not a continuation.
        burst.start(300, 333, 2_000);
        assert_eq!(burst.tone_at(2_100), Some(300));
    }

    #[test]
    fn led_duty_is_inverted_and_dimmed() {
        let scene = Scene {
            tone_hz: None,
            color: Rgb::new(100, 50, 0),
            brightness: 50,
        };
        assert_eq!(scene.led_duties(), [50, 75, 100]);
        assert_eq!(Rgb::WHITE.anode_duties(100), [0, 0, 0]);
        assert_eq!(Rgb::WHITE.anode_duties(0), [100, 100, 100]);
        assert_eq!(Rgb::OFF.anode_duties(100), [100, 100, 100]);
    }

    #[test]
    fn indication_shows_assigned_sensor() {
        let mut presenter = Presenter::new();
        let scene = presenter.render(&status(GameState::Indication, 0, 10), 10);
        assert_eq!(scene.tone_hz, Some(444 * 6));
        assert_eq!(scene.color, Rgb::new(100, 0, 100));
        let scene = presenter.render(&status(GameState::Response, 0, 10), 10);
        assert_eq!(scene.tone_hz, None);
        assert_eq!(scene.color, Rgb::new(100, 0, 100));
    }

    #[test]
    fn lose_sequence() {
        let mut presenter = Presenter::new();
        let at = |p: &mut Presenter, t| p.render(&status(GameState::Lose, 0, t), t);
        assert_eq!(at(&mut presenter, 500).tone_hz, None);
        assert_eq!(at(&mut presenter, 1_500).tone_hz, Some(300));
        assert_eq!(at(&mut presenter, 3_500).tone_hz, Some(100));
        assert_eq!(at(&mut presenter, 4_000).brightness, 100);
        assert_eq!(at(&mut presenter, 5_000).brightness, 50);
        assert_eq!(at(&mut presenter, 6_500).brightness, 0);
    }

    #[test]
    fn selection_beeps_on_level_change() {
        let mut presenter = Presenter::new();
        presenter.on_level_changed(2, 100);
        let scene = presenter.render(&status(GameState::Selection, 2, 100), 100);
        assert_eq!(scene.tone_hz, Some(300));
        assert_eq!(scene.color, wheel_color(17));
        let scene = presenter.render(&status(GameState::Selection, 2, 500), 500);
        assert_eq!(scene.tone_hz, None);
    }

    #[test]
    fn introduction_builds_up() {
        let mut presenter = Presenter::new();
        let tones: Vec<_> = [0, 1_000, 2_000, 2_999]
            .into_iter()
            .map(|t| presenter.render(&status(GameState::Introduction, 0, t), t))
            .map(|s| (s.tone_hz, s.brightness))
            .collect();
        assert_eq!(
            tones,
            [(Some(400), 33), (Some(800), 66), (Some(1200), 100), (Some(1200), 100)]
        );
    }

    #[test]
    fn init_plays_jingle_then_turns_the_wheel() {
        let mut presenter = Presenter::new();
        let tones: Vec<_> = [0, 600, 1_200, 1_500]
            .into_iter()
            .map(|t| presenter.render(&status(GameState::Init, 0, t), t).tone_hz)
            .collect();
        assert_eq!(tones, [Some(100), Some(200), Some(300), None]);

        let scene = presenter.render(&status(GameState::Init, 0, 2_500), 2_500);
        assert_eq!(scene.color, wheel_color(180));
        assert_eq!(scene.brightness, 100);
        let scene = presenter.render(&status(GameState::Init, 0, 7_500), 7_500);
        assert_eq!(scene.color, wheel_color(180));
    }

    #[test]
    fn abortion_flashes_then_beeps_down() {
        let mut presenter = Presenter::new();
        let scenes: Vec<_> = [0, 1_000, 2_000]
            .into_iter()
            .map(|t| presenter.render(&status(GameState::Abortion, 0, t), t))
            .map(|s| (s.tone_hz, s.brightness))
            .collect();
        assert_eq!(scenes, [(None, 100), (Some(800), 0), (Some(400), 0)]);

        let scene = presenter.render(&status(GameState::Abortion, 0, 0), 0);
        assert_eq!(scene.color, Rgb::new(100, 0, 0));
    }

    #[test]
    fn level_up_tones_follow_the_level_span() {
        let mut presenter = Presenter::new();
        let tones: Vec<_> = [0, 700, 1_400, 2_000]
            .into_iter()
            .map(|t| presenter.render(&status(GameState::LevelUp, 2, t), t).tone_hz)
            .collect();
        assert_eq!(tones, [Some(300), Some(600), Some(900), None]);

        // Wheel period is level * 100 ms.
        let scene = presenter.render(&status(GameState::LevelUp, 2, 100), 100);
        assert_eq!(scene.color, wheel_color(180));
        let scene = presenter.render(&status(GameState::LevelUp, 2, 300), 300);
        assert_eq!(scene.color, wheel_color(180));
    }

    #[test]
    fn win_spins_the_wheel_once_a_second() {
        let mut presenter = Presenter::new();
        let at = |p: &mut Presenter, t| p.render(&status(GameState::Win, 7, t), t);
        let scene = at(&mut presenter, 250);
        assert_eq!(scene.tone_hz, None);
        assert_eq!(scene.color, wheel_color(90));
        assert_eq!(at(&mut presenter, 1_250).color, wheel_color(90));
        assert_eq!(at(&mut presenter, 500).color, wheel_color(180));
    }

    #[test]
    fn every_tone_is_within_speaker_range() {
        let (lowest, highest) = speaker_range_hz();
        let states = [
            GameState::Init,
            GameState::Selection,
            GameState::Introduction,
            GameState::Abortion,
            GameState::Indication,
            GameState::Response,
            GameState::Lose,
            GameState::LevelUp,
            GameState::Win,
        ];

        let mut presenter = Presenter::new();
        let mut tones = Vec::new();
        for state in states {
            for level in 0..=LEVELS + 1 {
                presenter.on_level_changed(level, 0);
                for assigned in SensorKind::CHALLENGES {
                    for t in (0..LOSE_MS).step_by(100) {
                        let current = GameStatus {
                            assigned,
                            ..status(state, level, t)
                        };
                        tones.extend(presenter.render(&current, 0).tone_hz);
                    }
                }
            }
        }

        assert!(tones.contains(&100));
        assert!(tones.contains(&(444 * 7)));
        for tone in tones {
            assert!(
                (lowest..=highest).contains(&tone),
                "{} Hz outside {}..={} Hz",
                tone,
                lowest,
                highest
            );
        }
    }
}
