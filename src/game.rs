// ReflexCube - Game State Machine
//
// Pure with respect to hardware: every tick the runtime hands in the current
// time and a `TickInputs` snapshot, and the machine advances at most one
// state.  Timeouts are soft, polled comparisons against the time since the
// current state was entered.

use crate::config::*;
use crate::events::{SensorKind, TickInputs, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Attract mode, waiting for the player.
    Init,
    /// Level picked with the encoder.
    Selection,
    /// Touch must be held to start.
    Introduction,
    /// Touch was let go during the introduction.
    Abortion,
    /// Shows which sensor to use next.
    Indication,
    /// Waits, against the clock, for the player to use it.
    Response,
    Lose,
    LevelUp,
    Win,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameProgress {
    pub level: u32,
    pub trial: u32,
    pub assigned: SensorKind,
}

impl GameProgress {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: GameState,
    pub to: GameState,
    /// Running count of transitions since power-on.
    pub number: u32,
    /// Sensor that fired in the tick that caused the transition, if any.
    pub activated: SensorKind,
}

/// What the output layer needs to render one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStatus {
    pub state: GameState,
    pub level: u32,
    pub trial: u32,
    pub assigned: SensorKind,
    pub time_in_state_ms: u32,
    pub transitions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub transition: Option<Transition>,
    pub level_changed: bool,
}

/// Time allowed in `Response`: shrinks by one step per level, never below
/// the configured minimum.
pub fn response_window_ms(level: u32) -> u32 {
    (LEVELS + 1)
        .saturating_sub(level)
        .saturating_mul(RESPONSE_STEP_MS)
        .max(MIN_RESPONSE_WINDOW_MS)
}

/// Celebration length after finishing `level - 1`.  Capped at the last level,
/// so the final level-up (which carries `level == LEVELS + 1`) lasts as long
/// as the win that follows it.
pub fn level_up_span_ms(level: u32) -> u32 {
    level.min(LEVELS) * LEVEL_UP_STEP_MS
}

pub fn win_span_ms() -> u32 {
    LEVELS * WIN_STEP_MS
}

pub struct Game {
    state: GameState,
    progress: GameProgress,
    entered_at_ms: u32,
    transitions: u32,
}

impl Game {
    pub fn new(now_ms: u32) -> Self {
        Self {
            state: GameState::Init,
            progress: GameProgress::default(),
            entered_at_ms: now_ms,
            transitions: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn progress(&self) -> GameProgress {
        self.progress
    }

    pub fn assigned(&self) -> SensorKind {
        self.progress.assigned
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn time_in_state(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.entered_at_ms)
    }

    pub fn status(&self, now_ms: u32) -> GameStatus {
        GameStatus {
            state: self.state,
            level: self.progress.level,
            trial: self.progress.trial,
            assigned: self.progress.assigned,
            time_in_state_ms: self.time_in_state(now_ms),
            transitions: self.transitions,
        }
    }

    /// Advance by one tick.
    pub fn step(&mut self, now_ms: u32, inputs: &TickInputs) -> TickOutcome {
        let elapsed = self.time_in_state(now_ms);
        let activated = inputs
            .poll
            .map(|p| p.activated)
            .unwrap_or(SensorKind::None);
        let mut outcome = TickOutcome::default();

        let next = match self.state {
            GameState::Init => {
                if inputs.turn.is_some() {
                    Some(GameState::Selection)
                } else if inputs.touch_down {
                    Some(GameState::Introduction)
                } else {
                    None
                }
            }

            GameState::Selection => {
                outcome.level_changed = self.select_level(inputs.turn);
                inputs.touch_down.then_some(GameState::Introduction)
            }

            GameState::Introduction => {
                if inputs.touch_down && elapsed >= INTRODUCTION_HOLD_MS {
                    Some(GameState::Indication)
                } else if !inputs.touch_down {
                    Some(GameState::Abortion)
                } else {
                    None
                }
            }

            GameState::Abortion => (elapsed >= ABORTION_MS).then_some(GameState::Init),

            GameState::Indication => (elapsed >= INDICATION_MS).then_some(GameState::Response),

            GameState::Response => {
                if elapsed >= response_window_ms(self.progress.level) {
                    Some(GameState::Lose)
                } else if activated.is_none() {
                    None
                } else if activated == self.progress.assigned {
                    Some(self.complete_trial())
                } else {
                    Some(GameState::Lose)
                }
            }

            GameState::Lose => (elapsed >= LOSE_MS).then_some(GameState::Init),

            GameState::LevelUp => {
                if elapsed < level_up_span_ms(self.progress.level) {
                    None
                } else if self.progress.level <= LEVELS {
                    Some(GameState::Indication)
                } else {
                    Some(GameState::Win)
                }
            }

            GameState::Win => (elapsed >= win_span_ms()).then_some(GameState::Init),
        };

        if let Some(to) = next {
            outcome.transition = Some(self.transition_to(to, now_ms, inputs.random, activated));
        }
        outcome
    }

    /// Apply one encoder detent to the level, clamped to `[0, LEVELS]`.
    fn select_level(&mut self, turn: Option<Turn>) -> bool {
        let level = self.progress.level;
        self.progress.level = match turn {
            Some(Turn::Clockwise) => (level + 1).min(LEVELS),
            Some(Turn::CounterClockwise) => level.saturating_sub(1),
            None => level,
        };
        self.progress.level != level
    }

    fn complete_trial(&mut self) -> GameState {
        self.progress.trial += 1;
        if self.progress.trial > TRIALS {
            self.progress.trial = 0;
            self.progress.level += 1;
            if self.progress.level > LEVELS {
                log::info!("=== WIN ===");
            } else {
                log::info!("=== LEVEL UP === now level {}", self.progress.level);
            }
            GameState::LevelUp
        } else {
            GameState::Indication
        }
    }

    fn transition_to(
        &mut self,
        to: GameState,
        now_ms: u32,
        random: u32,
        activated: SensorKind,
    ) -> Transition {
        self.transitions = self.transitions.wrapping_add(1);
        let transition = Transition {
            from: self.state,
            to,
            number: self.transitions,
            activated,
        };
        log::info!(
            "Transition #{}: {:?} -> {:?} (activated {:?})",
            transition.number,
            transition.from,
            transition.to,
            activated
        );

        self.state = to;
        self.entered_at_ms = now_ms;

        match to {
            GameState::Indication => {
                self.progress.assigned = SensorKind::from_random(random);
                log::info!("Sensor selected: {:?}", self.progress.assigned);
            }
            GameState::Init | GameState::Lose => self.progress.clear(),
            _ => {}
        }
        transition
    }
}
