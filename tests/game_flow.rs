use pretty_assertions::assert_eq;
use reflexcube::config::{LEVELS, TRIALS};
use reflexcube::events::{Poll, SensorKind, TickInputs, Turn};
use reflexcube::game::{Game, GameState, GameStatus, TickOutcome};
use reflexcube::output::Presenter;

/// Drives a `Game` with an explicit clock.
struct Session {
    game: Game,
    now: u32,
    seed: u32,
}

impl Session {
    fn new() -> Self {
        Self {
            game: Game::new(0),
            now: 0,
            seed: 0,
        }
    }

    fn tick_after(&mut self, ms: u32, mut inputs: TickInputs) -> TickOutcome {
        self.now += ms;
        self.seed = self.seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        inputs.random = self.seed >> 8;
        self.game.step(self.now, &inputs)
    }

    fn state(&self) -> GameState {
        self.game.state()
    }

    fn status(&self) -> GameStatus {
        self.game.status(self.now)
    }

    fn hold_touch(&mut self, ms: u32) {
        self.tick_after(ms, touch());
    }

    fn fire(&mut self, kind: SensorKind) -> TickOutcome {
        self.tick_after(
            10,
            TickInputs {
                poll: Some(Poll {
                    activated: kind,
                    latency_us: 120,
                }),
                ..TickInputs::default()
            },
        )
    }

    /// Indication → Response → correct sensor.
    fn win_trial(&mut self) -> TickOutcome {
        assert_eq!(self.state(), GameState::Indication);
        self.tick_after(1_000, TickInputs::default());
        assert_eq!(self.state(), GameState::Response);
        let assigned = self.game.assigned();
        self.fire(assigned)
    }
}

fn touch() -> TickInputs {
    TickInputs {
        touch_down: true,
        ..TickInputs::default()
    }
}

fn turn(turn: Turn) -> TickInputs {
    TickInputs {
        turn: Some(turn),
        ..TickInputs::default()
    }
}

#[test]
fn slow_player_loses_and_progress_resets() {
    let mut s = Session::new();
    s.hold_touch(0);
    assert_eq!(s.state(), GameState::Introduction);
    s.hold_touch(3_000);
    assert_eq!(s.state(), GameState::Indication);
    s.win_trial();
    assert_eq!(s.status().trial, 1);

    s.tick_after(1_000, TickInputs::default());
    assert_eq!(s.state(), GameState::Response);

    // Level 0 allows 3500 ms.
    s.tick_after(3_499, TickInputs::default());
    assert_eq!(s.state(), GameState::Response);
    let outcome = s.tick_after(1, TickInputs::default());
    assert_eq!(outcome.transition.map(|t| t.to), Some(GameState::Lose));
    assert_eq!((s.status().level, s.status().trial), (0, 0));

    s.tick_after(8_999, TickInputs::default());
    assert_eq!(s.state(), GameState::Lose);
    s.tick_after(1, TickInputs::default());
    assert_eq!(s.state(), GameState::Init);
}

#[test]
fn clearing_the_last_level_wins_the_game() {
    let mut s = Session::new();
    s.tick_after(5, turn(Turn::Clockwise));
    assert_eq!(s.state(), GameState::Selection);
    for _ in 0..LEVELS + 2 {
        s.tick_after(5, turn(Turn::Clockwise));
    }
    assert_eq!(s.status().level, LEVELS);

    s.hold_touch(5);
    s.hold_touch(3_000);
    assert_eq!(s.state(), GameState::Indication);

    for _ in 0..TRIALS {
        let outcome = s.win_trial();
        assert_eq!(outcome.transition.map(|t| t.to), Some(GameState::Indication));
    }
    let outcome = s.win_trial();
    assert_eq!(outcome.transition.map(|t| t.to), Some(GameState::LevelUp));
    assert_eq!((s.status().level, s.status().trial), (LEVELS + 1, 0));

    s.tick_after(LEVELS * 1_000 - 1, TickInputs::default());
    assert_eq!(s.state(), GameState::LevelUp);
    s.tick_after(1, TickInputs::default());
    assert_eq!(s.state(), GameState::Win);

    s.tick_after(LEVELS * 1_000, TickInputs::default());
    assert_eq!(s.state(), GameState::Init);
    assert_eq!(s.status().level, 0);
}

#[test]
fn level_up_returns_to_indication() {
    let mut s = Session::new();
    s.hold_touch(0);
    s.hold_touch(3_000);
    for _ in 0..=TRIALS {
        s.win_trial();
    }
    assert_eq!(s.state(), GameState::LevelUp);
    assert_eq!(s.status().level, 1);

    s.tick_after(1_000, TickInputs::default());
    assert_eq!(s.state(), GameState::Indication);
    assert!(!s.game.assigned().is_none());
}

#[test]
fn selection_beeps_on_level_change() {
    let mut s = Session::new();
    let mut presenter = Presenter::new();

    s.tick_after(5, turn(Turn::Clockwise));
    let outcome = s.tick_after(5, turn(Turn::Clockwise));
    assert!(outcome.level_changed);
    presenter.on_level_changed(s.status().level, s.now);

    let scene = presenter.render(&s.status(), s.now);
    assert_eq!(scene.tone_hz, Some(200));

    s.tick_after(400, TickInputs::default());
    let scene = presenter.render(&s.status(), s.now);
    assert_eq!(scene.tone_hz, None);
}

#[test]
fn transitions_are_numbered_in_order() {
    let mut s = Session::new();
    let mut numbers = Vec::new();
    for inputs in [touch(), TickInputs::default()] {
        if let Some(t) = s.tick_after(10, inputs).transition {
            numbers.push((t.number, t.from, t.to));
        }
    }
    if let Some(t) = s.tick_after(3_000, TickInputs::default()).transition {
        numbers.push((t.number, t.from, t.to));
    }
    assert_eq!(
        numbers,
        vec![
            (1, GameState::Init, GameState::Introduction),
            (2, GameState::Introduction, GameState::Abortion),
            (3, GameState::Abortion, GameState::Init),
        ]
    );
}
