// ReflexCube - Game Task
//
// Single cooperative loop: sample controls, poll the sensors while a
// response is expected, advance the state machine, render.  Nothing here
// blocks longer than one I2C transaction.

use std::thread;
use std::time::Duration;

use esp_idf_hal::ledc::LedcTimer;

use crate::config::*;
use crate::drivers::board::{self, Board};
use crate::drivers::light::RgbLed;
use crate::drivers::sound::Speaker;
use crate::drivers::{now_ms, random};
use crate::events::TickInputs;
use crate::fault::FaultLatch;
use crate::game::{Game, GameState};
use crate::input::{EncoderDetents, TouchInput};
use crate::output::Presenter;
use crate::sensors::{SensorArbiter, SensorBank};

pub fn game_task<L: LedcTimer, S: LedcTimer>(
    mut board: Board,
    mut led: RgbLed<'static, L>,
    mut speaker: Speaker<'static, S>,
) {
    log::info!("Game task started");

    let tick = Duration::from_millis(GAME_TICK_MS);
    let start = now_ms();
    let mut game = Game::new(start);
    let mut touch = TouchInput::new(start);
    let mut detents = EncoderDetents::new(board.position_degrees());
    let mut arbiter = SensorArbiter::new();
    let mut presenter = Presenter::new();
    let mut led_fault = FaultLatch::new();
    let mut speaker_fault = FaultLatch::new();

    loop {
        let now = now_ms();

        let raw_touch = board.touch();
        let inputs = TickInputs {
            touch_down: touch.update(raw_touch, now),
            turn: detents.poll(board.position_degrees()),
            poll: (game.state() == GameState::Response)
                .then(|| arbiter.poll(game.assigned(), &mut board)),
            random: random(),
        };

        if let Some(poll) = inputs.poll.filter(|p| !p.activated.is_none()) {
            log::info!(
                "Activated {:?} (ordinal {}), poll latency {} us",
                poll.activated,
                poll.activated.ordinal(),
                poll.latency_us
            );
        }

        let outcome = game.step(now, &inputs);

        if let Some(transition) = outcome.transition {
            match transition.to {
                GameState::Selection => {
                    board::encoder().reset();
                    detents.rebaseline(0);
                    arbiter.rebaseline_rotary(0);
                }
                GameState::Response => arbiter.begin_trial(),
                _ => {}
            }
        }
        if outcome.level_changed {
            log::info!("Level selected: {}", game.progress().level);
            presenter.on_level_changed(game.progress().level, now);
        }

        let scene = presenter.render(&game.status(now), now);
        if let Some(e) = led_fault.check(led.apply(&scene)) {
            log::warn!("LED update failed: {}", e);
        }
        if let Some(e) = speaker_fault.check(speaker.apply(scene.tone_hz)) {
            log::warn!("Speaker update failed ({:?} Hz): {}", scene.tone_hz, e);
        }

        thread::sleep(tick);
    }
}
