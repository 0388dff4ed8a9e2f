// ReflexCube - Speaker Driver
//
// Square wave on one LEDC channel with its own timer, so the tone frequency
// can change without disturbing the LED PWM.

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

use crate::config::{SPEAKER_IDLE_FREQ_HZ, SPEAKER_PWM_RESOLUTION_BITS};

// 14 bits keeps the 80 MHz clock divider in range down to ~5 Hz.
const RESOLUTION: Resolution = Resolution::Bits14;
const _: () = assert!(SPEAKER_PWM_RESOLUTION_BITS == 14);

pub struct Speaker<'d, T: LedcTimer> {
    timer: LedcTimerDriver<'d, T>,
    channel: LedcDriver<'d>,
    playing: Option<u32>,
}

impl<'d, T: LedcTimer> Speaker<'d, T> {
    pub fn new<C: LedcChannel>(
        timer: impl Peripheral<P = T> + 'd,
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
    ) -> anyhow::Result<Self> {
        let timer = LedcTimerDriver::new(
            timer,
            &TimerConfig::default()
                .frequency(SPEAKER_IDLE_FREQ_HZ.Hz().into())
                .resolution(RESOLUTION),
        )?;
        let mut channel = LedcDriver::new(channel, &timer, pin)?;
        channel.set_duty(0)?;

        Ok(Self {
            timer,
            channel,
            playing: None,
        })
    }

    pub fn play_tone(&mut self, frequency_hz: u32) -> anyhow::Result<()> {
        if self.playing == Some(frequency_hz) {
            return Ok(());
        }
        if frequency_hz == 0 {
            return self.sound_off();
        }
        self.timer.set_frequency(frequency_hz.Hz())?;
        let half = self.channel.get_max_duty() / 2;
        self.channel.set_duty(half)?;
        self.playing = Some(frequency_hz);
        Ok(())
    }

    pub fn sound_off(&mut self) -> anyhow::Result<()> {
        if self.playing.is_some() {
            self.channel.set_duty(0)?;
            self.playing = None;
        }
        Ok(())
    }

    pub fn apply(&mut self, tone_hz: Option<u32>) -> anyhow::Result<()> {
        match tone_hz {
            Some(hz) => self.play_tone(hz),
            None => self.sound_off(),
        }
    }
}
