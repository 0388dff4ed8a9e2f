// ReflexCube - RGB LED Driver
//
// Three LEDC channels on one timer.  The LED is common anode, so a channel
// is fully lit at 0 % duty; `Rgb::anode_duties` already does the inversion.

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

use crate::config::LED_PWM_FREQ_HZ;
use crate::output::{wheel_color, Rgb, Scene};

pub struct RgbLed<'d, T: LedcTimer> {
    _timer: LedcTimerDriver<'d, T>,
    red: LedcDriver<'d>,
    green: LedcDriver<'d>,
    blue: LedcDriver<'d>,
    color: Rgb,
    brightness: u8,
}

impl<'d, T: LedcTimer> RgbLed<'d, T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new<CR: LedcChannel, CG: LedcChannel, CB: LedcChannel>(
        timer: impl Peripheral<P = T> + 'd,
        red_channel: impl Peripheral<P = CR> + 'd,
        green_channel: impl Peripheral<P = CG> + 'd,
        blue_channel: impl Peripheral<P = CB> + 'd,
        red_pin: impl Peripheral<P = impl OutputPin> + 'd,
        green_pin: impl Peripheral<P = impl OutputPin> + 'd,
        blue_pin: impl Peripheral<P = impl OutputPin> + 'd,
    ) -> anyhow::Result<Self> {
        let timer = LedcTimerDriver::new(
            timer,
            &TimerConfig::default().frequency(LED_PWM_FREQ_HZ.Hz().into()),
        )?;
        let red = LedcDriver::new(red_channel, &timer, red_pin)?;
        let green = LedcDriver::new(green_channel, &timer, green_pin)?;
        let blue = LedcDriver::new(blue_channel, &timer, blue_pin)?;

        let mut led = Self {
            _timer: timer,
            red,
            green,
            blue,
            color: Rgb::OFF,
            brightness: 100,
        };
        led.update()?;
        Ok(led)
    }

    pub fn set_color(&mut self, r: u8, g: u8, b: u8) -> anyhow::Result<()> {
        self.color = Rgb::new(r.min(100), g.min(100), b.min(100));
        self.update()
    }

    pub fn set_color_by_wheel_degrees(&mut self, degrees: i32) -> anyhow::Result<()> {
        self.color = wheel_color(degrees);
        self.update()
    }

    pub fn set_brightness(&mut self, percent: u8) -> anyhow::Result<()> {
        self.brightness = percent.min(100);
        self.update()
    }

    pub fn apply(&mut self, scene: &Scene) -> anyhow::Result<()> {
        self.color = scene.color;
        self.brightness = scene.brightness;
        self.update()
    }

    /// Push the current colour and brightness to the PWM channels.
    fn update(&mut self) -> anyhow::Result<()> {
        let duties = self.color.anode_duties(self.brightness);

        for (channel, percent) in [&mut self.red, &mut self.green, &mut self.blue]
            .into_iter()
            .zip(duties)
        {
            let duty = channel.get_max_duty() * percent as u32 / 100;
            channel.set_duty(duty)?;
        }
        Ok(())
    }
}
