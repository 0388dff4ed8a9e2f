// ReflexCube - Sensor Board
//
// Owns every input on the cube and exposes them through `SensorBank`.
// The encoder and the echo pin are serviced from raw GPIO interrupts; the
// ultrasonic trigger is driven by a self-rearming one-shot esp_timer.

use core::ffi::c_void;
use core::ptr;

use anyhow::Context;
use esp_idf_hal::gpio::{AnyInputPin, Input, PinDriver};
use esp_idf_sys::esp;

use crate::config::*;
use crate::drivers::imu::Bno055;
use crate::drivers::now_us;
use crate::events::AccelSample;
use crate::sensors::{Channel, EchoRangefinder, QuadratureDecoder, SensorBank, TriggerCycle};

static ENCODER: QuadratureDecoder = QuadratureDecoder::new();
static ECHO: EchoRangefinder = EchoRangefinder::new();

const ADC_CHANNEL_FLEX: esp_idf_sys::adc_channel_t = esp_idf_sys::adc_channel_t_ADC_CHANNEL_0; // GPIO1
const ADC_CHANNEL_PIEZO: esp_idf_sys::adc_channel_t = esp_idf_sys::adc_channel_t_ADC_CHANNEL_1; // GPIO2

/// Shared decoder state, also reset by the game loop on entering level selection.
pub fn encoder() -> &'static QuadratureDecoder {
    &ENCODER
}

pub struct Board {
    imu: Bno055,
    touch: PinDriver<'static, AnyInputPin, Input>,
    infrared: PinDriver<'static, AnyInputPin, Input>,
    adc: esp_idf_sys::adc_oneshot_unit_handle_t,
}

// SAFETY: the ADC handle is only ever used by the thread that owns the board.
unsafe impl Send for Board {}

impl Board {
    pub fn new(
        imu: Bno055,
        touch: PinDriver<'static, AnyInputPin, Input>,
        infrared: PinDriver<'static, AnyInputPin, Input>,
    ) -> anyhow::Result<Self> {
        let adc = init_adc().context("ADC setup")?;
        init_interrupts().context("GPIO interrupt setup")?;
        start_trigger().context("ultrasonic trigger setup")?;
        log::info!("Sensor board ready");

        Ok(Self {
            imu,
            touch,
            infrared,
            adc,
        })
    }

    fn read_adc(&mut self, channel: esp_idf_sys::adc_channel_t) -> anyhow::Result<u16> {
        let mut raw: i32 = 0;
        esp!(unsafe { esp_idf_sys::adc_oneshot_read(self.adc, channel, &mut raw) })?;
        Ok(raw.clamp(0, u16::MAX as i32) as u16)
    }
}

impl SensorBank for Board {
    fn accel(&mut self) -> anyhow::Result<AccelSample> {
        self.imu.read_accel()
    }

    fn touch(&mut self) -> bool {
        self.touch.is_high()
    }

    fn infrared(&mut self) -> bool {
        self.infrared.is_high()
    }

    fn flex_raw(&mut self) -> anyhow::Result<u16> {
        self.read_adc(ADC_CHANNEL_FLEX)
    }

    fn piezo_raw(&mut self) -> anyhow::Result<u16> {
        self.read_adc(ADC_CHANNEL_PIEZO)
    }

    fn distance_mm(&mut self) -> u32 {
        ECHO.consume_distance_mm()
    }

    fn position_degrees(&mut self) -> i32 {
        ENCODER.position_degrees()
    }

    fn now_us(&self) -> u32 {
        now_us()
    }
}

// ---------------------------------------------------------------------------
// ADC (flex + piezo on ADC1, 11 dB, 12 bit)
// ---------------------------------------------------------------------------

fn init_adc() -> anyhow::Result<esp_idf_sys::adc_oneshot_unit_handle_t> {
    let mut handle: esp_idf_sys::adc_oneshot_unit_handle_t = ptr::null_mut();
    unsafe {
        let unit_cfg = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
            unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
            ulp_mode: esp_idf_sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..core::mem::zeroed()
        };
        esp!(esp_idf_sys::adc_oneshot_new_unit(&unit_cfg, &mut handle))?;

        let chan_cfg = esp_idf_sys::adc_oneshot_chan_cfg_t {
            atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_11,
            bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        for channel in [ADC_CHANNEL_FLEX, ADC_CHANNEL_PIEZO] {
            esp!(esp_idf_sys::adc_oneshot_config_channel(handle, channel, &chan_cfg))?;
        }
    }
    Ok(handle)
}

// ---------------------------------------------------------------------------
// GPIO interrupts
// ---------------------------------------------------------------------------

// The argument carries the encoder channel: 0 = A, 1 = B.
unsafe extern "C" fn encoder_isr(arg: *mut c_void) {
    let (channel, pin) = if arg.is_null() {
        (Channel::A, PIN_ENCODER_A)
    } else {
        (Channel::B, PIN_ENCODER_B)
    };
    ENCODER.on_edge(channel, esp_idf_sys::gpio_get_level(pin) != 0);
}

unsafe extern "C" fn echo_isr(_arg: *mut c_void) {
    let level = esp_idf_sys::gpio_get_level(PIN_ECHO) != 0;
    ECHO.on_edge(level, now_us());
}

fn input_config(pin: i32, pull_up: bool) -> esp_idf_sys::gpio_config_t {
    esp_idf_sys::gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: esp_idf_sys::gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: if pull_up {
            esp_idf_sys::gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            esp_idf_sys::gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: esp_idf_sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: esp_idf_sys::gpio_int_type_t_GPIO_INTR_ANYEDGE,
        ..unsafe { core::mem::zeroed() }
    }
}

fn init_interrupts() -> anyhow::Result<()> {
    unsafe {
        esp!(esp_idf_sys::gpio_install_isr_service(0))?;

        for pin in [PIN_ENCODER_A, PIN_ENCODER_B] {
            esp!(esp_idf_sys::gpio_config(&input_config(pin, true)))?;
        }
        esp!(esp_idf_sys::gpio_config(&input_config(PIN_ECHO, false)))?;

        esp!(esp_idf_sys::gpio_isr_handler_add(
            PIN_ENCODER_A,
            Some(encoder_isr),
            ptr::null_mut()
        ))?;
        esp!(esp_idf_sys::gpio_isr_handler_add(
            PIN_ENCODER_B,
            Some(encoder_isr),
            1usize as *mut c_void
        ))?;
        esp!(esp_idf_sys::gpio_isr_handler_add(
            PIN_ECHO,
            Some(echo_isr),
            ptr::null_mut()
        ))?;
    }
    log::info!(
        "Interrupts armed: encoder GPIO{}/{}, echo GPIO{}",
        PIN_ENCODER_A,
        PIN_ENCODER_B,
        PIN_ECHO
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Ultrasonic trigger timer
// ---------------------------------------------------------------------------

struct TriggerContext {
    cycle: TriggerCycle,
    timer: esp_idf_sys::esp_timer_handle_t,
}

unsafe extern "C" fn trigger_callback(arg: *mut c_void) {
    let ctx = &mut *(arg as *mut TriggerContext);
    let step = ctx.cycle.on_expiry();
    esp_idf_sys::gpio_set_level(PIN_TRIGGER, step.pin_high as u32);
    // esp_timer cannot resolve 10 us exactly; the sensor only needs at least that.
    esp_idf_sys::esp_timer_start_once(ctx.timer, step.next_in_us);
}

fn start_trigger() -> anyhow::Result<()> {
    let ctx = Box::into_raw(Box::new(TriggerContext {
        cycle: TriggerCycle::new(),
        timer: ptr::null_mut(),
    }));

    unsafe {
        let out = esp_idf_sys::gpio_config_t {
            pin_bit_mask: 1u64 << PIN_TRIGGER,
            mode: esp_idf_sys::gpio_mode_t_GPIO_MODE_OUTPUT,
            intr_type: esp_idf_sys::gpio_int_type_t_GPIO_INTR_DISABLE,
            ..core::mem::zeroed()
        };
        esp!(esp_idf_sys::gpio_config(&out))?;
        esp!(esp_idf_sys::gpio_set_level(PIN_TRIGGER, 0))?;

        let args = esp_idf_sys::esp_timer_create_args_t {
            callback: Some(trigger_callback),
            arg: ctx as *mut c_void,
            dispatch_method: esp_idf_sys::esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"us_trigger".as_ptr(),
            skip_unhandled_events: false,
        };
        // The context lives until power-off, like the timer.
        esp!(esp_idf_sys::esp_timer_create(&args, &mut (*ctx).timer))?;
        esp!(esp_idf_sys::esp_timer_start_once((*ctx).timer, TRIGGER_WAIT_US))?;
    }
    Ok(())
}
