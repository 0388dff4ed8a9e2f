// ReflexCube - Hardware & Game Configuration
// Target: ESP32-S3 DevKitC-1 (Xtensa)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_FLEX_ADC: i32 = 1;          // ADC1_CH0 - flex resistor divider
pub const PIN_PIEZO_ADC: i32 = 2;         // ADC1_CH1 - piezo disc
pub const PIN_TOUCH: i32 = 4;             // capacitive touch module output (HIGH = touched)
pub const PIN_INFRARED: i32 = 5;          // break-beam receiver (HIGH = beam broken)
pub const PIN_ENCODER_A: i32 = 6;         // quadrature channel A
pub const PIN_ENCODER_B: i32 = 7;         // quadrature channel B
pub const PIN_I2C_SDA: i32 = 8;           // I2C data line (IMU)
pub const PIN_I2C_SCL: i32 = 9;           // I2C clock line (IMU)
pub const PIN_LED_RED: i32 = 10;          // RGB LED, common anode
pub const PIN_LED_GREEN: i32 = 11;
pub const PIN_LED_BLUE: i32 = 12;
pub const PIN_SPEAKER: i32 = 13;          // piezo speaker, square wave
pub const PIN_ECHO: i32 = 15;             // ultrasonic echo (both edges)
pub const PIN_TRIGGER: i32 = 16;          // ultrasonic trigger

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_BNO055: u8 = 0x28;
pub const I2C_BAUDRATE_KHZ: u32 = 100;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Task Stack & Loop Timing
// ---------------------------------------------------------------------------
pub const STACK_GAME: usize = 8192;
pub const FREERTOS_TICK_MS: u64 = 10;     // CONFIG_FREERTOS_HZ = 100
pub const GAME_TICK_MS: u64 = 10;         // shorter sleeps busy-wait instead of yielding
pub const BOOT_SETTLE_MS: u64 = 3000;     // let the serial console attach

// ---------------------------------------------------------------------------
// Game Rules
// ---------------------------------------------------------------------------
pub const LEVELS: u32 = 6;                // levels per game
pub const TRIALS: u32 = 6;                // trials per level
pub const LONG_PRESS_MS: u32 = 1000;      // one "long press" unit
pub const INTRODUCTION_HOLD_MS: u32 = LONG_PRESS_MS * 3;
pub const TOUCH_DEBOUNCE_MS: u32 = 20;

// ---------------------------------------------------------------------------
// State Time Spans (milliseconds)
// ---------------------------------------------------------------------------
pub const INIT_JINGLE_MS: u32 = 1500;
pub const INIT_WHEEL_PERIOD_MS: u32 = 5000;
pub const SELECTION_TONE_MS: u32 = 333;
pub const ABORTION_MS: u32 = 3000;
pub const INDICATION_MS: u32 = 1000;
pub const RESPONSE_STEP_MS: u32 = 500;    // deadline = (LEVELS - level + 1) * step
pub const MIN_RESPONSE_WINDOW_MS: u32 = 500;
pub const LOSE_MS: u32 = 9000;
pub const LEVEL_UP_STEP_MS: u32 = 1000;   // span = level * step
pub const WIN_STEP_MS: u32 = 1000;        // span = LEVELS * step
pub const WIN_WHEEL_PERIOD_MS: u32 = 1000;

// ---------------------------------------------------------------------------
// Sensor Thresholds
// ---------------------------------------------------------------------------
pub const FLEX_BENT_BELOW: u16 = 2100;    // 12-bit ADC counts
pub const PIEZO_SHOCK_ABOVE: u16 = 35;    // 12-bit ADC counts
pub const ULTRASONIC_NEAR_BELOW_MM: u32 = 60;
pub const FACE_UP_THRESHOLD: i32 = 900;   // raw accelerometer units (~0.9 g)
pub const ROTARY_ACTIVATION_DEGREES: u32 = 180;
pub const ENCODER_DETENT_DEGREES: i32 = 15;

// ---------------------------------------------------------------------------
// IMU Calibration (raw units, subtracted from every read)
// ---------------------------------------------------------------------------
pub const ACCEL_BIAS_X: i32 = 5;
pub const ACCEL_BIAS_Y: i32 = -48;
pub const ACCEL_BIAS_Z: i32 = -9;

// ---------------------------------------------------------------------------
// Quadrature Encoder
// ---------------------------------------------------------------------------
pub const ENCODER_COUNTS_PER_REV: i32 = 96;

// ---------------------------------------------------------------------------
// Ultrasonic Ranging
// ---------------------------------------------------------------------------
pub const TRIGGER_PULSE_US: u64 = 10;
pub const TRIGGER_WAIT_US: u64 = 60_000;
pub const SOUND_VELOCITY: u32 = 34;       // 340 m/s in fixed units, see `distance_mm`

// ---------------------------------------------------------------------------
// Output (LEDC PWM)
// ---------------------------------------------------------------------------
pub const LED_PWM_FREQ_HZ: u32 = 5_000;
pub const SPEAKER_IDLE_FREQ_HZ: u32 = 1_000;
pub const SPEAKER_PWM_RESOLUTION_BITS: u32 = 14;
pub const LEDC_SOURCE_CLOCK_HZ: u32 = 80_000_000; // APB clock
pub const LEDC_MAX_DIVIDER: u32 = 1023;           // integer part of the timer divider

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_tick_blocks_for_at_least_one_rtos_tick() {
        assert!(GAME_TICK_MS >= FREERTOS_TICK_MS);
        assert!(GAME_TICK_MS < TOUCH_DEBOUNCE_MS as u64);
        assert!((GAME_TICK_MS as u32) < MIN_RESPONSE_WINDOW_MS / 10);
    }
}
