// ReflexCube - Firmware Entry Point
//
// Boot sequence:
//   1. Give the serial console time to attach.
//   2. Bring up the shared I2C bus and the BNO055 (fatal on failure).
//   3. Set up the sensor board, RGB LED and speaker.
//   4. Spawn the game task; the main thread parks.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::{InputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use reflexcube::config::*;
    use reflexcube::drivers::board::Board;
    use reflexcube::drivers::imu::Bno055;
    use reflexcube::drivers::light::RgbLed;
    use reflexcube::drivers::sound::Speaker;
    use reflexcube::tasks;

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    thread::sleep(Duration::from_millis(BOOT_SETTLE_MS));
    log::info!("ReflexCube firmware starting");

    let peripherals = Peripherals::take()?;

    // ---- I2C bus (IMU) ----------------------------------------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8, // SDA
        peripherals.pins.gpio9, // SCL
        &i2c_config,
    )?;
    let i2c_bus: &'static Mutex<I2cDriver<'static>> = Box::leak(Box::new(Mutex::new(i2c)));

    let imu = Bno055::new(i2c_bus);
    if let Err(e) = imu.init() {
        log::error!("IMU init failed, game will not start: {:#}", e);
        return Err(e);
    }

    // ---- Inputs -----------------------------------------------------------
    let touch = PinDriver::input(peripherals.pins.gpio4.downgrade_input())?;
    let infrared = PinDriver::input(peripherals.pins.gpio5.downgrade_input())?;
    let board = Board::new(imu, touch, infrared)?;

    // ---- Outputs ----------------------------------------------------------
    let led = RgbLed::new(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.ledc.channel1,
        peripherals.ledc.channel2,
        peripherals.pins.gpio10,
        peripherals.pins.gpio11,
        peripherals.pins.gpio12,
    )?;
    let speaker = Speaker::new(
        peripherals.ledc.timer1,
        peripherals.ledc.channel3,
        peripherals.pins.gpio13,
    )?;

    thread::Builder::new()
        .name("game".into())
        .stack_size(STACK_GAME)
        .spawn(move || tasks::game::game_task(board, led, speaker))?;

    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("reflexcube is ESP32-S3 firmware; build it for the espidf target.");
    std::process::exit(1);
}
