// ReflexCube - BNO055 IMU Driver
//
// Register-level driver over the shared I2C bus.  Only the accelerometer is
// used; the chip runs in AMG mode (raw sensors, no fusion).

use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use esp_idf_hal::i2c::I2cDriver;

use crate::config::*;
use crate::events::AccelSample;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

// BNO055 register addresses (page 0 unless noted)
const REG_CHIP_ID: u8 = 0x00;
const REG_PAGE_ID: u8 = 0x07;
const REG_ACC_DATA_X_LSB: u8 = 0x08; // start of 6-byte accel burst
const REG_UNIT_SEL: u8 = 0x3B;
const REG_OPR_MODE: u8 = 0x3D;
const REG_PWR_MODE: u8 = 0x3E;
const REG_SYS_TRIGGER: u8 = 0x3F;
const REG_ACC_CONFIG: u8 = 0x08; // page 1

const CHIP_ID_EXPECTED: u8 = 0xA0;
const OPR_MODE_CONFIG: u8 = 0x00;
const OPR_MODE_AMG: u8 = 0x07;
const PWR_MODE_NORMAL: u8 = 0x00;
const SYS_TRIGGER_RESET: u8 = 0x20;
const ACC_CONFIG_2G_62HZ: u8 = 0x0C;
const UNIT_SEL_DEFAULT: u8 = 0x00; // m/s^2, 100 LSB per m/s^2

pub struct Bno055 {
    bus: SharedBus,
}

impl Bno055 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    fn bus(&self) -> anyhow::Result<MutexGuard<'_, I2cDriver<'static>>> {
        self.bus.lock().map_err(|_| anyhow!("I2C bus mutex poisoned"))
    }

    fn write_reg(&self, reg: u8, value: u8) -> anyhow::Result<()> {
        self.bus()?
            .write(I2C_ADDR_BNO055, &[reg, value], I2C_TIMEOUT_TICKS)
            .with_context(|| format!("BNO055 write to register {:#04x}", reg))?;
        Ok(())
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let Ok(mut bus) = self.bus() else {
            return false;
        };
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_BNO055, &[REG_CHIP_ID], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == CHIP_ID_EXPECTED,
            Err(_) => false,
        }
    }

    /// Reset the chip and configure the accelerometer (±2 g, 62.5 Hz).
    pub fn init(&self) -> anyhow::Result<()> {
        // Reset so a reflash never finds the chip in a half-configured mode.
        self.write_reg(REG_SYS_TRIGGER, SYS_TRIGGER_RESET)?;
        thread::sleep(Duration::from_millis(700));

        if !self.is_connected() {
            bail!("BNO055 not found at {:#04x}", I2C_ADDR_BNO055);
        }

        self.write_reg(REG_OPR_MODE, OPR_MODE_CONFIG)?;
        thread::sleep(Duration::from_millis(25)); // mode switch needs > 19 ms
        self.write_reg(REG_PWR_MODE, PWR_MODE_NORMAL)?;

        self.write_reg(REG_PAGE_ID, 1)?;
        self.write_reg(REG_ACC_CONFIG, ACC_CONFIG_2G_62HZ)?;
        self.write_reg(REG_PAGE_ID, 0)?;

        thread::sleep(Duration::from_millis(20));
        self.write_reg(REG_UNIT_SEL, UNIT_SEL_DEFAULT)?;
        self.write_reg(REG_OPR_MODE, OPR_MODE_AMG)?;
        thread::sleep(Duration::from_millis(30));

        log::info!("BNO055 initialised (AMG, ±2g)");
        Ok(())
    }

    /// Burst-read the three accelerometer axes.
    pub fn read_accel(&self) -> anyhow::Result<AccelSample> {
        let mut raw = [0u8; 6];
        self.bus()?.write_read(
            I2C_ADDR_BNO055,
            &[REG_ACC_DATA_X_LSB],
            &mut raw,
            I2C_TIMEOUT_TICKS,
        )?;

        Ok(AccelSample::new(
            i16::from_le_bytes([raw[0], raw[1]]),
            i16::from_le_bytes([raw[2], raw[3]]),
            i16::from_le_bytes([raw[4], raw[5]]),
        ))
    }
}
