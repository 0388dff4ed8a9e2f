// ReflexCube - Hardware Drivers (ESP32-S3 only)

pub mod board;
pub mod imu;
pub mod light;
pub mod sound;

/// Milliseconds since boot (wraps at ~49 days; all users take differences).
pub fn now_ms() -> u32 {
    unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
}

/// Microseconds since boot, truncated to 32 bits.
pub fn now_us() -> u32 {
    unsafe { esp_idf_sys::esp_timer_get_time() as u32 }
}

/// Hardware entropy for sensor assignment.
pub fn random() -> u32 {
    unsafe { esp_idf_sys::esp_random() }
}
