// ReflexCube - Library Root
//
// Game logic, sensor decoding and output rendering are hardware independent
// and build on the host; the drivers and the game task need ESP-IDF.

pub mod config;
pub mod events;
pub mod fault;
pub mod game;
pub mod input;
pub mod output;
pub mod sensors;

#[cfg(target_os = "espidf")]
pub mod drivers;
#[cfg(target_os = "espidf")]
pub mod tasks;
