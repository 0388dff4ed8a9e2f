pub mod arbiter;
pub mod echo;
pub mod filters;
pub mod quadrature;

pub use arbiter::{SensorArbiter, SensorBank};
pub use echo::{EchoRangefinder, TriggerCycle};
pub use quadrature::{Channel, QuadratureDecoder};
