// ReflexCube - Repeated Fault Suppression
//
// Actuator writes happen every game tick; an output's fault is reported only
// when it first appears or changes.

#[derive(Debug, Default)]
pub struct FaultLatch {
    last: Option<String>,
}

impl FaultLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the error message if it differs from the previous failure.
    /// A success clears the latch, so a fault that comes back is reported again.
    pub fn check(&mut self, result: anyhow::Result<()>) -> Option<String> {
        match result {
            Ok(()) => {
                if self.last.take().is_some() {
                    log::info!("Output recovered");
                }
                None
            }
            Err(e) => {
                let message = format!("{:#}", e);
                if self.last.as_deref() == Some(message.as_str()) {
                    return None;
                }
                self.last = Some(message.clone());
                Some(message)
            }
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.last.is_some()
    }
}
