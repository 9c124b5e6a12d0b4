use embedded_hal::blocking::delay::DelayMs;
use std::vec::Vec;

/// Delay that sleeps for nothing and keeps every requested duration.
#[derive(Debug, Default)]
pub struct DelayRecorder(pub Vec<u32>);

impl DelayRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayMs<u32> for DelayRecorder {
    fn delay_ms(&mut self, ms: u32) {
        self.0.push(ms);
    }
}
