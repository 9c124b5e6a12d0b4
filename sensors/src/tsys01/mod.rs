//! TSYS01 temperature sensor.

mod driver;

pub use driver::{Calibration, Tsys01};

/// 7-bit address with the address pin high.
pub const ADDRESS: u8 = 0x77;
/// Address with the address pin tied low.
pub const ALTERNATE_ADDRESS: u8 = 0x76;
pub const RESET: u8 = 0xFE;
pub const CONVERT: u8 = 0x48;
pub const CONVERSION_TIME_MS: u32 = 10;
pub const PROM_WORDS: usize = 8;
