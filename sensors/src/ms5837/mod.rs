//! MS5837 pressure and temperature sensor.
//!
//! Conversions run at the lowest oversampling ratio (256), which settles
//! within a millisecond.

mod compensation;
mod driver;

pub use compensation::{second_order, Calibration, FirstOrder, Measurement, SecondOrder};
pub use driver::Ms5837;

/// 7-bit address with CSB tied low.
pub const ADDRESS: u8 = 0x76;
pub const RESET: u8 = 0x1E;
pub const CONVERT_D1_256: u8 = 0x40;
pub const CONVERT_D2_256: u8 = 0x50;
pub const CONVERSION_TIME_MS: u32 = 1;
pub const PROM_WORDS: usize = 7;
