//! Drivers for an MS5837 pressure sensor and a TSYS01 temperature sensor
//! sharing one I2C bus.
//!
//! Both devices are reset, have their factory calibration read from PROM once,
//! and are then sampled by triggering a conversion, waiting for it to settle
//! and reading back a 24-bit raw value.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod bus;
pub mod calibrated;
pub mod error;
pub mod ms5837;
pub mod record;
pub mod tsys01;

#[cfg(test)]
mod mock_utils;

pub use calibrated::CalibratedSensor;
pub use error::{Error, Validation};
pub use ms5837::Ms5837;
pub use record::{ParseRecordError, Record};
pub use tsys01::Tsys01;
