//! Wire-level helpers shared by both drivers.
//!
//! The devices speak the same little command protocol: a single command byte
//! written in its own transaction, optionally followed by a separate read of the
//! response bytes.

use embedded_hal::blocking::i2c::{Read, Write};

/// Command that returns the result of the last conversion.
pub const ADC_READ: u8 = 0x00;

/// An I2C bus that can both write and read, with one error type for both.
pub trait SensorBus: Read + Write<Error = <Self as Read>::Error> {}

impl<T> SensorBus for T where T: Read + Write<Error = <T as Read>::Error> {}

/// Error type of a [`SensorBus`].
pub type BusError<B> = <B as Read>::Error;

/// Send a single command byte to `address`.
pub fn command<B: SensorBus>(bus: &mut B, address: u8, command: u8) -> Result<(), BusError<B>> {
    bus.write(address, &[command])
}

/// Request one big-endian 16-bit word from `address` with `command`.
pub fn read_word<B: SensorBus>(
    bus: &mut B,
    address: u8,
    command: u8,
) -> Result<u16, BusError<B>> {
    bus.write(address, &[command])?;
    let mut data = [0u8; 2];
    bus.read(address, &mut data)?;
    Ok(u16::from_be_bytes(data))
}

/// Read the 24-bit conversion result from `address`.
///
/// Returns 0 if any part of the exchange fails. A real conversion never
/// produces 0, so callers treat it as a failed read.
pub fn read_adc<B: SensorBus>(bus: &mut B, address: u8) -> u32 {
    if bus.write(address, &[ADC_READ]).is_err() {
        return 0;
    }
    // ADC is 24bit, the top byte stays zero
    let mut data = [0u8; 4];
    if bus.read(address, &mut data[1..]).is_err() {
        return 0;
    }
    u32::from_be_bytes(data)
}
