//! The reset / PROM readout / convert flow both sensors share.

use embedded_hal::blocking::delay::DelayMs;

use crate::bus::{self, BusError, SensorBus};
use crate::error::{Error, Validation};

/// First PROM word, word `i` lives at `PROM_READ + 2 * i`.
pub const PROM_READ: u8 = 0xA0;
/// Time the device needs to reload its PROM after a reset.
pub const RESET_SETTLE_MS: u32 = 10;

/// A sensor with `N` factory calibration words in PROM.
///
/// The calibration is read once by [`CalibratedSensor::load`] and never changes
/// afterwards. Until that succeeds every conversion fails with
/// [`Error::NotInitialized`] without touching the bus.
pub struct CalibratedSensor<B, D, const N: usize> {
    bus: B,
    delay: D,
    address: u8,
    reset: u8,
    calibration: Option<[u16; N]>,
}

impl<B: SensorBus, D: DelayMs<u32>, const N: usize> CalibratedSensor<B, D, N> {
    pub fn new(bus: B, delay: D, address: u8, reset: u8) -> Self {
        Self {
            bus,
            delay,
            address,
            reset,
            calibration: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn is_ready(&self) -> bool {
        self.calibration.is_some()
    }

    /// Reset the device and read its calibration words.
    ///
    /// `validate` checks the words once they are all in. A
    /// [`Validation::Mismatch`] is logged but the calibration is kept. Calling
    /// this on a ready sensor re-runs `validate` on the stored words and
    /// issues no bus traffic.
    pub fn load<F>(&mut self, validate: F) -> Result<Validation, Error<BusError<B>>>
    where
        F: FnOnce(&[u16; N]) -> Validation,
    {
        if let Some(words) = &self.calibration {
            return Ok(validate(words));
        }

        let address = self.address;
        bus::command(&mut self.bus, address, self.reset).map_err(Error::NotFound)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        let mut words = [0u16; N];
        for (index, word) in words.iter_mut().enumerate() {
            let index = index as u8;
            *word = bus::read_word(&mut self.bus, address, PROM_READ + index * 2)
                .map_err(|source| Error::PromRead { index, source })?;
        }
        debug!("Calibration words {:#x}: {:?}", address, words);

        let validation = validate(&words);
        if let Validation::Mismatch { stored, computed } = validation {
            warn!(
                "PROM checksum mismatch on {:#x} (stored {} != computed {}), sensor may be faulty",
                address,
                stored,
                computed
            );
        }
        self.calibration = Some(words);
        Ok(validation)
    }

    /// The loaded calibration words.
    pub fn words(&self) -> Result<&[u16; N], Error<BusError<B>>> {
        self.calibration.as_ref().ok_or(Error::NotInitialized)
    }

    /// Start a conversion with `command`, wait `settle_ms` and read the result.
    pub fn convert(&mut self, command: u8, settle_ms: u32) -> Result<u32, Error<BusError<B>>> {
        if self.calibration.is_none() {
            return Err(Error::NotInitialized);
        }
        bus::command(&mut self.bus, self.address, command).map_err(Error::Conversion)?;
        self.delay.delay_ms(settle_ms);
        match bus::read_adc(&mut self.bus, self.address) {
            0 => Err(Error::AdcRead),
            raw => {
                trace!("ADC {:#x} command {:#x}: {}", self.address, command, raw);
                Ok(raw)
            }
        }
    }

    /// Give back the bus and the delay, consuming the sensor.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }
}
