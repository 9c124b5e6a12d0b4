/// Errors reported by the sensor drivers.
///
/// `E` is the error type of the underlying bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The reset command was not acknowledged, nothing answers at the address.
    NotFound(E),
    /// Reading calibration word `index` from the PROM failed.
    PromRead { index: u8, source: E },
    /// Sampling was attempted before the calibration was loaded.
    NotInitialized,
    /// The conversion command could not be sent.
    Conversion(E),
    /// The ADC read came back as the zero sentinel.
    AdcRead,
    /// The calibration words make the conversion formula undefined.
    InvalidCalibration,
}

/// Outcome of the PROM validation hook run after a calibration load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validation {
    /// The device has no checksum to compare against.
    Unchecked,
    Valid,
    /// The stored checksum disagrees with the computed one. The calibration is
    /// still loaded and used.
    Mismatch { stored: u8, computed: u8 },
}

impl Validation {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Validation::Mismatch { .. })
    }
}
