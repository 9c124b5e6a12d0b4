use crate::error::Validation;

/// Factory calibration of the MS5837, PROM words 0 to 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Word 0. The top nibble carries the PROM checksum.
    pub factory: u16,
    /// C1, SENS_T1
    pub pressure_sensitivity: u16,
    /// C2, OFF_T1
    pub pressure_offset: u16,
    /// C3, TCS
    pub temperature_coefficient_of_pressure_sensitivity: u16,
    /// C4, TCO
    pub temperature_coefficient_of_pressure_offset: u16,
    /// C5, T_REF
    pub reference_temperature: u16,
    /// C6, TEMPSENS
    pub temperature_coefficient_of_temperature: u16,
}

impl From<&[u16; 7]> for Calibration {
    fn from(words: &[u16; 7]) -> Self {
        Self {
            factory: words[0],
            pressure_sensitivity: words[1],
            pressure_offset: words[2],
            temperature_coefficient_of_pressure_sensitivity: words[3],
            temperature_coefficient_of_pressure_offset: words[4],
            reference_temperature: words[5],
            temperature_coefficient_of_temperature: words[6],
        }
    }
}

/// Terms of the first order conversion. `temp` is in hundredths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstOrder {
    pub dt: i64,
    pub off: i64,
    pub sens: i64,
    pub temp: i64,
}

/// Corrections subtracted from [`FirstOrder`] at low temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondOrder {
    pub t2: i64,
    pub off2: i64,
    pub sens2: i64,
}

/// A compensated sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Degrees Celsius
    pub temperature: f32,
    /// Millibar
    pub pressure: f32,
}

impl Calibration {
    /// The checksum nibble programmed into word 0.
    pub fn stored_checksum(&self) -> u8 {
        (self.factory >> 12) as u8 & 0x0F
    }

    /// XOR of every byte of words 1 to 5, masked to 4 bits.
    pub fn computed_checksum(&self) -> u8 {
        [
            self.pressure_sensitivity,
            self.pressure_offset,
            self.temperature_coefficient_of_pressure_sensitivity,
            self.temperature_coefficient_of_pressure_offset,
            self.reference_temperature,
        ]
        .iter()
        .flat_map(|word| word.to_be_bytes())
        .fold(0u8, |acc, byte| acc ^ byte)
            & 0x0F
    }

    /// PROM validation hook for [`crate::calibrated::CalibratedSensor::load`].
    pub fn validate(words: &[u16; 7]) -> Validation {
        let calibration = Calibration::from(words);
        let stored = calibration.stored_checksum();
        let computed = calibration.computed_checksum();
        if stored == computed {
            Validation::Valid
        } else {
            Validation::Mismatch { stored, computed }
        }
    }

    pub fn first_order(&self, d2: u32) -> FirstOrder {
        let dt = d2 as i64 - self.reference_temperature as i64 * 256;
        let off = self.pressure_offset as i64 * 131_072
            + self.temperature_coefficient_of_pressure_offset as i64 * dt / 64;
        let sens = self.pressure_sensitivity as i64 * 65_536
            + self.temperature_coefficient_of_pressure_sensitivity as i64 * dt / 128;
        let temp = 2000 + dt * self.temperature_coefficient_of_temperature as i64 / 8_388_608;
        FirstOrder {
            dt,
            off,
            sens,
            temp,
        }
    }

    /// Convert raw pressure `d1` and raw temperature `d2`.
    pub fn compensate(&self, d1: u32, d2: u32) -> Measurement {
        let FirstOrder {
            dt,
            mut off,
            mut sens,
            mut temp,
        } = self.first_order(d2);

        if let Some(correction) = second_order(temp, dt) {
            temp -= correction.t2;
            off -= correction.off2;
            sens -= correction.sens2;
        }

        let pressure = d1 as i64 * sens / 2_097_152 - off;
        Measurement {
            temperature: temp as f32 / 100.0,
            pressure: (pressure as f64 / 32768.0 / 100.0) as f32,
        }
    }
}

/// Second order compensation for a first order `temp` below 20.00°C, `None`
/// otherwise. Below -15.00°C an extra term is added.
pub fn second_order(temp: i64, dt: i64) -> Option<SecondOrder> {
    if temp >= 2000 {
        return None;
    }
    let t2 = dt * dt / 2_147_483_648;
    let low = (temp - 2000) * (temp - 2000);
    let mut off2 = 61 * low / 16;
    let mut sens2 = 29 * low / 16;
    if temp < -1500 {
        let very_low = (temp + 1500) * (temp + 1500);
        off2 += 20 * very_low;
        sens2 += 12 * very_low;
    }
    Some(SecondOrder { t2, off2, sens2 })
}
