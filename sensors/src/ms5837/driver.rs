use embedded_hal::blocking::delay::DelayMs;

use super::compensation::{Calibration, Measurement};
use super::{ADDRESS, CONVERSION_TIME_MS, CONVERT_D1_256, CONVERT_D2_256, PROM_WORDS, RESET};
use crate::bus::{BusError, SensorBus};
use crate::calibrated::CalibratedSensor;
use crate::error::{Error, Validation};

/// MS5837 pressure and temperature sensor.
pub struct Ms5837<B, D> {
    sensor: CalibratedSensor<B, D, PROM_WORDS>,
}

impl<B: SensorBus, D: DelayMs<u32>> Ms5837<B, D> {
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            sensor: CalibratedSensor::new(bus, delay, ADDRESS, RESET),
        }
    }

    /// Reset the sensor and load its calibration.
    ///
    /// A checksum mismatch does not fail initialisation, it is returned as
    /// [`Validation::Mismatch`] and the calibration is used anyway.
    pub fn init(&mut self) -> Result<Validation, Error<BusError<B>>> {
        let validation = self.sensor.load(Calibration::validate)?;
        info!("MS5837 ready");
        Ok(validation)
    }

    pub fn is_ready(&self) -> bool {
        self.sensor.is_ready()
    }

    pub fn calibration(&self) -> Option<Calibration> {
        self.sensor.words().ok().map(Calibration::from)
    }

    /// Read the raw pressure (D1) and temperature (D2) conversions, in that
    /// order.
    pub fn read_raw(&mut self) -> Result<(u32, u32), Error<BusError<B>>> {
        let d1 = self.sensor.convert(CONVERT_D1_256, CONVERSION_TIME_MS)?;
        let d2 = self.sensor.convert(CONVERT_D2_256, CONVERSION_TIME_MS)?;
        Ok((d1, d2))
    }

    /// Sample and compensate temperature and pressure.
    pub fn read(&mut self) -> Result<Measurement, Error<BusError<B>>> {
        let calibration = Calibration::from(self.sensor.words()?);
        let (d1, d2) = self.read_raw()?;
        Ok(calibration.compensate(d1, d2))
    }

    pub fn release(self) -> (B, D) {
        self.sensor.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ADC_READ;
    use crate::calibrated::PROM_READ;
    use crate::mock_utils::DelayRecorder;
    use embedded_hal_mock::{
        delay::MockNoop,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
        MockError,
    };
    use std::io::ErrorKind;
    use std::vec::Vec;

    const PROM: [u16; 7] = [0x0ABC, 40000, 36000, 23000, 23000, 32768, 28000];

    fn init_transactions(prom: &[u16; 7]) -> Vec<I2cTransaction> {
        let mut transactions = vec![I2cTransaction::write(ADDRESS, vec![RESET])];
        for (i, word) in prom.iter().enumerate() {
            transactions.push(I2cTransaction::write(ADDRESS, vec![PROM_READ + 2 * i as u8]));
            transactions.push(I2cTransaction::read(ADDRESS, word.to_be_bytes().to_vec()));
        }
        transactions
    }

    fn sample_transactions(command: u8, raw: u32) -> [I2cTransaction; 3] {
        [
            I2cTransaction::write(ADDRESS, vec![command]),
            I2cTransaction::write(ADDRESS, vec![ADC_READ]),
            I2cTransaction::read(ADDRESS, raw.to_be_bytes()[1..].to_vec()),
        ]
    }

    #[test]
    fn init_with_valid_checksum() {
        let mut ms5837 = Ms5837::new(I2cMock::new(&init_transactions(&PROM)), MockNoop::new());

        assert_eq!(ms5837.init().unwrap(), Validation::Valid);
        assert!(ms5837.is_ready());
        let calibration = ms5837.calibration().unwrap();
        assert_eq!(calibration.pressure_sensitivity, 40000);
        assert_eq!(calibration.temperature_coefficient_of_temperature, 28000);

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn init_with_corrupted_checksum_still_succeeds() {
        let mut prom = PROM;
        prom[0] = 0xFABC;
        let mut ms5837 = Ms5837::new(I2cMock::new(&init_transactions(&prom)), MockNoop::new());

        assert_eq!(
            ms5837.init().unwrap(),
            Validation::Mismatch {
                stored: 0xF,
                computed: 0,
            }
        );
        assert!(ms5837.is_ready());

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn init_without_sensor() {
        let i2c = I2cMock::new(&[I2cTransaction::write(ADDRESS, vec![RESET])
            .with_error(MockError::Io(ErrorKind::Other))]);
        let mut ms5837 = Ms5837::new(i2c, MockNoop::new());

        assert!(matches!(ms5837.init(), Err(Error::NotFound(_))));
        assert!(!ms5837.is_ready());
        assert_eq!(ms5837.calibration(), None);

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn read_before_init_issues_no_transaction() {
        let mut ms5837 = Ms5837::new(I2cMock::new(&[]), MockNoop::new());

        assert!(matches!(ms5837.read(), Err(Error::NotInitialized)));
        assert!(matches!(ms5837.read_raw(), Err(Error::NotInitialized)));

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn read_pressure_then_temperature() {
        let mut transactions = init_transactions(&PROM);
        transactions.extend(sample_transactions(CONVERT_D1_256, 6_000_000));
        transactions.extend(sample_transactions(CONVERT_D2_256, 8_000_000));
        let mut ms5837 = Ms5837::new(I2cMock::new(&transactions), MockNoop::new());

        ms5837.init().unwrap();
        let m = ms5837.read().unwrap();
        assert_eq!(m.temperature, 6.33);
        assert!((m.pressure - 829.765_2).abs() < 1e-3);

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn zero_d1_aborts_before_d2() {
        let mut transactions = init_transactions(&PROM);
        transactions.extend(sample_transactions(CONVERT_D1_256, 0));
        let mut ms5837 = Ms5837::new(I2cMock::new(&transactions), MockNoop::new());

        ms5837.init().unwrap();
        assert!(matches!(ms5837.read(), Err(Error::AdcRead)));

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn zero_d2_fails_the_sample() {
        let mut transactions = init_transactions(&PROM);
        transactions.extend(sample_transactions(CONVERT_D1_256, 6_000_000));
        transactions.extend(sample_transactions(CONVERT_D2_256, 0));
        let mut ms5837 = Ms5837::new(I2cMock::new(&transactions), MockNoop::new());

        ms5837.init().unwrap();
        assert!(matches!(ms5837.read(), Err(Error::AdcRead)));

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn adc_read_error_fails_the_sample() {
        let mut transactions = init_transactions(&PROM);
        transactions.push(I2cTransaction::write(ADDRESS, vec![CONVERT_D1_256]));
        transactions.push(
            I2cTransaction::write(ADDRESS, vec![ADC_READ])
                .with_error(MockError::Io(ErrorKind::Other)),
        );
        let mut ms5837 = Ms5837::new(I2cMock::new(&transactions), MockNoop::new());

        ms5837.init().unwrap();
        assert!(matches!(ms5837.read(), Err(Error::AdcRead)));

        let (mut i2c, _) = ms5837.release();
        i2c.done();
    }

    #[test]
    fn each_conversion_waits_for_the_adc() {
        let mut transactions = init_transactions(&PROM);
        transactions.extend(sample_transactions(CONVERT_D1_256, 6_000_000));
        transactions.extend(sample_transactions(CONVERT_D2_256, 8_000_000));
        let mut ms5837 = Ms5837::new(I2cMock::new(&transactions), DelayRecorder::new());

        ms5837.init().unwrap();
        ms5837.read().unwrap();

        let (mut i2c, delay) = ms5837.release();
        assert_eq!(delay.0, [10, 1, 1]);
        i2c.done();
    }
}
