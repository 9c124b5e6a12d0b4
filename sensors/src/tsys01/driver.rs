use embedded_hal::blocking::delay::DelayMs;

use super::{ADDRESS, CONVERSION_TIME_MS, CONVERT, PROM_WORDS, RESET};
use crate::bus::{BusError, SensorBus};
use crate::calibrated::CalibratedSensor;
use crate::error::{Error, Validation};

/// The eight PROM words of the TSYS01. Only words 1 to 4 enter the
/// conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration(pub [u16; PROM_WORDS]);

impl Calibration {
    /// Convert a raw ADC value to degrees Celsius.
    ///
    /// The steps run in integer arithmetic in exactly this order, the
    /// truncation of the division depends on it. Returns `None` when the
    /// divisor `C3 * adc` is zero.
    pub fn temperature(&self, adc: u32) -> Option<f32> {
        let [_, c1, c2, c3, c4, ..] = self.0.map(i64::from);
        let adc = adc as i64;

        let divisor = c3 * adc;
        if divisor == 0 {
            return None;
        }
        let mut temp = c1 * adc;
        temp -= c2 * 256_000;
        temp *= 100;
        temp /= divisor;
        temp -= c4 * 1000;
        Some(temp as f32 / 100.0)
    }
}

/// TSYS01 digital temperature sensor.
pub struct Tsys01<B, D> {
    sensor: CalibratedSensor<B, D, PROM_WORDS>,
}

impl<B: SensorBus, D: DelayMs<u32>> Tsys01<B, D> {
    pub fn new(bus: B, delay: D) -> Self {
        Self::with_address(bus, delay, ADDRESS)
    }

    /// Use `address` instead of [`ADDRESS`], see
    /// [`super::ALTERNATE_ADDRESS`].
    pub fn with_address(bus: B, delay: D, address: u8) -> Self {
        Self {
            sensor: CalibratedSensor::new(bus, delay, address, RESET),
        }
    }

    /// Reset the sensor and load its calibration. The TSYS01 PROM carries no
    /// checksum so this always reports [`Validation::Unchecked`].
    pub fn init(&mut self) -> Result<Validation, Error<BusError<B>>> {
        let validation = self.sensor.load(|_| Validation::Unchecked)?;
        info!("TSYS01 ready at {:#x}", self.sensor.address());
        Ok(validation)
    }

    pub fn is_ready(&self) -> bool {
        self.sensor.is_ready()
    }

    pub fn calibration(&self) -> Option<Calibration> {
        self.sensor.words().ok().map(|words| Calibration(*words))
    }

    pub fn read_raw(&mut self) -> Result<u32, Error<BusError<B>>> {
        self.sensor.convert(CONVERT, CONVERSION_TIME_MS)
    }

    /// Sample the temperature in degrees Celsius.
    pub fn read(&mut self) -> Result<f32, Error<BusError<B>>> {
        let calibration = Calibration(*self.sensor.words()?);
        let adc = self.read_raw()?;
        calibration
            .temperature(adc)
            .ok_or(Error::InvalidCalibration)
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
    use crate::tsys01::ALTERNATE_ADDRESS;
    use embedded_hal_mock::{
        delay::MockNoop,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
        MockError,
    };
    use std::io::ErrorKind;
    use std::vec::Vec;

    const PROM: [u16; 8] = [0, 28000, 9000, 3000, 2, 0x1111, 0x2222, 0x3333];

    fn init_transactions(address: u8, prom: &[u16; 8]) -> Vec<I2cTransaction> {
        let mut transactions = vec![I2cTransaction::write(address, vec![RESET])];
        for (i, word) in prom.iter().enumerate() {
            transactions.push(I2cTransaction::write(address, vec![PROM_READ + 2 * i as u8]));
            transactions.push(I2cTransaction::read(address, word.to_be_bytes().to_vec()));
        }
        transactions
    }

    fn sample_transactions(address: u8, raw: u32) -> [I2cTransaction; 3] {
        [
            I2cTransaction::write(address, vec![CONVERT]),
            I2cTransaction::write(address, vec![ADC_READ]),
            I2cTransaction::read(address, raw.to_be_bytes()[1..].to_vec()),
        ]
    }

    #[test]
    fn conversion_keeps_operation_order() {
        let calibration = Calibration([0, 100, 50, 10, 5, 0, 0, 0]);
        // ((100 * 1e6 - 50 * 256000) * 100 / (10 * 1e6) - 5 * 1000) / 100
        assert_eq!(calibration.temperature(1_000_000), Some(-41.28));
        let reference = ((100.0 * 1e6 - 50.0 * 256_000.0) * 100.0 / (10.0 * 1e6) - 5000.0) / 100.0;
        assert!((calibration.temperature(1_000_000).unwrap() - reference as f32).abs() < 0.01);
    }

    #[test]
    fn conversion_truncates_after_scaling() {
        let calibration = Calibration(PROM);
        // 24_969_600_000_000 / 27_000_000_000 = 924.8, truncated to 924
        assert_eq!(calibration.temperature(9_000_000), Some(-10.76));
    }

    #[test]
    fn conversion_with_zero_divisor() {
        let calibration = Calibration([0, 100, 50, 0, 5, 0, 0, 0]);
        assert_eq!(calibration.temperature(1_000_000), None);
    }

    #[test]
    fn init_reads_eight_words() {
        let mut tsys01 = Tsys01::new(
            I2cMock::new(&init_transactions(ADDRESS, &PROM)),
            MockNoop::new(),
        );

        assert_eq!(tsys01.init().unwrap(), Validation::Unchecked);
        assert!(tsys01.is_ready());
        assert_eq!(tsys01.calibration(), Some(Calibration(PROM)));

        let (mut i2c, _) = tsys01.release();
        i2c.done();
    }

    #[test]
    fn init_at_alternate_address() {
        let mut tsys01 = Tsys01::with_address(
            I2cMock::new(&init_transactions(ALTERNATE_ADDRESS, &PROM)),
            MockNoop::new(),
            ALTERNATE_ADDRESS,
        );

        tsys01.init().unwrap();

        let (mut i2c, _) = tsys01.release();
        i2c.done();
    }

    #[test]
    fn init_fails_mid_prom() {
        let mut transactions = init_transactions(ADDRESS, &PROM);
        // keep reset and words 0..5, fail the read of word 5
        transactions.truncate(1 + 2 * 5 + 1);
        transactions.push(
            I2cTransaction::read(ADDRESS, vec![0, 0]).with_error(MockError::Io(ErrorKind::Other)),
        );
        let mut tsys01 = Tsys01::new(I2cMock::new(&transactions), MockNoop::new());

        assert!(matches!(
            tsys01.init(),
            Err(Error::PromRead { index: 5, .. })
        ));
        assert!(!tsys01.is_ready());

        let (mut i2c, _) = tsys01.release();
        i2c.done();
    }

    #[test]
    fn read_before_init_issues_no_transaction() {
        let mut tsys01 = Tsys01::new(I2cMock::new(&[]), MockNoop::new());

        assert!(matches!(tsys01.read(), Err(Error::NotInitialized)));

        let (mut i2c, _) = tsys01.release();
        i2c.done();
    }

    #[test]
    fn read_temperature() {
        let mut transactions = init_transactions(ADDRESS, &PROM);
        transactions.extend(sample_transactions(ADDRESS, 9_000_000));
        let mut tsys01 = Tsys01::new(I2cMock::new(&transactions), MockNoop::new());

        tsys01.init().unwrap();
        assert_eq!(tsys01.read().unwrap(), -10.76);

        let (mut i2c, _) = tsys01.release();
        i2c.done();
    }

    #[test]
    fn zero_adc_fails_the_sample() {
        let mut transactions = init_transactions(ADDRESS, &PROM);
        transactions.extend(sample_transactions(ADDRESS, 0));
        let mut tsys01 = Tsys01::new(I2cMock::new(&transactions), MockNoop::new());

        tsys01.init().unwrap();
        assert!(matches!(tsys01.read(), Err(Error::AdcRead)));

        let (mut i2c, _) = tsys01.release();
        i2c.done();
    }

    #[test]
    fn invalid_calibration_fails_the_sample() {
        let mut prom = PROM;
        prom[3] = 0;
        let mut transactions = init_transactions(ADDRESS, &prom);
        transactions.extend(sample_transactions(ADDRESS, 9_000_000));
        let mut tsys01 = Tsys01::new(I2cMock::new(&transactions), MockNoop::new());

        tsys01.init().unwrap();
        assert!(matches!(tsys01.read(), Err(Error::InvalidCalibration)));

        let (mut i2c, _) = tsys01.release();
        i2c.done();
    }

    #[test]
    fn conversion_waits_ten_milliseconds() {
        let mut transactions = init_transactions(ADDRESS, &PROM);
        transactions.extend(sample_transactions(ADDRESS, 9_000_000));
        let mut tsys01 = Tsys01::new(I2cMock::new(&transactions), DelayRecorder::new());

        tsys01.init().unwrap();
        tsys01.read().unwrap();

        let (mut i2c, delay) = tsys01.release();
        assert_eq!(delay.0, [10, 10]);
        i2c.done();
    }
}
