//! Reads an MS5837 pressure sensor and a TSYS01 temperature sensor once per
//! second and writes one CSV-style line per successful cycle to USART1.

#![no_std]
#![no_main]

mod config;

use core::cell::RefCell;

use defmt::*;
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::{self, UartTx};
use embassy_sync::blocking_mutex::raw::{NoopRawMutex, ThreadModeRawMutex};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel as MessageChannel;
use embassy_time::{Delay, Duration, Timer};
use sensors::{Ms5837, Record, Tsys01};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

type SharedI2c = Mutex<NoopRawMutex, RefCell<I2c<'static, Blocking>>>;
type Bus = I2cDevice<'static, NoopRawMutex, I2c<'static, Blocking>>;

static I2C_BUS: StaticCell<SharedI2c> = StaticCell::new();
static RECORDS: MessageChannel<ThreadModeRawMutex, Record, 2> = MessageChannel::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Hello MS5837 + TSYS01!");
    let p = embassy_stm32::init(Default::default());

    let mut uart_config = usart::Config::default();
    uart_config.baudrate = config::UART_BAUD;
    let uart = unwrap!(UartTx::new_blocking(p.USART1, p.PA9, uart_config));
    unwrap!(spawner.spawn(report(uart)));

    let i2c = I2c::new_blocking(
        p.I2C3,
        p.PA8,
        p.PC9,
        config::I2C_FREQUENCY,
        Default::default(),
    );
    let bus: &'static SharedI2c = I2C_BUS.init(Mutex::new(RefCell::new(i2c)));

    let mut ms5837 = Ms5837::new(I2cDevice::new(bus), Delay);
    let mut tsys01 = Tsys01::new(I2cDevice::new(bus), Delay);

    match ms5837.init() {
        Ok(validation) => info!("MS5837 PROM: {}", validation),
        Err(e) => {
            error!("MS5837 initialization failed: {}", Debug2Format(&e));
            park().await;
        }
    }
    match tsys01.init() {
        Ok(validation) => info!("TSYS01 PROM: {}", validation),
        Err(e) => {
            error!("TSYS01 initialization failed: {}", Debug2Format(&e));
            park().await;
        }
    }

    info!("All sensors initialized successfully");
    Timer::after(config::STARTUP_DELAY).await;

    loop {
        if let Some(record) = sample(&mut ms5837, &mut tsys01) {
            RECORDS.send(record).await;
        }
        Timer::after(config::POLL_INTERVAL).await;
    }
}

/// One polling cycle. A failure on either sensor drops the whole cycle, the
/// next one is attempted after the usual interval.
fn sample(ms5837: &mut Ms5837<Bus, Delay>, tsys01: &mut Tsys01<Bus, Delay>) -> Option<Record> {
    let measurement = match ms5837.read() {
        Ok(measurement) => measurement,
        Err(e) => {
            error!("Error reading MS5837: {}", Debug2Format(&e));
            return None;
        }
    };
    let temperature = match tsys01.read() {
        Ok(temperature) => temperature,
        Err(e) => {
            error!("Error reading TSYS01: {}", Debug2Format(&e));
            return None;
        }
    };
    Some(Record::new(measurement, temperature))
}

#[embassy_executor::task]
async fn report(mut uart: UartTx<'static, Blocking>) {
    loop {
        let record = RECORDS.receive().await;
        debug!("{}", record);
        let line = match record.to_line() {
            Ok(line) => line,
            Err(_) => {
                error!("Record does not fit the line buffer");
                continue;
            }
        };
        if let Err(e) = uart.blocking_write(line.as_bytes()) {
            error!("UART write failed: {}", e);
        }
    }
}

/// A sensor that failed to come up stays down, idle instead of polling it.
async fn park() -> ! {
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
