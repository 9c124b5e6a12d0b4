//! Bus bring-up helper: every press of the user button resets both sensor
//! addresses and reports which ones acknowledge.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Pull;
use embassy_stm32::i2c::{Error, I2c};
use embassy_stm32::time::Hertz;
use sensors::{bus, ms5837, tsys01};
use {defmt_rtt as _, panic_probe as _};

const SENSORS: [(&str, u8, u8); 2] = [
    ("MS5837", ms5837::ADDRESS, ms5837::RESET),
    ("TSYS01", tsys01::ADDRESS, tsys01::RESET),
];

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Hello sensor probe!");
    let p = embassy_stm32::init(Default::default());

    let mut button = ExtiInput::new(p.PA0, p.EXTI0, Pull::Down);
    let mut i2c = I2c::new_blocking(p.I2C3, p.PA8, p.PC9, Hertz(100_000), Default::default());

    loop {
        button.wait_for_rising_edge().await;
        for (name, address, reset) in SENSORS {
            match bus::command(&mut i2c, address, reset) {
                Ok(()) => info!("{} answered at {:#x}", name, address),
                Err(Error::Nack) => warn!("{} not found at {:#x}", name, address),
                Err(Error::Timeout) => error!("Operation timed out"),
                Err(e) => error!("I2c Error: {:?}", e),
            }
        }
    }
}
