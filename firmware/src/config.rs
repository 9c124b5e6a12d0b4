//! Board wiring and polling cadence.

use embassy_stm32::time::Hertz;
use embassy_time::Duration;

/// Both sensors share I2C3 (PA8 = SCL, PC9 = SDA).
pub const I2C_FREQUENCY: Hertz = Hertz(100_000);
/// USART1 TX on PA9 is routed to the ST-LINK virtual COM port.
pub const UART_BAUD: u32 = 9600;
pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Pause between a successful start-up and the first sample.
pub const STARTUP_DELAY: Duration = Duration::from_millis(1000);
