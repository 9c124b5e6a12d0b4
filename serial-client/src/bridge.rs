//! Serial side of the bridge: read report lines, stamp them and pass them on.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, warn};
use sensors::Record;

use crate::clients::Clients;
use crate::options::Options;

/// Wait before trying to open the port again.
pub const OPEN_RETRY: Duration = Duration::from_secs(5);
/// Wait before reopening after the port closed or failed.
pub const READ_RETRY: Duration = Duration::from_secs(2);
/// A read that times out is retried, it does not close the port.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Prefix `line` with a `YYYYMMDDhhmmss` timestamp and a tab.
pub fn stamp(at: NaiveDateTime, line: &str) -> String {
    format!("{}\t{}\n", at.format("%Y%m%d%H%M%S"), line)
}

/// Where the stamped lines go.
pub struct Sink<'a, W> {
    clients: &'a Clients,
    record: Option<W>,
}

impl<'a, W: Write> Sink<'a, W> {
    pub fn new(clients: &'a Clients, record: Option<W>) -> Self {
        Self { clients, record }
    }

    /// Stamp one line read at `at` and deliver it. Blank lines are dropped,
    /// lines that are not readings are passed on as they are.
    pub fn line(&mut self, at: NaiveDateTime, raw: &str) {
        let line = raw.trim_end_matches(&['\r', '\n'][..]);
        if line.trim().is_empty() {
            return;
        }
        match line.parse::<Record>() {
            Ok(record) => debug!("{:?}", record),
            Err(e) => warn!("Forwarding unrecognised line {:?}: {}", line, e),
        }

        let stamped = stamp(at, line);
        if let Some(file) = &mut self.record {
            if let Err(e) = file
                .write_all(stamped.as_bytes())
                .and_then(|_| file.flush())
            {
                error!("Recording failed: {}", e);
            }
        }
        if !self.clients.is_empty() {
            let sent = self.clients.broadcast(&stamped);
            info!("Sent to {} client(s): {}", sent, line);
        }
    }

    #[cfg(test)]
    pub fn into_record(self) -> Option<W> {
        self.record
    }
}

/// Deliver every line `reader` yields until it ends or fails. Read timeouts
/// keep the partial line and carry on.
pub fn forward<R, W, C>(mut reader: R, sink: &mut Sink<'_, W>, mut clock: C) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    C: FnMut() -> NaiveDateTime,
{
    let mut buf = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut buf) {
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e),
            Ok(_) => {
                let eof = !buf.ends_with(b"\n");
                if !buf.is_empty() {
                    sink.line(clock(), &String::from_utf8_lossy(&buf));
                    buf.clear();
                }
                if eof {
                    return Ok(());
                }
            }
        }
    }
}

/// Keep the serial port open and forward what it reads, forever.
pub fn run(options: &Options, clients: &Clients, record: Option<File>) {
    let mut sink = Sink::new(clients, record);
    loop {
        let port = match serialport::new(&options.port, options.baud)
            .timeout(READ_TIMEOUT)
            .flow_control(serialport::FlowControl::None)
            .open()
        {
            Ok(port) => port,
            Err(e) => {
                warn!(
                    "Cannot open serial port {}: {}, retrying in {}s",
                    options.port,
                    e,
                    OPEN_RETRY.as_secs()
                );
                thread::sleep(OPEN_RETRY);
                continue;
            }
        };
        info!("Serial port {} opened at {} baud", options.port, options.baud);

        match forward(BufReader::new(port), &mut sink, || Local::now().naive_local()) {
            Ok(()) => info!("Serial port {} closed", options.port),
            Err(e) => warn!("Reading serial port {} failed: {}", options.port, e),
        }
        info!(
            "Reconnecting to {} in {}s",
            options.port,
            READ_RETRY.as_secs()
        );
        thread::sleep(READ_RETRY);
    }
}
