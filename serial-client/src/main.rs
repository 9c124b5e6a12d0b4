//! Host side of the probe: reads the report lines from the board's serial
//! port, prefixes each with the time it arrived and rebroadcasts it to every
//! connected TCP client.
//!
//! ```bash
//! # List available serial ports
//! cargo run -p serial-client -- --list-ports
//!
//! # Bridge /dev/ttyACM0 to port 8080, up to four clients, keeping a copy
//! cargo run -p serial-client -- --port /dev/ttyACM0 --max-conn 4 --record dive.log
//! ```
//!
//! Set `RUST_LOG=debug` to see every parsed reading.

mod bridge;
mod clients;
mod options;

use std::fs::OpenOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use log::{info, warn};

use clients::Clients;
use options::{Command, USAGE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match Command::parse(std::env::args().skip(1)) {
        Ok(Command::ListPorts) => {
            list_ports();
            return Ok(());
        }
        Ok(Command::Bridge(options)) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            return Err(e.into());
        }
    };

    let record = options
        .record
        .as_ref()
        .map(|path| OpenOptions::new().create(true).append(true).open(path))
        .transpose()?;

    let listener = TcpListener::bind(&options.listen)?;
    info!(
        "Listening on {} for up to {} client(s)",
        options.listen, options.max_connections
    );

    let clients = Arc::new(Clients::new(options.max_connections));
    {
        let clients = Arc::clone(&clients);
        let options = options.clone();
        thread::spawn(move || bridge::run(&options, &clients, record));
    }

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Accepting a connection failed: {}", e);
                continue;
            }
        };
        match clients.add(&stream) {
            Ok(true) => {
                let clients = Arc::clone(&clients);
                let port = options.port.clone();
                thread::spawn(move || {
                    if let Err(e) = clients::serve(stream, &clients, &port) {
                        warn!("Client connection failed: {}", e);
                    }
                });
            }
            // Dropping the stream closes it.
            Ok(false) => {}
            Err(e) => warn!("Cannot take the connection: {}", e),
        }
    }
    Ok(())
}

fn list_ports() {
    println!("Available serial ports:");
    match serialport::available_ports() {
        Ok(ports) if ports.is_empty() => println!("  (none)"),
        Ok(ports) => {
            for port in ports {
                match &port.port_type {
                    serialport::SerialPortType::UsbPort(info) => println!(
                        "  {} - USB (VID: 0x{:04x}, PID: 0x{:04x}) {}",
                        port.port_name,
                        info.vid,
                        info.pid,
                        info.product.as_deref().unwrap_or("")
                    ),
                    _ => println!("  {}", port.port_name),
                }
            }
        }
        Err(e) => eprintln!("Error listing ports: {}", e),
    }
}
