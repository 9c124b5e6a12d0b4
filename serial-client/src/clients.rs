//! TCP clients the readings are rebroadcast to.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{info, warn};

/// A client that stops reading is dropped instead of stalling the others.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

pub fn welcome(port: &str) -> String {
    format!("Connected to serial port {}. Waiting for data...\n", port)
}

/// The connected clients, capped at a fixed number.
pub struct Clients {
    streams: Mutex<HashMap<SocketAddr, TcpStream>>,
    max: usize,
}

impl Clients {
    pub fn new(max: usize) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            max,
        }
    }

    fn streams(&self) -> MutexGuard<'_, HashMap<SocketAddr, TcpStream>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.streams().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take `stream` into the broadcast set. Returns `false`, and leaves the
    /// set alone, when every slot is taken.
    pub fn add(&self, stream: &TcpStream) -> io::Result<bool> {
        let addr = stream.peer_addr()?;
        let mut streams = self.streams();
        if streams.len() >= self.max {
            warn!(
                "Connection limit of {} reached, rejecting {}",
                self.max, addr
            );
            return Ok(false);
        }
        let writer = stream.try_clone()?;
        writer.set_write_timeout(Some(WRITE_TIMEOUT))?;
        streams.insert(addr, writer);
        info!("Client connected: {} ({} active)", addr, streams.len());
        Ok(true)
    }

    pub fn remove(&self, addr: SocketAddr) {
        let mut streams = self.streams();
        if let Some(stream) = streams.remove(&addr) {
            let _ = stream.shutdown(Shutdown::Both);
            info!("Client disconnected: {} ({} active)", addr, streams.len());
        }
    }

    /// Write `data` to every client, dropping those the write fails for.
    /// Returns how many clients got it.
    pub fn broadcast(&self, data: &str) -> usize {
        let mut streams = self.streams();
        streams.retain(|addr, stream| match stream.write_all(data.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Sending to {} failed: {}", addr, e);
                let _ = stream.shutdown(Shutdown::Both);
                false
            }
        });
        streams.len()
    }
}

/// Greet an added client and hold its slot until it hangs up. Anything the
/// client sends is discarded.
pub fn serve(mut stream: TcpStream, clients: &Clients, port: &str) -> io::Result<()> {
    let addr = stream.peer_addr()?;
    let result = stream
        .write_all(welcome(port).as_bytes())
        .and_then(|_| drain(&mut stream));
    clients.remove(addr);
    result
}

fn drain(stream: &mut TcpStream) -> io::Result<()> {
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
