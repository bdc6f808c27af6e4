/*! Transport capability: a duplex byte channel with a per-read timeout.

Two real implementations are provided: [`SerialTransport`] (persistent,
one byte per `read_one()`) and [`DatagramTransport`] (socket recreated
per transaction, one `recv` per logical field). [`LoopbackTransport`]
is an in-process test double used by the FSM unit tests.
*/
use std::io::{Read, Write};
use std::net::UdpSocket;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{Error, Result};

/// A duplex, timeout-bounded byte channel.
///
/// `open()`/`close()` bracket the lifetime of the underlying OS
/// handle for transports that are transaction-scoped (Datagram); for
/// session-scoped transports (Serial) they are no-ops.
pub trait Transport {
    /// Write `bytes` to the peer.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read exactly one byte, blocking up to the configured timeout.
    fn read_one(&mut self) -> Result<u8>;

    /// Acquire any transaction-scoped OS resources.
    fn open(&mut self) -> Result<()>;

    /// Release any transaction-scoped OS resources.
    fn close(&mut self);
}

/// Serial transport: 8N1 at a fixed baud rate, opened once for the
/// session and held by the caller.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open a serial device at `path`, `baud` baud, with `timeout`
    /// applied to every `read_one()`.
    pub fn new(path: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .open()
            .map_err(|e| Error::TransportOpen(format!("{path}: {e}")))?;
        debug!("opened serial transport on {path} at {baud} baud");
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .map_err(|e| Error::TransportOpen(e.to_string()))
    }

    fn read_one(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        match self.port.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(Error::TransportTimeout),
            Err(e) => Err(Error::TransportOpen(e.to_string())),
        }
    }

    fn open(&mut self) -> Result<()> {
        // Session-scoped: nothing to do per transaction.
        Ok(())
    }

    fn close(&mut self) {
        // Session-scoped: released by the caller at teardown.
    }
}

/// Datagram transport: a new UDP socket is opened at the start of
/// every transaction and closed at every terminal state. Each logical
/// field the FSM requests corresponds to one independent `recv`.
pub struct DatagramTransport {
    peer: std::net::SocketAddr,
    timeout: Duration,
    socket: Option<UdpSocket>,
}

impl DatagramTransport {
    /// Create a transport that will talk to `peer`, with `timeout`
    /// applied to every `recv` in an open transaction.
    pub fn new(peer: std::net::SocketAddr, timeout: Duration) -> Self {
        Self {
            peer,
            timeout,
            socket: None,
        }
    }

    fn socket(&mut self) -> Result<&UdpSocket> {
        self.socket
            .as_ref()
            .ok_or_else(|| Error::TransportOpen("datagram socket not open".into()))
    }
}

impl Transport for DatagramTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let peer = self.peer;
        self.socket()?
            .send_to(bytes, peer)
            .map_err(|e| Error::TransportOpen(e.to_string()))?;
        Ok(())
    }

    fn read_one(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1024];
        let socket = self.socket()?;
        match socket.recv(&mut buf) {
            Ok(n) if n > 0 => Ok(buf[0]),
            Ok(_) => Err(Error::TransportTimeout),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Err(Error::TransportTimeout)
            }
            Err(e) => Err(Error::TransportOpen(e.to_string())),
        }
    }

    fn open(&mut self) -> Result<()> {
        let socket =
            UdpSocket::bind("0.0.0.0:0").map_err(|e| Error::TransportOpen(e.to_string()))?;
        socket
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| Error::TransportOpen(e.to_string()))?;
        socket
            .connect(self.peer)
            .map_err(|e| Error::TransportOpen(e.to_string()))?;
        debug!("opened datagram transport to {}", self.peer);
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("closed datagram transport to {}", self.peer);
        }
    }
}

/// In-process test double: a queue of bytes to read and a sink for
/// bytes written, with no real I/O. `open`/`close` are tracked for
/// assertions but otherwise no-ops.
#[derive(Default)]
pub struct LoopbackTransport {
    /// Bytes queued up to be returned by `read_one()`, front to back.
    pub to_read: std::collections::VecDeque<u8>,
    /// Every frame ever written, in order.
    pub written: Vec<Vec<u8>>,
    /// Number of times `open()` was called.
    pub opens: usize,
    /// Number of times `close()` was called.
    pub closes: usize,
}

impl LoopbackTransport {
    /// Create a loopback transport that will yield `bytes` in order
    /// from successive `read_one()` calls.
    pub fn with_bytes(bytes: &[u8]) -> Self {
        Self {
            to_read: bytes.iter().copied().collect(),
            ..Default::default()
        }
    }

    /// Queue additional bytes to be read.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.to_read.extend(bytes);
    }
}

impl Transport for LoopbackTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.written.push(bytes.to_vec());
        Ok(())
    }

    fn read_one(&mut self) -> Result<u8> {
        self.to_read.pop_front().ok_or_else(|| {
            warn!("loopback transport starved, returning timeout");
            Error::TransportTimeout
        })
    }

    fn open(&mut self) -> Result<()> {
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_reads_queued_bytes_in_order() {
        let mut t = LoopbackTransport::with_bytes(&[0x06, 0x01]);
        assert_eq!(t.read_one().unwrap(), 0x06);
        assert_eq!(t.read_one().unwrap(), 0x01);
        assert!(matches!(t.read_one(), Err(Error::TransportTimeout)));
    }

    #[test]
    fn loopback_records_writes() {
        let mut t = LoopbackTransport::default();
        t.write(b"[CG3]").unwrap();
        assert_eq!(t.written, vec![b"[CG3]".to_vec()]);
    }

    #[test]
    fn loopback_tracks_open_close() {
        let mut t = LoopbackTransport::default();
        t.open().unwrap();
        t.open().unwrap();
        t.close();
        assert_eq!(t.opens, 2);
        assert_eq!(t.closes, 1);
    }
}
