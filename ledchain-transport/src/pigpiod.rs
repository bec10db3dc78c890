//! SPI through the pigpio daemon's socket interface.
//!
//! Every request is four little-endian `u32` words `cmd p1 p2 p3`, followed by
//! `p3` extension bytes for commands that carry a payload. The daemon answers
//! with four words whose last one is the signed result; negative results are
//! pigpio error codes.

use std::io::{Read, Write};
use std::net::TcpStream;

use ledchain_core::{error::transport_io, Transport, TransportError};

/// Open an SPI handle: `p1` channel, `p2` baud, extension = flags word.
pub const CMD_SPIO: u32 = 71;
/// Close an SPI handle: `p1` handle.
pub const CMD_SPIC: u32 = 72;
/// Write to an SPI handle: `p1` handle, extension = bytes.
pub const CMD_SPIW: u32 = 76;

/// SPI mode 0, main SPI peripheral, active-low chip-select.
const SPI_FLAGS: u32 = 0;

/// Encode one request.
pub fn encode_command(cmd: u32, p1: u32, p2: u32, ext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + ext.len());
    buf.extend_from_slice(&cmd.to_le_bytes());
    buf.extend_from_slice(&p1.to_le_bytes());
    buf.extend_from_slice(&p2.to_le_bytes());
    buf.extend_from_slice(&(ext.len() as u32).to_le_bytes());
    buf.extend_from_slice(ext);
    buf
}

/// A connection to pigpiod holding one open SPI handle.
pub struct PigpiodTransport {
    name: String,
    stream: TcpStream,
    channel: u32,
    baud: u32,
    handle: Option<u32>,
    verbose: bool,
}

impl PigpiodTransport {
    /// Connect to `host:port` and open SPI `channel` at `baud`.
    pub fn connect(host: &str, port: u16, channel: u32, baud: u32) -> Result<Self, TransportError> {
        let name = format!("pigpiod://{host}:{port}/spi{channel}");
        let stream = TcpStream::connect((host, port)).map_err(|e| transport_io(&name, e))?;
        stream.set_nodelay(true).map_err(|e| transport_io(&name, e))?;
        let mut transport = Self {
            name,
            stream,
            channel,
            baud,
            handle: None,
            verbose: false,
        };
        transport.open_handle()?;
        Ok(transport)
    }

    fn command(&mut self, cmd: u32, p1: u32, p2: u32, ext: &[u8]) -> Result<u32, TransportError> {
        let request = encode_command(cmd, p1, p2, ext);
        self.stream
            .write_all(&request)
            .map_err(|e| transport_io(&self.name, e))?;

        let mut response = [0u8; 16];
        self.stream
            .read_exact(&mut response)
            .map_err(|e| transport_io(&self.name, e))?;

        let echoed = u32::from_le_bytes([response[0], response[1], response[2], response[3]]);
        let status = i32::from_le_bytes([response[12], response[13], response[14], response[15]]);
        if echoed != cmd || status < 0 {
            return Err(TransportError::Daemon {
                command: cmd,
                status,
            });
        }
        Ok(status as u32)
    }

    fn open_handle(&mut self) -> Result<(), TransportError> {
        let handle = self.command(CMD_SPIO, self.channel, self.baud, &SPI_FLAGS.to_le_bytes())?;
        tracing::debug!(channel = %self.name, handle, baud = self.baud, "pigpio spi handle opened");
        self.handle = Some(handle);
        Ok(())
    }

    fn close_handle(&mut self) -> Result<(), TransportError> {
        if let Some(handle) = self.handle.take() {
            self.command(CMD_SPIC, handle, 0, &[])?;
            tracing::debug!(channel = %self.name, handle, "pigpio spi handle closed");
        }
        Ok(())
    }
}

impl Transport for PigpiodTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let handle = self
            .handle
            .ok_or_else(|| TransportError::NotOpen(self.name.clone()))?;
        if self.verbose {
            tracing::info!(channel = %self.name, frames = %crate::format_latch(bytes), "spi write");
        }
        let written = self.command(CMD_SPIW, handle, 0, bytes)? as usize;
        if written != bytes.len() {
            return Err(TransportError::ShortWrite {
                channel: self.name.clone(),
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    /// pigpio fixes the clock when a handle is opened, so a new rate means
    /// reopening the handle.
    fn set_baud_rate(&mut self, hz: u32) -> Result<(), TransportError> {
        if hz == self.baud && self.handle.is_some() {
            return Ok(());
        }
        self.close_handle()?;
        self.baud = hz;
        self.open_handle()
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn channel(&self) -> &str {
        &self.name
    }
}

impl Drop for PigpiodTransport {
    fn drop(&mut self) {
        if let Err(err) = self.close_handle() {
            tracing::warn!(channel = %self.name, error = %err, "failed to close pigpio spi handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Minimal fake pigpiod: answers each request with `result(cmd, p3)` and
    /// returns every request it saw once the client disconnects.
    fn fake_daemon(
        result: fn(u32, u32) -> i32,
    ) -> (u16, thread::JoinHandle<Vec<(u32, u32, u32, Vec<u8>)>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let join = thread::spawn(move || {
            let (mut sock, _) = listener.accept().expect("accept");
            let mut seen = Vec::new();
            loop {
                let mut header = [0u8; 16];
                if sock.read_exact(&mut header).is_err() {
                    break;
                }
                let word = |i: usize| {
                    u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]])
                };
                let (cmd, p1, p2, p3) = (word(0), word(4), word(8), word(12));
                let mut ext = vec![0u8; p3 as usize];
                sock.read_exact(&mut ext).expect("ext");
                let mut reply = header;
                reply[12..16].copy_from_slice(&result(cmd, p3).to_le_bytes());
                sock.write_all(&reply).expect("reply");
                seen.push((cmd, p1, p2, ext));
            }
            seen
        });
        (port, join)
    }

    fn well_behaved(cmd: u32, p3: u32) -> i32 {
        match cmd {
            CMD_SPIO => 3,
            CMD_SPIW => p3 as i32,
            _ => 0,
        }
    }

    #[test]
    fn encodes_little_endian_header() {
        let bytes = encode_command(CMD_SPIW, 3, 0, &[0xAA, 0xBB]);
        assert_eq!(&bytes[0..4], &76u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &3u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &2u32.to_le_bytes());
        assert_eq!(&bytes[16..], &[0xAA, 0xBB]);
    }

    #[test]
    fn opens_writes_and_closes() {
        let (port, join) = fake_daemon(well_behaved);
        {
            let mut t = PigpiodTransport::connect("127.0.0.1", port, 1, 500_000).expect("connect");
            t.write(&[0x0C, 0x01, 0x0C, 0x01]).expect("write");
        }
        let seen = join.join().expect("daemon thread");
        assert_eq!(seen.len(), 3);
        assert_eq!((seen[0].0, seen[0].1, seen[0].2), (CMD_SPIO, 1, 500_000));
        assert_eq!(seen[1].0, CMD_SPIW);
        assert_eq!(seen[1].1, 3);
        assert_eq!(seen[1].3, vec![0x0C, 0x01, 0x0C, 0x01]);
        assert_eq!((seen[2].0, seen[2].1), (CMD_SPIC, 3));
    }

    #[test]
    fn baud_change_reopens_handle() {
        let (port, join) = fake_daemon(well_behaved);
        {
            let mut t = PigpiodTransport::connect("127.0.0.1", port, 0, 500_000).expect("connect");
            t.set_baud_rate(500_000).expect("same rate");
            t.set_baud_rate(1_000_000).expect("new rate");
        }
        let cmds: Vec<_> = join
            .join()
            .expect("daemon thread")
            .into_iter()
            .map(|(cmd, _, p2, _)| (cmd, p2))
            .collect();
        assert_eq!(
            cmds,
            vec![
                (CMD_SPIO, 500_000),
                (CMD_SPIC, 0),
                (CMD_SPIO, 1_000_000),
                (CMD_SPIC, 0)
            ]
        );
    }

    #[test]
    fn partial_write_is_short_write() {
        let (port, join) = fake_daemon(|cmd, p3| match cmd {
            CMD_SPIO => 3,
            CMD_SPIW => p3 as i32 - 1,
            _ => 0,
        });
        {
            let mut t = PigpiodTransport::connect("127.0.0.1", port, 0, 500_000).expect("connect");
            let err = t.write(&[0x0C, 0x01, 0x0C, 0x01]).expect_err("short write");
            assert!(matches!(
                err,
                TransportError::ShortWrite {
                    written: 3,
                    expected: 4,
                    ..
                }
            ));
        }
        let seen = join.join().expect("daemon thread");
        assert_eq!(seen.last().map(|s| s.0), Some(CMD_SPIC));
    }

    #[test]
    fn negative_status_is_daemon_error() {
        let (port, join) = fake_daemon(|cmd, _| if cmd == CMD_SPIO { -73 } else { 0 });
        let err = PigpiodTransport::connect("127.0.0.1", port, 0, 500_000)
            .err()
            .expect("open must fail");
        assert!(matches!(
            err,
            TransportError::Daemon {
                command: CMD_SPIO,
                status: -73
            }
        ));
        join.join().expect("daemon thread");
    }
}
