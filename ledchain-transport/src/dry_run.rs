//! Transport that prints latches instead of driving hardware.

use std::io::{self, Write};

use ledchain_core::{error::transport_io, Transport, TransportError};

/// Writes each latch as a line of hex frames, furthest chip first.
///
/// ```text
/// latch 1: 0f00 0f00 0f00
/// ```
pub struct DryRunTransport<W: Write = io::Stdout> {
    out: W,
    latches: usize,
    baud: u32,
}

impl DryRunTransport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DryRunTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            latches: 0,
            baud: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Transport for DryRunTransport<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.latches += 1;
        writeln!(self.out, "latch {}: {}", self.latches, crate::format_latch(bytes))
            .map_err(|e| transport_io("dry-run", e))
    }

    fn set_baud_rate(&mut self, hz: u32) -> Result<(), TransportError> {
        if hz != self.baud {
            tracing::debug!(hz, "dry-run baud rate");
        }
        self.baud = hz;
        Ok(())
    }

    fn set_verbose(&mut self, _verbose: bool) {}

    fn channel(&self) -> &str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_numbered_latches() {
        let mut t = DryRunTransport::new(Vec::new());
        t.write(&[0x0c, 0x01, 0x0c, 0x00]).unwrap();
        t.write(&[0x00, 0x00, 0x0a, 0x07]).unwrap();
        let text = String::from_utf8(t.into_inner()).unwrap();
        assert_eq!(text, "latch 1: 0c01 0c00\nlatch 2: 0000 0a07\n");
    }
}
