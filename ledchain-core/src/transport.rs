//! The bus capability the chain driver writes through.
//!
//! Concrete transports (spidev, pigpiod, in-memory) live in
//! `ledchain-transport`; the driver only sees this trait and receives its
//! transport from the caller.

use crate::error::TransportError;

/// A serial bus channel that clocks out byte frames.
pub trait Transport {
    /// Send `bytes` as one chip-select cycle.
    ///
    /// Either every byte is clocked out or an error is returned; callers never
    /// observe a partial write.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Change the bus clock rate.
    fn set_baud_rate(&mut self, hz: u32) -> Result<(), TransportError>;

    /// Toggle per-write frame logging.
    fn set_verbose(&mut self, verbose: bool);

    /// Human-readable channel name used in logs and errors.
    fn channel(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn set_baud_rate(&mut self, hz: u32) -> Result<(), TransportError> {
        (**self).set_baud_rate(hz)
    }

    fn set_verbose(&mut self, verbose: bool) {
        (**self).set_verbose(verbose)
    }

    fn channel(&self) -> &str {
        (**self).channel()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn set_baud_rate(&mut self, hz: u32) -> Result<(), TransportError> {
        (**self).set_baud_rate(hz)
    }

    fn set_verbose(&mut self, verbose: bool) {
        (**self).set_verbose(verbose)
    }

    fn channel(&self) -> &str {
        (**self).channel()
    }
}
