//! Direct access to a kernel spidev node.

use std::io::Write;

use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};

use ledchain_core::{error::transport_io, Transport, TransportError};

/// SPI mode 0, 8-bit words, MSB first; one `write(2)` per latch so the
/// kernel keeps chip-select asserted for the whole chain.
pub struct SpidevTransport {
    device: String,
    spi: Spidev,
    verbose: bool,
}

impl SpidevTransport {
    pub fn open(device: &str) -> Result<Self, TransportError> {
        let spi = Spidev::open(device).map_err(|e| transport_io(device, e))?;
        let mut transport = Self {
            device: device.to_string(),
            spi,
            verbose: false,
        };
        transport.configure(crate::DEFAULT_BAUD)?;
        Ok(transport)
    }

    fn configure(&mut self, hz: u32) -> Result<(), TransportError> {
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        self.spi
            .configure(&options)
            .map_err(|e| transport_io(&self.device, e))
    }
}

impl Transport for SpidevTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.verbose {
            tracing::info!(device = %self.device, frames = %crate::format_latch(bytes), "spi write");
        }
        let written = self
            .spi
            .write(bytes)
            .map_err(|e| transport_io(&self.device, e))?;
        if written != bytes.len() {
            return Err(TransportError::ShortWrite {
                channel: self.device.clone(),
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    fn set_baud_rate(&mut self, hz: u32) -> Result<(), TransportError> {
        self.configure(hz)
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn channel(&self) -> &str {
        &self.device
    }
}
