//! Concrete bus transports for a MAX7219 chain.
//!
//! - [`SpidevTransport`] — direct `/dev/spidevX.Y` access (Linux only)
//! - [`PigpiodTransport`] — SPI through the pigpio daemon's socket interface
//! - [`DryRunTransport`] — prints each latch instead of touching hardware
//! - [`MemoryTransport`] — records every latch; used by tests
//!
//! [`open`] picks one from a [`BusConfig`]; the caller owns the result and
//! hands it to the chain driver.

pub mod config;
mod dry_run;
mod memory;
pub mod pigpiod;
#[cfg(target_os = "linux")]
mod spidev;

pub use config::{BusConfig, TransportKind, DEFAULT_BAUD, DEFAULT_DEVICE, DEFAULT_PIGPIOD_PORT};
pub use dry_run::DryRunTransport;
pub use memory::MemoryTransport;
pub use pigpiod::PigpiodTransport;
#[cfg(target_os = "linux")]
pub use spidev::SpidevTransport;

use ledchain_core::{Transport, TransportError};

/// Open the transport described by `config`, apply its baud rate and
/// verbosity, and return it boxed.
pub fn open(config: &BusConfig) -> Result<Box<dyn Transport>, TransportError> {
    let mut transport: Box<dyn Transport> = match config.kind {
        TransportKind::Spidev => open_spidev(config)?,
        TransportKind::Pigpiod => Box::new(PigpiodTransport::connect(
            &config.host,
            config.port,
            config.channel,
            config.baud,
        )?),
        TransportKind::DryRun => Box::new(DryRunTransport::stdout()),
    };
    transport.set_baud_rate(config.baud)?;
    transport.set_verbose(config.verbose);
    tracing::debug!(
        kind = %config.kind,
        channel = transport.channel(),
        baud = config.baud,
        "transport opened"
    );
    Ok(transport)
}

#[cfg(target_os = "linux")]
fn open_spidev(config: &BusConfig) -> Result<Box<dyn Transport>, TransportError> {
    Ok(Box::new(SpidevTransport::open(&config.device)?))
}

#[cfg(not(target_os = "linux"))]
fn open_spidev(_config: &BusConfig) -> Result<Box<dyn Transport>, TransportError> {
    Err(TransportError::Unsupported(
        "spidev transport is only available on Linux".to_string(),
    ))
}

/// Frames of one latch as hex, wire order, one `addr data` pair per chip.
pub(crate) fn format_latch(bytes: &[u8]) -> String {
    bytes
        .chunks(2)
        .map(hex::encode)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_latch_groups_frames() {
        assert_eq!(format_latch(&[0x0c, 0x01, 0x00, 0x00]), "0c01 0000");
    }

    #[test]
    fn open_dry_run_applies_config() {
        let config = BusConfig {
            kind: TransportKind::DryRun,
            ..BusConfig::default()
        };
        let transport = open(&config).expect("open dry-run");
        assert_eq!(transport.channel(), "dry-run");
    }
}
