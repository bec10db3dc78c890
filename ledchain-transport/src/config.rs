//! Bus selection and settings.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BAUD: u32 = 500_000;
pub const DEFAULT_DEVICE: &str = "/dev/spidev0.0";
pub const DEFAULT_PIGPIOD_HOST: &str = "localhost";
pub const DEFAULT_PIGPIOD_PORT: u16 = 8888;

/// Which transport implementation drives the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// Talk to the pigpio daemon over TCP.
    #[default]
    Pigpiod,
    /// Open the kernel spidev node directly.
    Spidev,
    /// Print latches to stdout.
    DryRun,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Pigpiod => write!(f, "pigpiod"),
            TransportKind::Spidev => write!(f, "spidev"),
            TransportKind::DryRun => write!(f, "dry-run"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pigpiod" => Ok(Self::Pigpiod),
            "spidev" => Ok(Self::Spidev),
            "dry-run" | "dryrun" => Ok(Self::DryRun),
            other => Err(format!(
                "unknown transport '{other}'; expected: pigpiod, spidev, dry-run"
            )),
        }
    }
}

/// Everything needed to open one SPI channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub kind: TransportKind,
    /// spidev node, e.g. `/dev/spidev0.0`.
    pub device: String,
    /// pigpio SPI channel (chip-select line).
    pub channel: u32,
    pub host: String,
    pub port: u16,
    pub baud: u32,
    pub verbose: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            device: DEFAULT_DEVICE.to_string(),
            channel: 0,
            host: DEFAULT_PIGPIOD_HOST.to_string(),
            port: DEFAULT_PIGPIOD_PORT,
            baud: DEFAULT_BAUD,
            verbose: false,
        }
    }
}
