//! Subcommands and the plumbing they share.
//!
//! Every display-changing command goes through [`apply_and_send`]: validate
//! against the stored chain length, open the bus, load, mutate, flush, save.

pub mod brightness;
pub mod clear;
pub mod modules;
pub mod power;
pub mod reset;
pub mod set;
pub mod status;
pub mod sync;

use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::Args;

use ledchain_core::{ChainError, DEFAULT_MODULES};
use ledchain_sync::session::{configured_modules, INTERFACE_SECTION};
use ledchain_sync::{FinishReport, Mutation, Session, StateStore};
use ledchain_transport::{BusConfig, TransportKind};

const KEY_TRANSPORT: &str = "transport";
const KEY_DEVICE: &str = "device";
const KEY_CHANNEL: &str = "channel";
const KEY_HOST: &str = "host";
const KEY_PORT: &str = "port";
const KEY_BAUD: &str = "baud";

/// Options accepted by every subcommand. Bus flags override the values
/// stored in the `interface:spi-0` section.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Log debug detail and dump every frame sent.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Bus transport: pigpiod | spidev | dry-run.
    #[arg(long, global = true, value_name = "KIND")]
    pub transport: Option<TransportKind>,

    /// spidev device node.
    #[arg(long, global = true, value_name = "PATH")]
    pub device: Option<String>,

    /// pigpio SPI channel.
    #[arg(long, global = true)]
    pub channel: Option<u32>,

    /// pigpio daemon host.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// pigpio daemon port.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// SPI clock in Hz.
    #[arg(long, global = true, value_name = "HZ")]
    pub baud: Option<u32>,
}

impl GlobalOpts {
    /// Defaults, then stored bus settings, then command-line flags.
    pub fn bus_config(&self, store: &StateStore) -> Result<BusConfig> {
        let mut config = BusConfig {
            verbose: self.verbose,
            ..BusConfig::default()
        };
        if let Some(kind) = self.transport.or(stored(store, KEY_TRANSPORT)?) {
            config.kind = kind;
        }
        if let Some(device) = self.device.clone().or(stored(store, KEY_DEVICE)?) {
            config.device = device;
        }
        if let Some(channel) = self.channel.or(stored(store, KEY_CHANNEL)?) {
            config.channel = channel;
        }
        if let Some(host) = self.host.clone().or(stored(store, KEY_HOST)?) {
            config.host = host;
        }
        if let Some(port) = self.port.or(stored(store, KEY_PORT)?) {
            config.port = port;
        }
        if let Some(baud) = self.baud.or(stored(store, KEY_BAUD)?) {
            config.baud = baud;
        }
        Ok(config)
    }
}

/// Parse an option of the interface section, if present.
fn stored<T>(store: &StateStore, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    store
        .read(INTERFACE_SECTION, key)
        .map(|text| {
            text.trim().parse::<T>().map_err(|e| {
                anyhow!("malformed value {text:?} for '{key}' in section '{INTERFACE_SECTION}': {e}")
            })
        })
        .transpose()
}

pub fn open_store() -> Result<StateStore> {
    StateStore::open_default().context("failed to open state file")
}

/// Run one mutation end to end and return what the flush reported.
///
/// `build` receives the stored chain length so module numbers are checked
/// before the bus is opened.
pub fn apply_and_send(
    global: &GlobalOpts,
    build: impl FnOnce(usize) -> Result<Mutation, ChainError>,
) -> Result<FinishReport> {
    let store = open_store()?;
    let count = configured_modules(&store)
        .context("invalid chain length in state file")?
        .unwrap_or(DEFAULT_MODULES);
    let mutation = build(count)?;

    let config = global.bus_config(&store)?;
    let transport = ledchain_transport::open(&config)
        .with_context(|| format!("failed to open {} transport", config.kind))?;

    let mut session = Session::open(store, transport).context("failed to load display state")?;
    session
        .apply(mutation)
        .with_context(|| format!("failed to apply {mutation:?}"))?;
    let report = session.finish().context("failed to update displays")?;
    tracing::debug!(
        dirty = report.dirty_modules,
        saved = report.saved,
        "session finished"
    );
    Ok(report)
}
