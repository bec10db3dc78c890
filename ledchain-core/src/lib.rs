//! ledchain core library — chained MAX7219 driver, wire format, errors.
//!
//! Public API surface:
//! - [`types`] — module state, brightness, index helpers
//! - [`error`] — [`ChainError`], [`TransportError`]
//! - [`transport`] — the [`Transport`] capability the driver writes through
//! - [`font`] / [`frame`] — 7-segment rendering and MAX7219 register frames
//! - [`chain`] — [`ChainDevice`], the dirty-tracked batched driver

pub mod chain;
pub mod error;
pub mod font;
pub mod frame;
pub mod transport;
pub mod types;

pub use chain::ChainDevice;
pub use error::{ChainError, TransportError};
pub use transport::Transport;
pub use types::{module_index, Brightness, ModuleState, DEFAULT_MODULES, MAX_MODULES};
