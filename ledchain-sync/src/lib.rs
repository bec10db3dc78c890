//! # ledchain-sync
//!
//! Persistent module state for a MAX7219 chain.
//!
//! [`StateStore`] is the sectioned key/value file, [`synchronizer`] maps one
//! module to one section, and [`Session`] composes them with the chain driver
//! into the load → mutate → flush → save cycle every command runs.

pub mod error;
pub mod session;
pub mod store;
pub mod synchronizer;

pub use error::SyncError;
pub use session::{FinishReport, Mutation, Session};
pub use store::StateStore;
pub use synchronizer::{load_module, save_module, section_name};
