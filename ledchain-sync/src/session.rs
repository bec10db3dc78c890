//! One load → mutate → flush → save cycle.
//!
//! [`Session::open`] is the composed start-up procedure shared by every
//! command: size the chain from the store, switch to batched writes, load each
//! module that has a section, then clear all dirty flags so loading alone does
//! not count as a change. [`Session::apply`] runs one [`Mutation`] and writes
//! the touched modules back into the store; [`Session::finish`] sends the full
//! chain and only then saves the store, so a bus failure leaves the file as it
//! was.

use ledchain_core::{ChainDevice, ChainError, Transport, MAX_MODULES};

use crate::error::{parse_err, SyncError};
use crate::store::StateStore;
use crate::synchronizer::{self, section_name};

/// Section holding bus-level settings.
pub const INTERFACE_SECTION: &str = "interface:spi-0";
/// Chain length option inside [`INTERFACE_SECTION`].
pub const KEY_MODULES: &str = "modules";

/// A single state change requested by the dispatcher. Indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    SetValue { index: usize, value: i32 },
    Clear { index: usize },
    SetBrightness { index: usize, level: i64 },
    SetPower { index: usize, on: bool },
    /// Every module back to defaults.
    Reset,
    /// Nothing changes; the whole chain is marked for resend.
    Resync,
}

/// Result of [`Session::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishReport {
    /// Modules that were dirty when the flush started.
    pub dirty_modules: usize,
    /// Whether the state file was rewritten.
    pub saved: bool,
}

/// A loaded chain bound to its state store.
pub struct Session<T: Transport> {
    store: StateStore,
    chain: ChainDevice<T>,
    load_failures: Vec<(usize, SyncError)>,
}

impl<T: Transport> Session<T> {
    /// Build a chain on `transport` and populate it from `store`.
    ///
    /// A module whose section cannot be parsed keeps its defaults; the error
    /// is kept in [`load_failures`](Self::load_failures) and the remaining
    /// modules still load. Store-level problems (a malformed chain length) are
    /// returned as errors.
    pub fn open(store: StateStore, transport: T) -> Result<Self, SyncError> {
        let mut chain = ChainDevice::new(transport);
        if let Some(count) = configured_modules(&store)? {
            chain.resize(count)?;
        }
        chain.set_immediate_write(false);

        let mut load_failures = Vec::new();
        for index in 0..chain.num_modules() {
            let section = section_name(index);
            match synchronizer::load_module(&store, &section, &mut chain, index) {
                Ok(_) => {}
                Err(err) if err.is_module_local() => {
                    tracing::warn!(section = %section, error = %err, "module state not loaded");
                    load_failures.push((index, err));
                }
                Err(err) => return Err(err),
            }
        }
        chain.mark_all_clean();

        tracing::debug!(
            modules = chain.num_modules(),
            failures = load_failures.len(),
            "session opened"
        );
        Ok(Self {
            store,
            chain,
            load_failures,
        })
    }

    pub fn chain(&self) -> &ChainDevice<T> {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut ChainDevice<T> {
        &mut self.chain
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn num_modules(&self) -> usize {
        self.chain.num_modules()
    }

    /// Modules whose saved state could not be parsed during [`open`](Self::open).
    pub fn load_failures(&self) -> &[(usize, SyncError)] {
        &self.load_failures
    }

    /// Re-read module `index` from its section.
    pub fn load_module(&mut self, index: usize) -> Result<(), SyncError> {
        synchronizer::load_module(&self.store, &section_name(index), &mut self.chain, index)
            .map(|_| ())
    }

    /// Write module `index` into its section and mark the store dirty.
    pub fn save_module(&mut self, index: usize) -> Result<(), SyncError> {
        synchronizer::save_module(&mut self.store, &section_name(index), &self.chain, index)
    }

    /// Apply `mutation` to the chain and persist every module it touched.
    ///
    /// Validation errors leave both the chain and the store unchanged.
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), SyncError> {
        tracing::debug!(?mutation, "applying");
        match mutation {
            Mutation::SetValue { index, value } => {
                self.chain.set_value(index, value)?;
                self.save_module(index)
            }
            Mutation::Clear { index } => {
                self.chain.clear(index)?;
                self.save_module(index)
            }
            Mutation::SetBrightness { index, level } => {
                self.chain.set_brightness(index, level)?;
                self.save_module(index)
            }
            Mutation::SetPower { index, on } => {
                self.chain.set_power(index, on)?;
                self.save_module(index)
            }
            Mutation::Reset => {
                self.chain.reset();
                (0..self.chain.num_modules()).try_for_each(|index| self.save_module(index))
            }
            Mutation::Resync => {
                self.chain.mark_all_dirty();
                Ok(())
            }
        }
    }

    /// Send the whole chain, then save the store if it is dirty.
    ///
    /// A transport error is returned before the store is touched.
    pub fn finish(mut self) -> Result<FinishReport, SyncError> {
        let dirty_modules = (0..self.chain.num_modules())
            .filter(|&i| self.chain.is_dirty(i).unwrap_or(false))
            .count();
        self.chain.flush()?;
        let saved = self.store.save()?;
        Ok(FinishReport {
            dirty_modules,
            saved,
        })
    }

    /// Give back the store and chain, e.g. to inspect a transport in tests.
    pub fn into_parts(self) -> (StateStore, ChainDevice<T>) {
        (self.store, self.chain)
    }
}

/// Chain length stored in [`INTERFACE_SECTION`], if any.
pub fn configured_modules(store: &StateStore) -> Result<Option<usize>, SyncError> {
    let Some(text) = store.read(INTERFACE_SECTION, KEY_MODULES) else {
        return Ok(None);
    };
    let count = text
        .trim()
        .parse::<usize>()
        .map_err(|e| parse_err(INTERFACE_SECTION, KEY_MODULES, text, e.to_string()))?;
    Ok(Some(count))
}

/// Record a new chain length in the store and mark it dirty.
///
/// Only the store changes; the next session sizes its chain from it. Module
/// sections beyond the new length are kept.
pub fn set_configured_modules(store: &mut StateStore, count: i64) -> Result<(), SyncError> {
    if !(1..=MAX_MODULES as i64).contains(&count) {
        return Err(ChainError::InvalidArgument(format!(
            "chain length {count} outside 1..={MAX_MODULES}"
        ))
        .into());
    }
    store.write(INTERFACE_SECTION, KEY_MODULES, count.to_string());
    store.mark_dirty();
    Ok(())
}
