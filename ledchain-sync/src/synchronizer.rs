//! Module state ⇄ persistent section translation.
//!
//! One section per module, named `display:<1-based index>`:
//!
//! | key          | text form               |
//! |--------------|-------------------------|
//! | `value`      | decimal `i32`           |
//! | `has_value`  | `true` / `false`        |
//! | `brightness` | `0`..=`15`              |
//! | `powered`    | `true` / `false`        |

use ledchain_core::{Brightness, ChainDevice, Transport};

use crate::error::{parse_err, SyncError};
use crate::store::StateStore;

pub const SECTION_PREFIX: &str = "display";

pub const KEY_VALUE: &str = "value";
pub const KEY_HAS_VALUE: &str = "has_value";
pub const KEY_BRIGHTNESS: &str = "brightness";
pub const KEY_POWERED: &str = "powered";

/// `display:<index + 1>`.
pub fn section_name(index: usize) -> String {
    format!("{SECTION_PREFIX}:{}", index + 1)
}

/// Options found in one section, parsed but not yet applied.
#[derive(Debug, Default, PartialEq, Eq)]
struct StoredModule {
    value: Option<i32>,
    has_value: Option<bool>,
    brightness: Option<Brightness>,
    powered: Option<bool>,
}

impl StoredModule {
    fn parse(store: &StateStore, section: &str) -> Result<Self, SyncError> {
        let mut stored = StoredModule::default();
        if let Some(text) = store.read(section, KEY_VALUE) {
            stored.value = Some(
                text.trim()
                    .parse::<i32>()
                    .map_err(|e| parse_err(section, KEY_VALUE, text, e.to_string()))?,
            );
        }
        if let Some(text) = store.read(section, KEY_HAS_VALUE) {
            stored.has_value = Some(parse_flag(text).ok_or_else(|| {
                parse_err(section, KEY_HAS_VALUE, text, "expected true or false")
            })?);
        }
        if let Some(text) = store.read(section, KEY_BRIGHTNESS) {
            let level = text
                .trim()
                .parse::<i64>()
                .map_err(|e| parse_err(section, KEY_BRIGHTNESS, text, e.to_string()))?;
            stored.brightness = Some(
                Brightness::new(level)
                    .map_err(|e| parse_err(section, KEY_BRIGHTNESS, text, e.to_string()))?,
            );
        }
        if let Some(text) = store.read(section, KEY_POWERED) {
            stored.powered = Some(parse_flag(text).ok_or_else(|| {
                parse_err(section, KEY_POWERED, text, "expected true or false")
            })?);
        }
        Ok(stored)
    }
}

/// Apply the options of `section` to module `index`.
///
/// Only keys that are present are applied. Every key is parsed before the
/// first mutator runs, so malformed text leaves the module untouched. A
/// missing section is not an error. Returns whether the section existed.
///
/// The chain mutators compare against current state and may mark the module
/// dirty; callers loading at start-up clear the flags afterwards.
pub fn load_module<T: Transport>(
    store: &StateStore,
    section: &str,
    chain: &mut ChainDevice<T>,
    index: usize,
) -> Result<bool, SyncError> {
    chain.module(index)?;
    if !store.has_section(section) {
        return Ok(false);
    }
    let stored = StoredModule::parse(store, section)?;

    // A stored number without an explicit flag means it was on display.
    let show = stored.has_value.unwrap_or(stored.value.is_some());
    match stored.value {
        Some(value) if show => chain.set_value(index, value)?,
        Some(value) => {
            chain.set_value(index, value)?;
            chain.clear(index)?;
        }
        None if show => {
            let current = chain.value(index)?;
            chain.set_value(index, current)?;
        }
        None => chain.clear(index)?,
    }
    if let Some(brightness) = stored.brightness {
        chain.set_brightness(index, i64::from(brightness.level()))?;
    }
    if let Some(powered) = stored.powered {
        chain.set_power(index, powered)?;
    }

    tracing::debug!(section, index, "module state loaded");
    Ok(true)
}

/// Write every option of module `index` into `section` and mark the store
/// dirty, regardless of the module's own dirty flag.
pub fn save_module<T: Transport>(
    store: &mut StateStore,
    section: &str,
    chain: &ChainDevice<T>,
    index: usize,
) -> Result<(), SyncError> {
    let state = chain.module(index)?;
    store.write(section, KEY_VALUE, state.value.to_string());
    store.write(section, KEY_HAS_VALUE, state.has_value.to_string());
    store.write(section, KEY_BRIGHTNESS, state.brightness.to_string());
    store.write(section, KEY_POWERED, state.powered.to_string());
    store.mark_dirty();
    tracing::debug!(section, index, "module state saved");
    Ok(())
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
