//! Sectioned key/value state store.
//!
//! Persists a TOML document at `<home>/.ledchain/state.toml` (or
//! `$LEDCHAIN_STATE`). Each section is a table of string options:
//!
//! ```toml
//! ["interface:spi-0"]
//! modules = "4"
//!
//! ["display:1"]
//! value = "42"
//! has_value = "true"
//! brightness = "8"
//! powered = "true"
//! ```
//!
//! The store keeps one global dirty flag. Writing options does not set it;
//! callers mark the store dirty once they want the change persisted, and
//! [`StateStore::save`] only touches the file when the flag is set. Saves use
//! the `.tmp` + rename pattern so an interrupted run never leaves a torn file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Environment variable overriding the state file location.
pub const STATE_ENV: &str = "LEDCHAIN_STATE";

type Section = BTreeMap<String, String>;

/// In-memory view of the state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    sections: BTreeMap<String, Section>,
    dirty: bool,
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.ledchain/state.toml` — pure, no I/O.
pub fn state_path_at(home: &Path) -> PathBuf {
    home.join(".ledchain").join("state.toml")
}

/// `$LEDCHAIN_STATE` if set, otherwise [`state_path_at`] under `dirs::home_dir()`.
pub fn state_path() -> Result<PathBuf, SyncError> {
    if let Some(path) = std::env::var_os(STATE_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or(SyncError::HomeNotFound)?;
    Ok(state_path_at(&home))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

impl StateStore {
    /// An empty store that will save to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sections: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Load the store at `path`. A missing file yields an empty store.
    ///
    /// Non-string TOML scalars are kept in their textual form; anything that
    /// is not a table of scalars is skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no state file yet");
            return Ok(Self::empty(path));
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let table = contents
            .parse::<toml::Table>()
            .map_err(|source| SyncError::Format {
                path: path.clone(),
                source,
            })?;

        let mut sections = BTreeMap::new();
        for (name, item) in table {
            let toml::Value::Table(options) = item else {
                tracing::warn!(section = %name, "ignoring top-level value outside a section");
                continue;
            };
            let mut section = Section::new();
            for (key, value) in options {
                match scalar_text(&value) {
                    Some(text) => {
                        section.insert(key, text);
                    }
                    None => tracing::warn!(section = %name, key = %key, "ignoring nested value"),
                }
            }
            sections.insert(name, section);
        }

        tracing::debug!(path = %path.display(), sections = sections.len(), "state loaded");
        Ok(Self {
            path,
            sections,
            dirty: false,
        })
    }

    /// Open the store at [`state_path`].
    pub fn open_default() -> Result<Self, SyncError> {
        Self::open(state_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn has_key(&self, section: &str, key: &str) -> bool {
        self.read(section, key).is_some()
    }

    pub fn read(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Set `key` in `section`, creating the section if needed.
    ///
    /// Does not mark the store dirty.
    pub fn write(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the store to disk if it is dirty. Returns whether a file was written.
    ///
    /// Write flow: serialize → `.toml.tmp` sibling → `chmod 0600` → `rename`.
    pub fn save(&mut self) -> Result<bool, SyncError> {
        if !self.dirty {
            tracing::debug!(path = %self.path.display(), "state unchanged, not saving");
            return Ok(false);
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let text = toml::to_string(&self.sections)?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, text).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }

        self.dirty = false;
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn scalar_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), SyncError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn state_path_is_under_dot_ledchain() {
        let home = TempDir::new().unwrap();
        assert!(state_path_at(home.path()).ends_with(".ledchain/state.toml"));
    }

    #[test]
    fn missing_file_gives_empty_store() {
        let home = TempDir::new().unwrap();
        let store = StateStore::open(state_path_at(home.path())).unwrap();
        assert_eq!(store.section_names().count(), 0);
        assert!(!store.is_dirty());
    }

    #[test]
    fn save_is_noop_unless_dirty() {
        let home = TempDir::new().unwrap();
        let path = state_path_at(home.path());
        let mut store = StateStore::open(&path).unwrap();
        store.write("display:1", "value", "3");
        assert!(!store.save().unwrap());
        assert!(!path.exists());

        store.mark_dirty();
        assert!(store.save().unwrap());
        assert!(path.exists());
        assert!(!store.is_dirty());
    }

    #[test]
    fn roundtrip_save_open() {
        let home = TempDir::new().unwrap();
        let path = state_path_at(home.path());
        let mut store = StateStore::empty(&path);
        store.write("display:2", "brightness", "11");
        store.write("interface:spi-0", "modules", "4");
        store.mark_dirty();
        store.save().unwrap();

        let loaded = StateStore::open(&path).unwrap();
        assert_eq!(loaded.read("display:2", "brightness"), Some("11"));
        assert_eq!(loaded.read("interface:spi-0", "modules"), Some("4"));
        assert!(loaded.has_section("display:2"));
        assert!(!loaded.has_key("display:2", "value"));
        assert!(!loaded.has_section("display:1"));
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let home = TempDir::new().unwrap();
        let path = state_path_at(home.path());
        let mut store = StateStore::empty(&path);
        store.mark_dirty();
        store.save().unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let home = TempDir::new().unwrap();
        let path = state_path_at(home.path());
        let mut store = StateStore::empty(&path);
        store.mark_dirty();
        store.save().unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn hand_written_scalars_are_read_as_text() {
        let home = TempDir::new().unwrap();
        let path = state_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "[\"interface:spi-0\"]\nmodules = 3\n\n[\"display:1\"]\npowered = false\n",
        )
        .unwrap();
        let store = StateStore::open(&path).unwrap();
        assert_eq!(store.read("interface:spi-0", "modules"), Some("3"));
        assert_eq!(store.read("display:1", "powered"), Some("false"));
    }

    #[test]
    fn corrupt_file_is_format_error_with_path() {
        let home = TempDir::new().unwrap();
        let path = state_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[ not toml").unwrap();
        let err = StateStore::open(&path).unwrap_err();
        assert!(matches!(err, SyncError::Format { .. }), "got: {err}");
        assert!(err.to_string().contains("state.toml"));
    }
}
