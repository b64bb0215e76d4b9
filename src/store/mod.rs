//! Flat-file persistence: one JSON file per data kind, read in full on every
//! operation and rewritten in full on every mutation. Last write wins; there
//! is no locking. The engine never touches these types directly, so the
//! backend can be swapped without changing it.

pub mod projects;
pub mod settings;
pub mod users;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;

/// Reads a JSON file into T, falling back when the file is missing or does
/// not parse. Corruption degrades to the fallback with a warning, never an
/// error.
pub(crate) fn read_json_or<T, F>(path: &Path, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(_) => return fallback(),
    };
    match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            warn!("Malformed store file {}: {e} — using defaults", path.display());
            fallback()
        }
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(value)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// File-backed key → JSON value map. Backs the user and project stores.
#[derive(Debug, Clone)]
pub struct JsonDb {
    path: PathBuf,
}

impl JsonDb {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_map(&self) -> Map<String, Value> {
        read_json_or(&self.path, Map::new)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read_map().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read_map().contains_key(key)
    }

    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value);
        write_json(&self.path, &map)
    }

    pub fn keys(&self) -> Vec<String> {
        self.read_map().keys().cloned().collect()
    }
}
