use std::path::Path;

use crate::error::Result;
use crate::store::JsonDb;
use crate::types::ProjectSnapshot;

fn project_key(owner: &str, name: &str) -> String {
    format!("{owner}::{name}")
}

/// `owner::name` → frozen snapshot, on top of a projects.json file.
/// Re-saving under the same name overwrites the whole snapshot.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    db: JsonDb,
}

impl ProjectStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            db: JsonDb::new(data_dir.join("projects.json")),
        }
    }

    pub fn save(&self, owner: &str, name: &str, snapshot: &ProjectSnapshot) -> Result<()> {
        self.db
            .set(&project_key(owner, name), serde_json::to_value(snapshot)?)
    }

    /// None when the key is absent or the stored value does not decode.
    pub fn load(&self, owner: &str, name: &str) -> Option<ProjectSnapshot> {
        let value = self.db.get(&project_key(owner, name))?;
        serde_json::from_value(value).ok()
    }

    /// Sorted project names belonging to the owner.
    pub fn list(&self, owner: &str) -> Vec<String> {
        let prefix = format!("{owner}::");
        let mut names: Vec<String> = self
            .db
            .keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort();
        names
    }
}
