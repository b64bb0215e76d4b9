use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::Result;
use crate::store::JsonDb;

/// Stored per email. `pwd` is a bare SHA-256 hex digest — the format the
/// original tool wrote. Not a salted/iterated password hash; fine for a
/// single-operator local deployment, unsuitable for real credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub pwd: String,
    /// Unix seconds at registration.
    pub created_at: i64,
}

pub fn hash_pwd(pw: &str) -> String {
    hex::encode(Sha256::digest(pw.as_bytes()))
}

/// Email → credential map on top of a users.json file.
#[derive(Debug, Clone)]
pub struct UserStore {
    db: JsonDb,
}

impl UserStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            db: JsonDb::new(data_dir.join("users.json")),
        }
    }

    /// Registers a new account. Returns Ok(false) without touching the
    /// stored credential when the email is already taken.
    pub fn register(&self, email: &str, pwd: &str) -> Result<bool> {
        if self.db.contains(email) {
            return Ok(false);
        }
        let record = UserRecord {
            pwd: hash_pwd(pwd),
            created_at: chrono::Utc::now().timestamp(),
        };
        self.db.set(email, serde_json::to_value(&record)?)?;
        info!(email, "Account created");
        Ok(true)
    }

    /// Digest comparison against the stored record. Unknown email or an
    /// unreadable record verifies as false.
    pub fn verify(&self, email: &str, pwd: &str) -> bool {
        match self.db.get(email) {
            Some(v) => match serde_json::from_value::<UserRecord>(v) {
                Ok(record) => record.pwd == hash_pwd(pwd),
                Err(_) => false,
            },
            None => false,
        }
    }
}
