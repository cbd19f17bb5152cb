use std::{fs, path::PathBuf};

use beacon_logic::{ProfileStore, UserProfile, prelude::*};

/// Flat JSON file holding the last-submitted profile.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProfileStore for JsonFileStore {
    fn load(&self) -> Result<Option<UserProfile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path).context("Failed to read profile store")?;
        let profile = serde_json::from_str(&data).context("Failed to decode profile store")?;
        Ok(Some(profile))
    }

    fn save(&self, profile: &UserProfile) -> Result {
        let data = serde_json::to_string_pretty(profile).context("Failed to serialize profile")?;
        fs::write(&self.path, data).context("Failed to write profile store")
    }
}
