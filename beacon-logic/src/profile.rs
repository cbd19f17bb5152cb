use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// The flat user profile persisted across navigations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub age: Option<u32>,
    pub medical_history: String,
    pub risk_score: Option<u32>,
}

/// Flat key/value persistence for the profile. Hosts decide where it
/// lives; the panel layer only cares about load/save.
pub trait ProfileStore {
    fn load(&self) -> Result<Option<UserProfile>>;
    fn save(&self, profile: &UserProfile) -> Result;
}
