//! JSON seed documents for the in-memory store

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::memory::{MemoryStore, StoredRule, UserRecord};
use crate::config::ConfigError;
use crate::model::{NotificationSettings, Target};

/// Users, targets, rules and settings to preload
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub rules: Vec<StoredRule>,
    #[serde(default)]
    pub notification_settings: Vec<NotificationSettings>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedStats {
    pub users: usize,
    pub targets: usize,
    pub rules: usize,
    pub notification_settings: usize,
}

impl SeedDocument {
    /// Validate targets and load everything into the store
    ///
    /// Rules are stored as-is; malformed channel lists are reported when the
    /// scheduler reads them, so one bad rule never blocks the others.
    pub fn apply(self, store: &MemoryStore) -> Result<SeedStats, ConfigError> {
        for target in &self.targets {
            target.validate()?;
        }

        let stats = SeedStats {
            users: self.users.len(),
            targets: self.targets.len(),
            rules: self.rules.len(),
            notification_settings: self.notification_settings.len(),
        };

        for user in self.users {
            store.add_user(user);
        }
        for target in self.targets {
            store.add_target(target);
        }
        for rule in self.rules {
            store.add_stored_rule(rule);
        }
        for settings in self.notification_settings {
            store.set_notification_settings(settings);
        }

        Ok(stats)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid seed data: {0}")]
    Config(#[from] ConfigError),
}

/// Read a seed file and load it into the store
pub fn load_seed_file(path: &Path, store: &MemoryStore) -> Result<SeedStats, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    let document: SeedDocument = serde_json::from_str(&raw)?;
    let stats = document.apply(store)?;

    tracing::info!(
        path = %path.display(),
        targets = stats.targets,
        rules = stats.rules,
        "Seed data loaded"
    );

    Ok(stats)
}
