//! Enrichment settings and their persistence
//!
//! Settings are a single serde record persisted as one JSON blob under a
//! well-known file name. Missing or corrupt storage falls back to the
//! documented defaults; writes are last-write-wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::domain::identifiers::SourceId;

/// File name of the persisted settings blob
pub const SETTINGS_FILE_NAME: &str = "enrichment_settings.json";

/// User-facing knobs for the enrichment pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentSettings {
    /// Source consulted first
    pub preferred_source: SourceId,
    /// Fallback order for explicit multi-source callers; first = highest
    pub source_priority: Vec<SourceId>,
    /// Whether the background scheduler may queue work
    pub auto_sync_enabled: bool,
    /// Days before enrichment data counts as stale (≥ 1)
    pub refresh_interval_days: i64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            preferred_source: SourceId::Ads,
            source_priority: vec![SourceId::Ads],
            auto_sync_enabled: true,
            refresh_interval_days: 7,
        }
    }
}

impl EnrichmentSettings {
    /// Coerce out-of-range values into the documented bounds
    pub fn normalized(mut self) -> Self {
        if self.refresh_interval_days < 1 {
            self.refresh_interval_days = 1;
        }
        if self.source_priority.is_empty() {
            self.source_priority = vec![self.preferred_source];
        }
        self
    }

    /// Serialize to the persisted JSON form
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from the persisted JSON form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Read access to the current settings snapshot
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> EnrichmentSettings;
}

/// A fixed snapshot is itself a provider; convenient for embedding and tests
impl SettingsProvider for EnrichmentSettings {
    fn settings(&self) -> EnrichmentSettings {
        self.clone()
    }
}

/// File-backed settings provider
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<EnrichmentSettings>,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match fs::read_to_string(&path) {
            Ok(contents) => match EnrichmentSettings::from_json(&contents) {
                Ok(settings) => settings.normalized(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt settings blob, using defaults");
                    EnrichmentSettings::default()
                }
            },
            Err(_) => EnrichmentSettings::default(),
        };

        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the current snapshot
    pub fn save(&self) -> io::Result<()> {
        let settings = self.settings();
        let json = settings
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)
    }

    /// Apply a mutation, normalize, and persist
    pub fn update(&self, f: impl FnOnce(&mut EnrichmentSettings)) -> io::Result<()> {
        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut updated = current.clone();
            f(&mut updated);
            *current = updated.normalized();
        }
        self.save()
    }
}

impl SettingsProvider for SettingsStore {
    fn settings(&self) -> EnrichmentSettings {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EnrichmentSettings::default();
        assert_eq!(settings.preferred_source, SourceId::Ads);
        assert_eq!(settings.source_priority, vec![SourceId::Ads]);
        assert!(settings.auto_sync_enabled);
        assert_eq!(settings.refresh_interval_days, 7);
    }

    #[test]
    fn test_refresh_interval_coerced_up() {
        let settings = EnrichmentSettings {
            refresh_interval_days: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(settings.refresh_interval_days, 1);

        let negative = EnrichmentSettings {
            refresh_interval_days: -5,
            ..Default::default()
        }
        .normalized();
        assert_eq!(negative.refresh_interval_days, 1);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = EnrichmentSettings {
            preferred_source: SourceId::SemanticScholar,
            source_priority: vec![SourceId::SemanticScholar, SourceId::Ads],
            auto_sync_enabled: false,
            refresh_interval_days: 14,
        };
        let json = settings.to_json().unwrap();
        let parsed = EnrichmentSettings::from_json(&json).unwrap();
        assert_eq!(settings, parsed);
    }

    #[test]
    fn test_store_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load_or_default(dir.path().join(SETTINGS_FILE_NAME));
        assert_eq!(store.settings(), EnrichmentSettings::default());
    }

    #[test]
    fn test_store_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::load_or_default(&path);
        assert_eq!(store.settings(), EnrichmentSettings::default());
    }

    #[test]
    fn test_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);

        let store = SettingsStore::load_or_default(&path);
        store
            .update(|s| {
                s.auto_sync_enabled = false;
                s.refresh_interval_days = 30;
            })
            .unwrap();

        let reloaded = SettingsStore::load_or_default(&path);
        let settings = reloaded.settings();
        assert!(!settings.auto_sync_enabled);
        assert_eq!(settings.refresh_interval_days, 30);
    }

    #[test]
    fn test_store_update_coerces_interval() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load_or_default(dir.path().join(SETTINGS_FILE_NAME));
        store.update(|s| s.refresh_interval_days = -3).unwrap();
        assert_eq!(store.settings().refresh_interval_days, 1);
    }
}
