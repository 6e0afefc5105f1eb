//! Trusted device registry, persisted as a JSON object keyed by fingerprint.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::warn;

const DEVICES_FILE: &str = "trusted_devices.json";

/// A device permitted to bypass token auth on the trust-allowlisted routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedDevice {
    pub name: String,
    pub added_at: String,
    pub last_seen: String,
}

/// Registry of trusted devices; every mutation rewrites the backing file.
pub struct TrustedDeviceStore {
    path: PathBuf,
    devices: RwLock<HashMap<String, TrustedDevice>>,
}

impl TrustedDeviceStore {
    /// Open the store in `config_dir`. A missing or corrupt file is
    /// treated as an empty registry rather than a startup failure.
    pub fn open(config_dir: &Path) -> Self {
        let path = config_dir.join(DEVICES_FILE);
        let devices = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("ignoring corrupt trusted devices file: {e}");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            devices: RwLock::new(devices),
        }
    }

    /// Register (or re-register) a device as trusted.
    pub async fn add(&self, fingerprint: &str, name: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut devices = self.devices.write().await;
        devices.insert(
            fingerprint.to_string(),
            TrustedDevice {
                name: name.to_string(),
                added_at: now.clone(),
                last_seen: now,
            },
        );
        self.persist(&devices)
    }

    /// Check whether a fingerprint is trusted, refreshing its last-seen
    /// timestamp when it is.
    pub async fn is_trusted(&self, fingerprint: &str) -> bool {
        let mut devices = self.devices.write().await;
        match devices.get_mut(fingerprint) {
            Some(device) => {
                device.last_seen = Utc::now().to_rfc3339();
                if let Err(e) = self.persist(&devices) {
                    warn!("failed to persist trusted device last-seen: {e}");
                }
                true
            }
            None => false,
        }
    }

    /// Remove a device; returns false when the fingerprint is unknown.
    pub async fn remove(&self, fingerprint: &str) -> Result<bool> {
        let mut devices = self.devices.write().await;
        if devices.remove(fingerprint).is_some() {
            self.persist(&devices)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// All registered devices, keyed by fingerprint.
    pub async fn all(&self) -> HashMap<String, TrustedDevice> {
        self.devices.read().await.clone()
    }

    fn persist(&self, devices: &HashMap<String, TrustedDevice>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(devices)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_check_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustedDeviceStore::open(dir.path());

        assert!(!store.is_trusted("fp-1").await);

        store.add("fp-1", "Kitchen iPad").await.unwrap();
        assert!(store.is_trusted("fp-1").await);
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_registry_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = TrustedDeviceStore::open(dir.path());
            store.add("fp-1", "Kitchen iPad").await.unwrap();
        }

        let reopened = TrustedDeviceStore::open(dir.path());
        assert!(reopened.is_trusted("fp-1").await);
        assert_eq!(reopened.all().await["fp-1"].name, "Kitchen iPad");
    }

    #[tokio::test]
    async fn test_trust_check_refreshes_last_seen() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustedDeviceStore::open(dir.path());
        store.add("fp-1", "Phone").await.unwrap();

        let before = store.all().await["fp-1"].clone();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(store.is_trusted("fp-1").await);
        let after = store.all().await["fp-1"].clone();

        assert_eq!(before.added_at, after.added_at);
        assert!(after.last_seen >= before.last_seen);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustedDeviceStore::open(dir.path());
        store.add("fp-1", "Phone").await.unwrap();

        assert!(store.remove("fp-1").await.unwrap());
        assert!(!store.remove("fp-1").await.unwrap());
        assert!(!store.is_trusted("fp-1").await);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEVICES_FILE), "not json").unwrap();

        let store = TrustedDeviceStore::open(dir.path());
        assert!(store.all().await.is_empty());
    }
}
