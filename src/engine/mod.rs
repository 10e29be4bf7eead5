use std::collections::HashSet;

use log::{debug, info};

use crate::engine::models::{ChangedAsset, Classification, Manifest};
use crate::error::Result;
use crate::networking::NetworkClient;
use crate::settings::{AssetLocator, Settings};
use crate::storage::CacheStore;

pub mod models;
pub mod report;

/// Compare two manifest snapshots.
///
/// Appended and updated entries follow the order of `new`, removed entries
/// the order of `old`. A key listed twice is reported once.
pub fn classify(old: &Manifest, new: &Manifest, locator: &AssetLocator) -> Classification {
    let old_index = old.crc_index();
    let new_index = new.crc_index();
    let mut result = Classification::default();

    let mut seen = HashSet::new();
    for entry in &new.data {
        let key = entry.key();
        if !seen.insert(key.clone()) {
            continue;
        }
        let crc = new_index.get(&key).copied().unwrap_or(entry.crc.as_str());
        match old_index.get(&key) {
            None => {
                let url = locator.asset_url(&new.base_version, &key);
                result.appended.push(ChangedAsset { key, url });
            }
            Some(previous) if *previous != crc => {
                let url = locator.asset_url(&new.base_version, &key);
                result.updated.push(ChangedAsset { key, url });
            }
            Some(_) => {}
        }
    }

    let mut seen = HashSet::new();
    for entry in &old.data {
        let key = entry.key();
        if !new_index.contains_key(&key) && seen.insert(key.clone()) {
            result.removed.push(key);
        }
    }

    result
}

pub struct DiffEngine {
    settings: Settings,
    networking: NetworkClient,
    storage: CacheStore,
}

impl DiffEngine {
    pub fn new(settings: Settings) -> Self {
        let storage = CacheStore::new(settings.cache_path.clone(), settings.backup_dir.clone());
        Self {
            settings,
            networking: NetworkClient::new(),
            storage,
        }
    }

    /// Fetch the current manifest, diff it against the cache and, unless
    /// `dry_run` is set, store it as the new cache.
    pub async fn run(&self, dry_run: bool) -> Result<Classification> {
        info!(
            "diff: loading cached manifest from {}",
            self.storage.cache_path().display()
        );
        let old = self.storage.load_or_empty().await?;
        debug!("diff: cached manifest has {} entries", old.data.len());

        let version = self
            .networking
            .fetch_protocol_version(&self.settings.version_url, &self.settings.provider)
            .await?;
        let locator = self.settings.locator();
        let url = locator.manifest_url(&version);
        let (raw, new) = self.networking.fetch_manifest(&url).await?;

        let result = classify(&old, &new, &locator);

        if dry_run {
            info!("diff: dry run, cache left untouched");
        } else {
            self.storage.persist(&raw).await?;
        }
        Ok(result)
    }
}
