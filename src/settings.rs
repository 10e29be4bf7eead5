use std::path::PathBuf;

use crate::engine::models::EntryKey;
use crate::env;

/// Endpoints and local paths used by a diff run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub version_url: String,
    pub assets_base: String,
    pub channel: String,
    pub provider: String,
    pub cache_path: PathBuf,
    pub backup_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version_url: env::VERSION_URL.to_owned(),
            assets_base: env::ASSETS_BASE.to_owned(),
            channel: env::CHANNEL.to_owned(),
            provider: env::PROVIDER.to_owned(),
            cache_path: env::cache_path(),
            backup_dir: env::backup_dir(),
        }
    }
}

impl Settings {
    pub fn locator(&self) -> AssetLocator {
        AssetLocator::new(&self.assets_base, &self.channel)
    }
}

/// Builds URLs under `<assets-base>/assetbundles/ver_<version>/<channel>/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetLocator {
    assets_base: String,
    channel: String,
}

impl AssetLocator {
    pub fn new(assets_base: &str, channel: &str) -> Self {
        Self {
            assets_base: assets_base.trim_end_matches('/').to_owned(),
            channel: channel.trim_matches('/').to_owned(),
        }
    }

    fn version_root(&self, version: &str) -> String {
        format!(
            "{}/assetbundles/ver_{version}/{}",
            self.assets_base, self.channel
        )
    }

    pub fn manifest_url(&self, version: &str) -> String {
        format!("{}/ablist.json", self.version_root(version))
    }

    pub fn asset_url(&self, base_version: &str, key: &EntryKey) -> String {
        format!("{}/{key}", self.version_root(base_version))
    }
}
