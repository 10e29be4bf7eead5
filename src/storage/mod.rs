use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tokio::fs;

use crate::engine::models::Manifest;
use crate::env::CACHE_FILE;
use crate::error::{AblistError, Result};

const BACKUP_SUFFIX: &str = ".bak";

/// Owns the on-disk manifest cache and its backup copy.
#[derive(Clone, Debug)]
pub struct CacheStore {
    cache_path: PathBuf,
    backup_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_path: PathBuf, backup_dir: PathBuf) -> Self {
        Self {
            cache_path,
            backup_dir,
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// `<backup_dir>/<cache name>.bak`; the suffix keeps it distinct from the
    /// cache even when both share a directory.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .cache_path
            .file_name()
            .map(|name| name.to_owned())
            .unwrap_or_else(|| CACHE_FILE.into());
        name.push(BACKUP_SUFFIX);
        self.backup_dir.join(name)
    }

    /// Read the manifest saved by the previous run.
    pub async fn load_cached_manifest(&self) -> Result<Manifest> {
        let bytes = match fs::read(&self.cache_path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AblistError::NotFound(self.cache_path.clone()));
            }
            Err(err) => {
                return Err(AblistError::filesystem(
                    format!("failed to read {}", self.cache_path.display()),
                    err,
                ));
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("cache: {} is empty", self.cache_path.display());
            return Ok(Manifest::default());
        }
        Manifest::from_slice(&bytes)
    }

    /// Like [`Self::load_cached_manifest`] but a missing cache counts as empty.
    pub async fn load_or_empty(&self) -> Result<Manifest> {
        match self.load_cached_manifest().await {
            Err(AblistError::NotFound(path)) => {
                info!(
                    "cache: no cached manifest at {}, treating as first run",
                    path.display()
                );
                Ok(Manifest::default())
            }
            other => other,
        }
    }

    /// Replace the cache with `bytes`, keeping a copy of the previous file.
    pub async fn persist(&self, bytes: &[u8]) -> Result<()> {
        self.backup().await;

        if let Some(parent) = self.cache_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AblistError::filesystem("unable to create cache dir", e))?;
        }

        let staging = self.cache_path.with_extension("json.tmp");
        fs::write(&staging, bytes)
            .await
            .map_err(|e| AblistError::filesystem("unable to write staged manifest", e))?;
        fs::rename(&staging, &self.cache_path)
            .await
            .map_err(|e| AblistError::filesystem("unable to replace cached manifest", e))?;
        info!(
            "cache: wrote {} bytes to {}",
            bytes.len(),
            self.cache_path.display()
        );
        Ok(())
    }

    /// Best-effort; failures only warn.
    async fn backup(&self) {
        if fs::metadata(&self.cache_path).await.is_err() {
            debug!("cache: nothing to back up");
            return;
        }
        let dest = self.backup_path();
        if let Err(err) = fs::create_dir_all(&self.backup_dir).await {
            warn!(
                "cache: unable to create backup dir {}: {err}",
                self.backup_dir.display()
            );
            return;
        }
        match fs::copy(&self.cache_path, &dest).await {
            Ok(_) => debug!("cache: backed up previous manifest to {}", dest.display()),
            Err(err) => warn!("cache: backup to {} failed: {err}", dest.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::Entry;

    const SAMPLE: &str = r#"{"baseVersion":"88","data":[
        {"hash":"aa11","path":"/chara/001.bundle","crc":"100"},
        {"hash":"bb22","path":"/chara/002.bundle","crc":200}
    ]}"#;

    fn store_in(dir: &Path) -> CacheStore {
        CacheStore::new(dir.join("assets").join("ablist.json"), dir.join("backup"))
    }

    #[tokio::test]
    async fn missing_cache_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.load_cached_manifest().await.unwrap_err();
        assert!(matches!(err, AblistError::NotFound(_)));
        assert_eq!(store.load_or_empty().await.unwrap(), Manifest::default());
    }

    #[tokio::test]
    async fn empty_cache_file_is_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(store.cache_path(), b"  \n").unwrap();
        assert!(store.load_or_empty().await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn corrupt_cache_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(store.cache_path(), b"{\"data\": [").unwrap();
        let err = store.load_or_empty().await.unwrap_err();
        assert!(matches!(err, AblistError::Parse { .. }));
    }

    #[tokio::test]
    async fn persisted_manifest_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.persist(SAMPLE.as_bytes()).await.unwrap();

        let loaded = store.load_cached_manifest().await.unwrap();
        let fetched = Manifest::from_slice(SAMPLE.as_bytes()).unwrap();
        assert_eq!(loaded.crc_index(), fetched.crc_index());
        assert_eq!(
            loaded.data[1],
            Entry {
                hash: "bb22".into(),
                path: "/chara/002.bundle".into(),
                crc: "200".into(),
            }
        );
        assert!(!store.cache_path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn persist_backs_up_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.persist(b"{\"baseVersion\":\"1\",\"data\":[]}").await.unwrap();
        assert!(!store.backup_path().exists());

        store.persist(SAMPLE.as_bytes()).await.unwrap();
        let backup = std::fs::read(store.backup_path()).unwrap();
        assert_eq!(backup, b"{\"baseVersion\":\"1\",\"data\":[]}");
        assert_eq!(std::fs::read(store.cache_path()).unwrap(), SAMPLE.as_bytes());
    }

    #[tokio::test]
    async fn backup_beside_cache_keeps_previous_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("ablist.json"), dir.path().to_path_buf());
        assert_ne!(store.backup_path(), store.cache_path());
        assert_eq!(store.backup_path(), dir.path().join("ablist.json.bak"));

        store.persist(b"{\"baseVersion\":\"1\",\"data\":[]}").await.unwrap();
        store.persist(b"{\"baseVersion\":\"2\",\"data\":[]}").await.unwrap();
        assert_eq!(
            std::fs::read(store.backup_path()).unwrap(),
            b"{\"baseVersion\":\"1\",\"data\":[]}"
        );
        assert_eq!(
            std::fs::read(store.cache_path()).unwrap(),
            b"{\"baseVersion\":\"2\",\"data\":[]}"
        );
    }

    #[tokio::test]
    async fn backup_failure_does_not_abort_persist() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the backup directory should be.
        let blocker = dir.path().join("backup");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let store = store_in(dir.path());
        store.persist(b"{\"baseVersion\":\"1\",\"data\":[]}").await.unwrap();
        store.persist(SAMPLE.as_bytes()).await.unwrap();
        assert_eq!(std::fs::read(store.cache_path()).unwrap(), SAMPLE.as_bytes());
    }
}
