// TTL file cache for slowly-changing reference payloads.
//
// One JSON file per (key, suffix) pair under the configured directory.
// Freshness comes from the file modification time, so refreshing an entry
// is just an atomic overwrite.
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CacheError, ClientError};

/// Bumped whenever the on-disk layout changes; entries with any other
/// version fail the read deterministically instead of misparsing.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    payload: T,
}

pub struct ReferenceDataCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ReferenceDataCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_seconds: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Return the cached payload for `(key, suffix)` if fresh, otherwise
    /// invoke `fetch`, persist its result and return it.
    ///
    /// Fetch failures propagate unchanged; there is no retry here and no
    /// fallback to an expired entry.
    pub async fn get<T, F, Fut>(
        &self,
        key: &str,
        suffix: Option<&str>,
        fetch: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let path = self.entry_path(key, suffix);
        if self.is_fresh(&path) {
            return self.load(&path);
        }
        let payload = fetch().await?;
        self.store(&path, &payload)?;
        Ok(payload)
    }

    fn entry_path(&self, key: &str, suffix: Option<&str>) -> PathBuf {
        match suffix {
            Some(suffix) => self.dir.join(format!("{key}_{suffix}.json")),
            None => self.dir.join(format!("{key}.json")),
        }
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            debug!("'{}' cache file not found", path.display());
            return false;
        };
        let Ok(mtime) = meta.modified() else {
            return false;
        };
        let age = SystemTime::now()
            .duration_since(mtime)
            .unwrap_or(Duration::ZERO);
        if age < self.ttl {
            debug!(
                "'{}' cache data is valid for another {}s",
                path.display(),
                (self.ttl - age).as_secs()
            );
            true
        } else {
            debug!("'{}' cache is expired", path.display());
            false
        }
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T, CacheError> {
        debug!("loading data from '{}' cache file", path.display());
        let bytes = fs::read(path)?;
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|err| CacheError::Corrupt {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        if envelope.version != FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path: path.display().to_string(),
                found: envelope.version,
                expected: FORMAT_VERSION,
            });
        }
        serde_json::from_value(envelope.payload).map_err(|err| CacheError::Corrupt {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    fn store<T: Serialize>(&self, path: &Path, payload: &T) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let envelope = Envelope {
            version: FORMAT_VERSION,
            payload,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        // Write to a temp file and rename so a concurrent reader never
        // observes a torn entry.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        debug!("stored '{}' cache file", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RefItem;
    use tempfile::TempDir;

    fn payload() -> Vec<RefItem> {
        vec![
            RefItem {
                name: "Ford".into(),
                value: 24,
            },
            RefItem {
                name: "Škoda".into(),
                value: 70,
            },
        ]
    }

    #[tokio::test]
    async fn miss_fetches_and_stores() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 3600);

        let got: Vec<RefItem> = cache
            .get("makes", None, || async { Ok(payload()) })
            .await
            .unwrap();
        assert_eq!(got, payload());
        assert!(tmp.path().join("makes.json").exists());
    }

    #[tokio::test]
    async fn fresh_hit_skips_fetch() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 3600);

        cache
            .get::<Vec<RefItem>, _, _>("makes", None, || async { Ok(payload()) })
            .await
            .unwrap();

        // If this fetch ran, get() would return its error.
        let got: Vec<RefItem> = cache
            .get("makes", None, || async {
                Err(ClientError::Transport("should not fetch".into()))
            })
            .await
            .unwrap();
        assert_eq!(got, payload());
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 0);

        let first: Vec<RefItem> = cache
            .get("makes", None, || async { Ok(payload()) })
            .await
            .unwrap();
        let second: Vec<RefItem> = cache
            .get("makes", None, || async {
                Ok(vec![RefItem {
                    name: "Opel".into(),
                    value: 55,
                }])
            })
            .await
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(second[0].name, "Opel");
    }

    #[tokio::test]
    async fn fetch_error_propagates_unchanged() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 3600);

        let err = cache
            .get::<Vec<RefItem>, _, _>("makes", None, || async { Err(ClientError::Timeout) })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Fetch(ClientError::Timeout)));
        assert!(!tmp.path().join("makes.json").exists());
    }

    #[tokio::test]
    async fn suffix_disambiguates_entries() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 3600);

        cache
            .get::<Vec<RefItem>, _, _>("models", Some("24"), || async { Ok(payload()) })
            .await
            .unwrap();
        let other: Vec<RefItem> = cache
            .get("models", Some("55"), || async {
                Ok(vec![RefItem {
                    name: "Astra".into(),
                    value: 9,
                }])
            })
            .await
            .unwrap();

        assert!(tmp.path().join("models_24.json").exists());
        assert!(tmp.path().join("models_55.json").exists());
        assert_eq!(other[0].name, "Astra");

        // Each entry still reads back its own payload.
        let first: Vec<RefItem> = cache
            .get("models", Some("24"), || async {
                Err(ClientError::Transport("should not fetch".into()))
            })
            .await
            .unwrap();
        assert_eq!(first, payload());
    }

    #[tokio::test]
    async fn corrupted_entry_is_a_hard_read_failure() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 3600);

        std::fs::write(tmp.path().join("makes.json"), b"not json at all").unwrap();

        let err = cache
            .get::<Vec<RefItem>, _, _>("makes", None, || async { Ok(payload()) })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn version_mismatch_is_detected() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 3600);

        std::fs::write(
            tmp.path().join("makes.json"),
            br#"{"version": 99, "payload": []}"#,
        )
        .unwrap();

        let err = cache
            .get::<Vec<RefItem>, _, _>("makes", None, || async { Ok(payload()) })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::VersionMismatch { found: 99, expected: FORMAT_VERSION, .. }
        ));
    }

    #[tokio::test]
    async fn stored_payload_round_trips_exactly() {
        let tmp = TempDir::new().unwrap();
        let cache = ReferenceDataCache::new(tmp.path(), 3600);

        let stored: Vec<RefItem> = cache
            .get("makes", None, || async { Ok(payload()) })
            .await
            .unwrap();
        let loaded: Vec<RefItem> = cache
            .get("makes", None, || async {
                Err(ClientError::Transport("should not fetch".into()))
            })
            .await
            .unwrap();
        assert_eq!(stored, loaded);
    }
}
