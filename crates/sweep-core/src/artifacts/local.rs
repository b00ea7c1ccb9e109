//! Filesystem-backed artifact store.
//!
//! Layout: `<root>/<bucket>/<key>`, addressed as `file://<root>/<bucket>/<key>`.
//! Objects are write-once: a second `put` to the same key fails.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::artifacts::errors::ArtifactError;
use crate::artifacts::traits::ArtifactStore;
use crate::artifacts::types::ArtifactUri;

const SCHEME: &str = "file://";

pub struct LocalArtifactStore {
    bucket: String,
    bucket_dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let bucket_dir = root.into().join(&bucket);
        Self { bucket, bucket_dir }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, ArtifactError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ArtifactError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.bucket_dir.join(relative))
    }

    fn path_for_uri(&self, uri: &ArtifactUri) -> Result<PathBuf, ArtifactError> {
        let foreign = || ArtifactError::ForeignUri {
            uri: uri.to_string(),
        };
        let path = uri.as_str().strip_prefix(SCHEME).ok_or_else(&foreign)?;
        let key = Path::new(path)
            .strip_prefix(&self.bucket_dir)
            .map_err(|_| foreign())?;
        self.object_path(&key.to_string_lossy())
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, body: &str) -> Result<ArtifactUri, ArtifactError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ArtifactError::AlreadyExists {
                    key: key.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;

        let uri = ArtifactUri::new(format!("{}{}", SCHEME, path.display()));
        debug!(
            event = "core.artifacts.put_completed",
            uri = %uri,
            bytes = body.len()
        );
        Ok(uri)
    }

    async fn get(&self, uri: &ArtifactUri) -> Result<String, ArtifactError> {
        let path = self.path_for_uri(uri)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ArtifactError::NotFound {
                uri: uri.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn prune(&self, prefix: &str, max_age: Duration) -> Result<usize, ArtifactError> {
        let dir = self.object_path(prefix)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified()?;
            if modified >= cutoff {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    event = "core.artifacts.prune_entry_failed",
                    path = %entry.path().display(),
                    error = %e,
                ),
            }
        }

        info!(
            event = "core.artifacts.prune_completed",
            prefix = prefix,
            removed = removed,
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "bucket");

        let uri = store.put("nuke-configs/a.yaml", "regions: []").await.unwrap();
        assert!(uri.as_str().starts_with("file://"));
        assert!(uri.as_str().ends_with("bucket/nuke-configs/a.yaml"));
        assert_eq!(store.get(&uri).await.unwrap(), "regions: []");
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "bucket");

        let uri = store.put("nuke-configs/a.yaml", "first").await.unwrap();
        assert!(matches!(
            store.put("nuke-configs/a.yaml", "second").await,
            Err(ArtifactError::AlreadyExists { .. })
        ));
        assert_eq!(store.get(&uri).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "bucket");

        for key in ["../outside", "/etc/passwd", "", "a/../../b"] {
            assert!(
                matches!(
                    store.put(key, "x").await,
                    Err(ArtifactError::InvalidKey { .. })
                ),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_get_foreign_uri() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "bucket");

        let result = store
            .get(&ArtifactUri::new("s3://other-bucket/key.yaml"))
            .await;
        assert!(matches!(result, Err(ArtifactError::ForeignUri { .. })));

        let result = store
            .get(&ArtifactUri::new("file:///somewhere/else/key.yaml"))
            .await;
        assert!(matches!(result, Err(ArtifactError::ForeignUri { .. })));
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "bucket");
        let uri = ArtifactUri::new(format!(
            "file://{}",
            dir.path().join("bucket/nuke-configs/missing.yaml").display()
        ));
        assert!(matches!(
            store.get(&uri).await,
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_prune_removes_only_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "bucket");
        store.put("nuke-outputs/old.txt", "old").await.unwrap();

        // Older than 1ms once the sleep has passed.
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(
            store
                .prune("nuke-outputs", Duration::from_millis(1))
                .await
                .unwrap(),
            1
        );

        store.put("nuke-outputs/new.txt", "new").await.unwrap();
        assert_eq!(
            store
                .prune("nuke-outputs", Duration::from_secs(3600))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_prune_missing_prefix_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "bucket");
        assert_eq!(
            store.prune("run-logs", Duration::from_secs(1)).await.unwrap(),
            0
        );
    }
}
