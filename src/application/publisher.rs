//! Publishes a finished rendition tree to object storage.

use crate::ports::storage::ObjectStorage;
use futures::stream::{self, TryStreamExt};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Remote key prefix for published HLS artifacts.
pub const HLS_KEY_PREFIX: &str = "videos-hls";

/// Maximum uploads in flight for one asset.
const UPLOAD_CONCURRENCY: usize = 4;

pub struct ArtifactPublisher {
    storage: Arc<dyn ObjectStorage>,
}

impl ArtifactPublisher {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Upload every file under `workdir` to `videos-hls/{asset_id}/{relative}`,
    /// preserving the directory structure so playlist references resolve, then
    /// delete the working directory. On any upload failure the local tree is
    /// left in place and already-uploaded objects are not rolled back.
    pub async fn publish(
        &self,
        asset_id: &str,
        workdir: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let files = walk_files(workdir)?;
        let count = files.len();

        stream::iter(
            files
                .into_iter()
                .map(Ok::<_, Box<dyn Error + Send + Sync>>),
        )
        .try_for_each_concurrent(UPLOAD_CONCURRENCY, |(local_path, relative)| {
            let storage = self.storage.clone();
            let key = format!("{}/{}/{}", HLS_KEY_PREFIX, asset_id, relative);
            async move {
                let content_type = mime_guess::from_path(&local_path)
                    .first_or_octet_stream()
                    .to_string();
                storage.put_file(&key, &local_path, &content_type).await
            }
        })
        .await?;

        tokio::fs::remove_dir_all(workdir).await?;
        info!(asset = asset_id, files = count, "published HLS artifacts");
        Ok(())
    }
}

/// Enumerate every file under `root` with its `/`-joined relative path, using
/// an explicit directory stack rather than recursion.
pub fn walk_files(root: &Path) -> Result<Vec<(PathBuf, String)>, std::io::Error> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else {
                let relative = path
                    .strip_prefix(root)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((path, relative));
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::storage::MockObjectStorage;
    use std::sync::Mutex;

    async fn rendition_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.m3u8"), b"#EXTM3U")
            .await
            .unwrap();
        tokio::fs::create_dir(dir.path().join("720p")).await.unwrap();
        tokio::fs::write(dir.path().join("720p").join("seg0.ts"), b"ts data")
            .await
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_walk_files_relative_paths() {
        let dir = rendition_tree().await;
        let files = walk_files(dir.path()).unwrap();

        let relatives: Vec<&str> = files.iter().map(|(_, rel)| rel.as_str()).collect();
        assert_eq!(relatives, vec!["720p/seg0.ts", "a.m3u8"]);
        assert!(files.iter().all(|(abs, _)| abs.is_file()));
    }

    #[tokio::test]
    async fn test_publish_key_scheme_and_cleanup() {
        let dir = rendition_tree().await;
        let workdir = dir.path().to_path_buf();

        let keys = Arc::new(Mutex::new(Vec::new()));
        let seen = keys.clone();

        let mut storage = MockObjectStorage::new();
        storage
            .expect_put_file()
            .times(2)
            .returning(move |key, _, _| {
                seen.lock().unwrap().push(key.to_string());
                Box::pin(async move { Ok(()) })
            });

        let publisher = ArtifactPublisher::new(Arc::new(storage));
        publisher.publish("abc123", &workdir).await.unwrap();

        let mut uploaded = keys.lock().unwrap().clone();
        uploaded.sort();
        assert_eq!(
            uploaded,
            vec![
                "videos-hls/abc123/720p/seg0.ts".to_string(),
                "videos-hls/abc123/a.m3u8".to_string(),
            ]
        );
        assert!(!workdir.exists());
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_local_files() {
        let dir = rendition_tree().await;
        let workdir = dir.path().to_path_buf();

        let mut storage = MockObjectStorage::new();
        storage.expect_put_file().returning(|_, _, _| {
            Box::pin(async move { Err("connection reset".to_string().into()) })
        });

        let publisher = ArtifactPublisher::new(Arc::new(storage));
        let result = publisher.publish("abc123", &workdir).await;

        assert!(result.is_err());
        assert!(workdir.exists());
        assert!(workdir.join("a.m3u8").exists());
        assert!(workdir.join("720p").join("seg0.ts").exists());
    }

    #[tokio::test]
    async fn test_publish_guesses_content_types() {
        let dir = rendition_tree().await;
        let workdir = dir.path().to_path_buf();

        let types = Arc::new(Mutex::new(Vec::new()));
        let seen = types.clone();

        let mut storage = MockObjectStorage::new();
        storage
            .expect_put_file()
            .times(2)
            .returning(move |key, _, content_type| {
                seen.lock()
                    .unwrap()
                    .push((key.to_string(), content_type.to_string()));
                Box::pin(async move { Ok(()) })
            });

        let publisher = ArtifactPublisher::new(Arc::new(storage));
        publisher.publish("abc123", &workdir).await.unwrap();

        let uploaded = types.lock().unwrap().clone();
        let playlist = uploaded
            .iter()
            .find(|(key, _)| key.ends_with(".m3u8"))
            .unwrap();
        assert!(playlist.1.contains("mpegurl"));
    }
}
