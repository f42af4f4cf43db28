use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

/// An object fetched from storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Remote object storage holding published HLS artifacts.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStorage: Send + Sync {
    /// Upload a local file under `key` with the given content type.
    async fn put_file(
        &self,
        key: &str,
        local_path: &Path,
        content_type: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Fetch an object, or `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Box<dyn Error + Send + Sync>>;
}
