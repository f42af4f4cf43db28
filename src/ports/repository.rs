use crate::domain::media::{EncodingStatus, VideoStatusRecord};
use async_trait::async_trait;
use std::error::Error;

/// Durable per-asset status store. The encoding queue is the sole writer;
/// HTTP handlers only read.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait VideoStatusRepository: Send + Sync {
    /// Insert a Pending record for `name`; errors if one already exists.
    async fn create(&self, name: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Update the existing record's status and refresh its `updated_at`.
    async fn transition(
        &self,
        name: &str,
        status: EncodingStatus,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Read a record for client polling.
    async fn get(
        &self,
        name: &str,
    ) -> Result<Option<VideoStatusRecord>, Box<dyn Error + Send + Sync>>;
}
