use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

/// Seam between the encoding queue and the transcoding engine.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SegmentProducer: Send + Sync {
    /// Produce the full HLS rendition tree for `source` inside `workdir`.
    async fn produce(
        &self,
        source: &Path,
        workdir: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
