//! Video probing and HLS encoding via ffmpeg/ffprobe subprocesses.

pub mod cmd;
pub mod encode;

use crate::ports::producer::SegmentProducer;
use async_trait::async_trait;
use cmd::RealEncodeRunner;
use encode::encode_hls;
use std::error::Error;
use std::path::Path;

/// Production `SegmentProducer` backed by ffmpeg subprocesses.
pub struct HlsSegmentProducer {
    runner: RealEncodeRunner,
}

impl HlsSegmentProducer {
    pub fn new() -> Self {
        Self {
            runner: RealEncodeRunner,
        }
    }
}

impl Default for HlsSegmentProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SegmentProducer for HlsSegmentProducer {
    async fn produce(
        &self,
        source: &Path,
        workdir: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        encode_hls(source, workdir, &self.runner).await?;
        Ok(())
    }
}
