//! Strictly-serial encoding queue.
//!
//! Admission is non-blocking: `enqueue` creates the Pending status record and
//! hands the source path to a single consumer task. The single consumer gives
//! FIFO ordering and the at-most-one-transcode-in-flight invariant without a
//! guard flag or re-entrant drain calls.

use crate::application::publisher::ArtifactPublisher;
use crate::domain::media::{id_from_path, EncodingStatus};
use crate::ports::producer::SegmentProducer;
use crate::ports::repository::VideoStatusRepository;
use crate::ports::storage::ObjectStorage;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct EncodingQueue {
    tx: mpsc::UnboundedSender<PathBuf>,
    repo: Arc<dyn VideoStatusRepository>,
}

impl EncodingQueue {
    /// Wire the queue and spawn its single worker task.
    pub fn start(
        repo: Arc<dyn VideoStatusRepository>,
        producer: Arc<dyn SegmentProducer>,
        storage: Arc<dyn ObjectStorage>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = EncodeWorker {
            repo: repo.clone(),
            producer,
            publisher: ArtifactPublisher::new(storage),
        };
        let handle = tokio::spawn(worker.run(rx));
        (Self { tx, repo }, handle)
    }

    /// Admit one uploaded video. Returns once the Pending record exists and
    /// the item is scheduled; encoding happens later on the worker task.
    pub async fn enqueue(&self, source_path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
        let name = id_from_path(source_path)
            .ok_or_else(|| format!("no asset id in path {:?}", source_path))?;
        self.repo.create(&name).await?;
        self.tx
            .send(source_path.to_path_buf())
            .map_err(|e| format!("encode worker is gone: {}", e))?;
        info!(asset = %name, "queued for HLS encoding");
        Ok(())
    }
}

struct EncodeWorker {
    repo: Arc<dyn VideoStatusRepository>,
    producer: Arc<dyn SegmentProducer>,
    publisher: ArtifactPublisher,
}

impl EncodeWorker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<PathBuf>) {
        while let Some(path) = rx.recv().await {
            let Some(name) = id_from_path(&path) else {
                error!(?path, "dropping queue item without an asset id");
                continue;
            };
            match self.process(&name, &path).await {
                Ok(()) => info!(asset = %name, "encoding completed"),
                Err(e) => {
                    error!(asset = %name, error = %e, "encoding failed");
                    // A failing status write must not take down the worker.
                    if let Err(e) = self.repo.transition(&name, EncodingStatus::Failed).await {
                        error!(asset = %name, error = %e, "could not record Failed status");
                    }
                }
            }
        }
    }

    async fn process(&self, name: &str, path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.repo
            .transition(name, EncodingStatus::Processing)
            .await?;

        let workdir = path
            .parent()
            .ok_or_else(|| format!("source {:?} has no parent directory", path))?
            .to_path_buf();

        self.producer.produce(path, &workdir).await?;
        self.publisher.publish(name, &workdir).await?;
        self.repo.transition(name, EncodingStatus::Completed).await?;
        Ok(())
    }
}
