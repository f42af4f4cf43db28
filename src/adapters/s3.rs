use crate::ports::storage::{ObjectStorage, StoredObject};
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::error::Error;
use std::path::Path;

/// S3Storage implements ObjectStorage for AWS S3.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Build a client from the ambient AWS environment (region, credentials).
    pub async fn from_env(bucket: String) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), bucket)
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_file(
        &self,
        key: &str,
        local_path: &Path,
        content_type: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let body = ByteStream::from_path(local_path).await?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Box<dyn Error + Send + Sync>> {
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => {
                let content_type = output.content_type().map(str::to_owned);
                let bytes = output.body.collect().await?.into_bytes().to_vec();
                Ok(Some(StoredObject {
                    bytes,
                    content_type,
                }))
            }
            Err(SdkError::ServiceError(context)) if context.err().is_no_such_key() => Ok(None),
            Err(err) => Err(Box::new(err)),
        }
    }
}
