//! In-memory video status store for tests and single-node development.

use crate::domain::media::{EncodingStatus, VideoStatusRecord};
use crate::ports::repository::VideoStatusRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::error::Error;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStatusRepository {
    records: RwLock<HashMap<String, VideoStatusRecord>>,
}

impl InMemoryStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStatusRepository for InMemoryStatusRepository {
    async fn create(&self, name: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if records.contains_key(name) {
            return Err(format!("Status record already exists for {}", name).into());
        }
        records.insert(name.to_string(), VideoStatusRecord::pending(name));
        Ok(())
    }

    async fn transition(
        &self,
        name: &str,
        status: EncodingStatus,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records.get_mut(name) {
            Some(record) => {
                record.status = status;
                record.updated_at = Utc::now();
                Ok(())
            }
            None => Err(format!("No status record for {}", name).into()),
        }
    }

    async fn get(
        &self,
        name: &str,
    ) -> Result<Option<VideoStatusRecord>, Box<dyn Error + Send + Sync>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get() {
        let repo = InMemoryStatusRepository::new();
        repo.create("abc").await.unwrap();

        let record = repo.get("abc").await.unwrap().unwrap();
        assert_eq!(record.name, "abc");
        assert_eq!(record.status, EncodingStatus::Pending);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let repo = InMemoryStatusRepository::new();
        repo.create("abc").await.unwrap();
        assert!(repo.create("abc").await.is_err());
    }

    #[tokio::test]
    async fn test_transition_refreshes_updated_at() {
        let repo = InMemoryStatusRepository::new();
        repo.create("abc").await.unwrap();

        repo.transition("abc", EncodingStatus::Processing)
            .await
            .unwrap();

        let record = repo.get("abc").await.unwrap().unwrap();
        assert_eq!(record.status, EncodingStatus::Processing);
        assert!(record.updated_at >= record.created_at);
    }

    #[tokio::test]
    async fn test_transition_missing_record() {
        let repo = InMemoryStatusRepository::new();
        assert!(repo
            .transition("ghost", EncodingStatus::Failed)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_get_absent() {
        let repo = InMemoryStatusRepository::new();
        assert!(repo.get("ghost").await.unwrap().is_none());
    }
}
