//! Redis-backed video status store.
//!
//! Records are JSON values under `chirp:video_status:{name}` and are never
//! deleted; they serve as a permanent audit trail for client polling.

use crate::domain::media::{EncodingStatus, VideoStatusRecord};
use crate::ports::repository::VideoStatusRepository;
use async_trait::async_trait;
use chrono::Utc;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, CreatePoolError, Pool, Runtime};
use std::error::Error;
use std::fmt;

const VIDEO_STATUS_PREFIX: &str = "chirp:video_status:";

pub type RedisError = deadpool_redis::redis::RedisError;
pub type PoolError = deadpool_redis::PoolError;

#[derive(Debug)]
pub enum RepoError {
    Redis(RedisError),
    Pool(PoolError),
    Serialization(serde_json::Error),
    CreatePool(String),
    Duplicate(String),
    Missing(String),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::Redis(e) => write!(f, "Redis error: {}", e),
            RepoError::Pool(e) => write!(f, "Pool error: {}", e),
            RepoError::Serialization(e) => write!(f, "Serialization error: {}", e),
            RepoError::CreatePool(e) => write!(f, "Create pool error: {}", e),
            RepoError::Duplicate(name) => write!(f, "Status record already exists for {}", name),
            RepoError::Missing(name) => write!(f, "No status record for {}", name),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RepoError::Redis(e) => Some(e),
            RepoError::Pool(e) => Some(e),
            RepoError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RedisError> for RepoError {
    fn from(err: RedisError) -> Self {
        RepoError::Redis(err)
    }
}

impl From<PoolError> for RepoError {
    fn from(err: PoolError) -> Self {
        RepoError::Pool(err)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::Serialization(err)
    }
}

impl From<CreatePoolError> for RepoError {
    fn from(err: CreatePoolError) -> Self {
        RepoError::CreatePool(format!("{}", err))
    }
}

/// Redis-backed `VideoStatusRepository` with a connection pool.
#[derive(Clone)]
pub struct RedisStatusRepository {
    pool: Pool,
}

impl RedisStatusRepository {
    pub fn new(redis_url: &str) -> Result<Self, RepoError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    fn key(name: &str) -> String {
        format!("{}{}", VIDEO_STATUS_PREFIX, name)
    }
}

#[async_trait]
impl VideoStatusRepository for RedisStatusRepository {
    async fn create(&self, name: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RepoError::from)?;
        let record = VideoStatusRecord::pending(name);
        let json = serde_json::to_string(&record).map_err(RepoError::from)?;

        // SET NX enforces the one-record-per-asset invariant.
        let created: bool = conn
            .set_nx(Self::key(name), json)
            .await
            .map_err(RepoError::from)?;
        if !created {
            return Err(Box::new(RepoError::Duplicate(name.to_string())));
        }
        Ok(())
    }

    async fn transition(
        &self,
        name: &str,
        status: EncodingStatus,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RepoError::from)?;
        let key = Self::key(name);

        let json: Option<String> = conn.get(&key).await.map_err(RepoError::from)?;
        let mut record: VideoStatusRecord = match json {
            Some(data) => serde_json::from_str(&data).map_err(RepoError::from)?,
            None => return Err(Box::new(RepoError::Missing(name.to_string()))),
        };

        record.status = status;
        record.updated_at = Utc::now();
        let json = serde_json::to_string(&record).map_err(RepoError::from)?;
        conn.set::<_, _, ()>(&key, json)
            .await
            .map_err(RepoError::from)?;
        Ok(())
    }

    async fn get(
        &self,
        name: &str,
    ) -> Result<Option<VideoStatusRecord>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RepoError::from)?;
        let json: Option<String> = conn.get(Self::key(name)).await.map_err(RepoError::from)?;
        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data).map_err(RepoError::from)?)),
            None => Ok(None),
        }
    }
}
