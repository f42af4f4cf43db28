use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of media tracked by the backend. Only videos enter the encoding queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MediaType {
    Image,
    Video,
    Hls,
}

impl From<MediaType> for u8 {
    fn from(media_type: MediaType) -> u8 {
        media_type as u8
    }
}

impl TryFrom<u8> for MediaType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MediaType::Image),
            1 => Ok(MediaType::Video),
            2 => Ok(MediaType::Hls),
            other => Err(format!("invalid media type code: {other}")),
        }
    }
}

/// One media URL handed back to an upload caller.
#[derive(Debug, Clone, Serialize)]
pub struct Media {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

/// Encoding lifecycle of a video asset. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EncodingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl From<EncodingStatus> for u8 {
    fn from(status: EncodingStatus) -> u8 {
        status as u8
    }
}

impl TryFrom<u8> for EncodingStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EncodingStatus::Pending),
            1 => Ok(EncodingStatus::Processing),
            2 => Ok(EncodingStatus::Completed),
            3 => Ok(EncodingStatus::Failed),
            other => Err(format!("invalid encoding status code: {other}")),
        }
    }
}

/// Durable per-asset encoding record, keyed by the asset id. Records are
/// created once, updated on every transition and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStatusRecord {
    pub name: String,
    pub status: EncodingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoStatusRecord {
    pub fn pending(name: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            status: EncodingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derive the asset id from an uploaded file path: the file name minus its
/// final extension.
pub fn id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
}
