//! Media delivery: ranged local streaming and HLS proxying from object storage.

use super::AppState;
use crate::application::publisher::HLS_KEY_PREFIX;
use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use regex::Regex;
use serde_json::json;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Fixed byte window served per ranged request. Clients issue successive
/// ranged requests to continue consuming the stream.
pub const STREAM_CHUNK_SIZE: u64 = 1_000_000;

/// Serve a `bytes={start}-` window of a locally stored video. The Range
/// header is mandatory; an explicit end offset, if present, is ignored and
/// the window is capped at `STREAM_CHUNK_SIZE` past `start` or end of file.
pub async fn serve_video_stream(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    let Some(range) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Range header is required" })),
        )
            .into_response();
    };
    let Some(start) = parse_range_start(range) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Malformed Range header" })),
        )
            .into_response();
    };
    if name.contains("..") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid name" })),
        )
            .into_response();
    }

    let path = PathBuf::from(&state.config.upload_video_dir).join(&name);
    match ranged_file_response(&path, start).await {
        Ok(response) => response,
        Err(err) => {
            let status = match err.kind() {
                std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({ "message": err.to_string() }))).into_response()
        }
    }
}

/// Proxy an asset's master playlist from object storage.
pub async fn serve_master_playlist(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Response {
    if id.contains("..") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid key" })),
        )
            .into_response();
    }
    proxy_object(&state, &format!("{}/{}/master.m3u8", HLS_KEY_PREFIX, id)).await
}

/// Proxy one rendition playlist or media segment from object storage.
pub async fn serve_hls_segment(
    State(state): State<AppState>,
    UrlPath((id, rendition, segment)): UrlPath<(String, String, String)>,
) -> Response {
    let key = format!("{}/{}/{}/{}", HLS_KEY_PREFIX, id, rendition, segment);
    if key.contains("..") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid key" })),
        )
            .into_response();
    }
    proxy_object(&state, &key).await
}

/// Extract the start offset from a `bytes={start}-...` header value.
fn parse_range_start(value: &str) -> Option<u64> {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    let re = RANGE_RE.get_or_init(|| Regex::new(r"^bytes=(\d+)-").unwrap());
    re.captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

async fn ranged_file_response(path: &Path, start: u64) -> Result<Response, std::io::Error> {
    let metadata = tokio::fs::metadata(path).await?;
    let size = metadata.len();
    if size == 0 || start >= size {
        let response = Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{}", size))
            .body(Body::empty())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        return Ok(response);
    }

    let end = std::cmp::min(start + STREAM_CHUNK_SIZE, size - 1);
    let content_length = end - start + 1;

    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(start)).await?;
    let stream = ReaderStream::new(file.take(content_length));

    let content_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("video/*");

    let response = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, size),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from_stream(stream))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(response)
}

async fn proxy_object(state: &AppState, key: &str) -> Response {
    match state.storage.get(key).await {
        Ok(Some(object)) => {
            let content_type = object
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            ([(header::CONTENT_TYPE, content_type)], object.bytes).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "File not found" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": e.to_string() })),
        )
            .into_response(),
    }
}
