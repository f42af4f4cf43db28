//! Inbound HTTP adapter: upload ingress, status polling and media delivery.

pub mod media;
pub mod statics;

use crate::application::queue::EncodingQueue;
use crate::config::Config;
use crate::ports::repository::VideoStatusRepository;
use crate::ports::storage::ObjectStorage;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared state for the media routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub queue: Arc<EncodingQueue>,
    pub repo: Arc<dyn VideoStatusRepository>,
    pub storage: Arc<dyn ObjectStorage>,
}

/// Assemble the media router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/medias/upload-video-hls",
            post(media::upload_video_hls)
                .layer(DefaultBodyLimit::max(media::MAX_VIDEO_UPLOAD_BYTES)),
        )
        .route("/medias/video-status/:name", get(media::video_status))
        .route("/static/video/:name", get(statics::serve_video_stream))
        .route(
            "/static/video-hls/:id/master.m3u8",
            get(statics::serve_master_playlist),
        )
        .route(
            "/static/video-hls/:id/:rendition/:segment",
            get(statics::serve_hls_segment),
        )
        .with_state(state)
}
