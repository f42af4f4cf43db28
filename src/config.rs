//! Environment configuration.

use std::env;

/// Configuration for the media server process.
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Public base URL clients use to reach the static media routes
    pub host: String,
    /// Redis connection URL (video status store)
    pub redis_url: String,
    /// S3 bucket for published HLS artifacts
    pub s3_bucket: String,
    /// Directory holding uploaded videos and their encode working directories
    pub upload_video_dir: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            host: env::var("HOST").unwrap_or_else(|_| String::from("http://localhost:3000")),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| String::from("redis://127.0.0.1/")),
            s3_bucket: env::var("S3_BUCKET_NAME").unwrap_or_else(|_| String::from("chirp-media")),
            upload_video_dir: env::var("UPLOAD_VIDEO_DIR")
                .unwrap_or_else(|_| String::from("uploads/videos")),
        }
    }
}
