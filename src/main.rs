use chirp_media::adapters::http::{self, AppState};
use chirp_media::adapters::redis::RedisStatusRepository;
use chirp_media::adapters::s3::S3Storage;
use chirp_media::application::queue::EncodingQueue;
use chirp_media::config::Config;
use chirp_media::domain::av::HlsSegmentProducer;
use chirp_media::ports::repository::VideoStatusRepository;
use chirp_media::ports::storage::ObjectStorage;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt::init();

    tokio::fs::create_dir_all(&config.upload_video_dir)
        .await
        .expect("Failed to create upload directory");

    // 1. Adapters
    let repo: Arc<dyn VideoStatusRepository> = match RedisStatusRepository::new(&config.redis_url)
    {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            eprintln!("Failed to connect to Redis: {:?}", e);
            std::process::exit(1);
        }
    };
    let storage: Arc<dyn ObjectStorage> =
        Arc::new(S3Storage::from_env(config.s3_bucket.clone()).await);

    // 2. Encoding pipeline (single serial worker)
    let producer = Arc::new(HlsSegmentProducer::new());
    let (queue, _worker) = EncodingQueue::start(repo.clone(), producer, storage.clone());

    // 3. HTTP layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = http::router(AppState {
        config: config.clone(),
        queue: Arc::new(queue),
        repo,
        storage,
    })
    .layer(cors);

    // 4. Start server
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    info!("listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
