//! Chirp media pipeline - asynchronous video ingestion and HLS transcoding.
//!
//! Hexagonal architecture:
//! - domain/: pure media logic (status model, playlists, encoding)
//! - ports/: trait definitions
//! - adapters/: concrete implementations (S3, Redis, in-memory, HTTP inbound)
//! - application/: services driving the pipeline (encoding queue, publisher)
//! - config: environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::publisher::ArtifactPublisher;
pub use application::queue::EncodingQueue;
pub use config::Config;
