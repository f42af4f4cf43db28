//! Adapters - concrete implementations of ports.

pub mod http;
pub mod memory;
pub mod redis;
pub mod s3;
