//! Ports - trait definitions implemented by adapters.

pub mod producer;
pub mod repository;
pub mod storage;
