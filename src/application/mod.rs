//! Application services driving the encoding pipeline.

pub mod publisher;
pub mod queue;
