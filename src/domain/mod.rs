//! Domain layer - pure media logic.

pub mod av;
pub mod hls;
pub mod media;
