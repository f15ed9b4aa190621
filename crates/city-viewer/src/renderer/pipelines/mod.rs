//! Render pipelines: the lit mesh pass and the blit to the swap chain.

pub mod blit;
pub mod mesh;
