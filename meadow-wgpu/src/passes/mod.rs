//! Render pass implementations for the deferred pipeline.

pub mod gbuffer;
pub mod lighting;
pub mod postprocess;
pub mod present;
pub mod tonemap;
