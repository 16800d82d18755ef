//! Deferred shading pipeline with procedural instanced grass.
//!
//! One geometry pass rasterizes the scene into a five-attachment G-Buffer;
//! four independent lighting techniques shade it into their own HDR
//! targets every frame; a runtime-selectable compositing path (tonemap,
//! stylization post-process, or raw-buffer blit) puts one of them on the
//! display surface. Scene traversal, asset parsing, windowing and raw
//! input events belong to the embedding application and are consumed
//! through the types re-exported here.

pub mod assets;
pub mod backend;
pub mod config;
pub mod frame;
pub mod handle;
pub mod input;
pub mod material;
pub mod passes;
pub mod pipeline;
pub mod render_targets;
pub mod vegetation;

pub use backend::{Camera, MeshHandle, SceneEntity, WgpuBackend};
pub use config::RendererConfig;
pub use frame::{BlitSource, CompositeRoute, DisplayMode, FrameContext, LightState};
pub use input::{InputAdapter, InputSource, Key};
pub use material::{MaterialDescriptor, MaterialOverrides, TextureHandle};
pub use vegetation::GrassField;
