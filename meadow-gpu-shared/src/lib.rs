//! GPU-side data layouts and embedded WGSL shader sources shared by the
//! meadow deferred rendering pipeline.

pub mod shaders;
pub mod uniforms;
