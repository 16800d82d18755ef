/// Embedded WGSL shader source strings for the deferred rendering pipeline.

pub const FULLSCREEN_VERT: &str = include_str!("../shaders/fullscreen.wgsl");
pub const GBUFFER_VERT: &str = include_str!("../shaders/gbuffer_vert.wgsl");
pub const GBUFFER_GRASS_VERT: &str = include_str!("../shaders/gbuffer_grass_vert.wgsl");
pub const GBUFFER_FRAG: &str = include_str!("../shaders/gbuffer_frag.wgsl");
pub const LIGHT_GOURAUD_FRAG: &str = include_str!("../shaders/light_gouraud.wgsl");
pub const LIGHT_LAMBERT_FRAG: &str = include_str!("../shaders/light_lambert.wgsl");
pub const LIGHT_BLINN_PHONG_FRAG: &str = include_str!("../shaders/light_blinn_phong.wgsl");
pub const LIGHT_PBR_FRAG: &str = include_str!("../shaders/light_pbr.wgsl");
pub const TONEMAP_REINHARD_FRAG: &str = include_str!("../shaders/tonemap_reinhard.wgsl");
pub const POST_KUWAHARA_FRAG: &str = include_str!("../shaders/post_kuwahara.wgsl");
pub const BLIT_FRAG: &str = include_str!("../shaders/blit.wgsl");
