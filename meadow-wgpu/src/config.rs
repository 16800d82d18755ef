//! Renderer configuration.

use glam::Vec3;

/// Startup parameters for the deferred renderer. Every value can be
/// overridden by the embedding application; the defaults reproduce the
/// reference scene.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Number of grass blades scattered at startup.
    pub grass_count: usize,
    /// Side length of the square planar area the blades cover.
    pub grass_area: f32,
    /// Seed for the placement stream; the same seed yields the same field.
    pub grass_seed: u64,
    /// Wind direction for the grass sway (normalized on upload).
    pub wind_dir: Vec3,
    pub wind_amp: f32,
    /// Amplitude of the push applied to blades inside the light radius.
    pub hit_amp: f32,
    /// Tonemap exposure.
    pub exposure: f32,
    /// Initial point-light placement.
    pub light_position: Vec3,
    pub light_radius: f32,
    /// Per-frame step applied by the light-control keys.
    pub control_step: f32,
    /// Kuwahara filter radius in pixels.
    pub kuwahara_radius: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            grass_count: 250_000,
            grass_area: 125.0,
            grass_seed: 42,
            wind_dir: Vec3::new(1.0, 0.0, 0.0),
            wind_amp: 0.05,
            hit_amp: 0.5,
            exposure: 0.01,
            light_position: Vec3::new(0.0, 6.0, 0.0),
            light_radius: 45.0,
            control_step: 0.3,
            kuwahara_radius: 4.0,
        }
    }
}
