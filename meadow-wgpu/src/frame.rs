//! Frame-global state threaded explicitly through the pass pipeline.

use glam::Vec3;

use crate::config::RendererConfig;

/// Lower bound for the light radius; a zero or negative radius is a
/// degenerate light the shading passes cannot attenuate against.
pub const RADIUS_FLOOR: f32 = 0.01;

/// The single point light shared by every lighting pass. One writer (the
/// input adapter at the top of the frame), many readers (every pass in the
/// same frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub position: Vec3,
    pub radius: f32,
}

impl LightState {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius: radius.max(RADIUS_FLOOR),
        }
    }

    pub fn grow_radius(&mut self, step: f32) {
        self.radius += step;
    }

    /// Shrinking stops at the floor, never at or below zero.
    pub fn shrink_radius(&mut self, step: f32) {
        self.radius = (self.radius - step).max(RADIUS_FLOOR);
    }
}

/// Which buffer reaches the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    PostProcess,
    #[default]
    Tonemap,
    Pbr,
    BlinnPhong,
    Lambert,
    Gouraud,
    RawPosition,
    RawNormal,
    RawAlbedo,
    RawOrdm,
}

/// Pipeline buffer a pass-through mode displays verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitSource {
    Pbr,
    BlinnPhong,
    Lambert,
    Gouraud,
    Position,
    Normal,
    Albedo,
    Ordm,
}

/// Compositing path a display mode routes through. PostProcess and Tonemap
/// run their full passes; everything else is a pass-through blit of an
/// already-rendered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeRoute {
    Stylize,
    Tonemap,
    Blit(BlitSource),
}

impl DisplayMode {
    /// Map the numeric selector to a mode. Anything outside 0-9 falls back
    /// to Tonemap rather than erroring.
    pub fn from_selector(value: u32) -> Self {
        match value {
            0 => Self::PostProcess,
            1 => Self::Tonemap,
            2 => Self::Pbr,
            3 => Self::BlinnPhong,
            4 => Self::Lambert,
            5 => Self::Gouraud,
            6 => Self::RawPosition,
            7 => Self::RawNormal,
            8 => Self::RawAlbedo,
            9 => Self::RawOrdm,
            _ => Self::Tonemap,
        }
    }

    /// Every mode resolves to exactly one compositing route; raw modes
    /// bypass the lighting and stylization passes entirely.
    pub fn route(self) -> CompositeRoute {
        match self {
            Self::PostProcess => CompositeRoute::Stylize,
            Self::Tonemap => CompositeRoute::Tonemap,
            Self::Pbr => CompositeRoute::Blit(BlitSource::Pbr),
            Self::BlinnPhong => CompositeRoute::Blit(BlitSource::BlinnPhong),
            Self::Lambert => CompositeRoute::Blit(BlitSource::Lambert),
            Self::Gouraud => CompositeRoute::Blit(BlitSource::Gouraud),
            Self::RawPosition => CompositeRoute::Blit(BlitSource::Position),
            Self::RawNormal => CompositeRoute::Blit(BlitSource::Normal),
            Self::RawAlbedo => CompositeRoute::Blit(BlitSource::Albedo),
            Self::RawOrdm => CompositeRoute::Blit(BlitSource::Ordm),
        }
    }
}

/// Mutable frame state, written once per frame by the input adapter and
/// read by every pass after that. Replaces ambient globals; read-after-write
/// within a frame is guaranteed by the fixed pass ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub light: LightState,
    pub display_mode: DisplayMode,
    pub vegetation_visible: bool,
    /// Shared animation clock in seconds, advanced by the embedder.
    pub time: f32,
    pub exposure: f32,
}

impl FrameContext {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            light: LightState::new(config.light_position, config.light_radius),
            display_mode: DisplayMode::default(),
            vegetation_visible: true,
            time: 0.0,
            exposure: config.exposure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_maps_every_mode() {
        assert_eq!(DisplayMode::from_selector(0), DisplayMode::PostProcess);
        assert_eq!(DisplayMode::from_selector(1), DisplayMode::Tonemap);
        assert_eq!(DisplayMode::from_selector(2), DisplayMode::Pbr);
        assert_eq!(DisplayMode::from_selector(3), DisplayMode::BlinnPhong);
        assert_eq!(DisplayMode::from_selector(4), DisplayMode::Lambert);
        assert_eq!(DisplayMode::from_selector(5), DisplayMode::Gouraud);
        assert_eq!(DisplayMode::from_selector(6), DisplayMode::RawPosition);
        assert_eq!(DisplayMode::from_selector(7), DisplayMode::RawNormal);
        assert_eq!(DisplayMode::from_selector(8), DisplayMode::RawAlbedo);
        assert_eq!(DisplayMode::from_selector(9), DisplayMode::RawOrdm);
    }

    #[test]
    fn test_selector_out_of_range_falls_back_to_tonemap() {
        assert_eq!(DisplayMode::from_selector(10), DisplayMode::Tonemap);
        assert_eq!(DisplayMode::from_selector(255), DisplayMode::Tonemap);
        assert_eq!(DisplayMode::from_selector(u32::MAX), DisplayMode::Tonemap);
    }

    #[test]
    fn test_every_selector_resolves_to_a_route() {
        // Including out-of-range values: no selector leaves the compositing
        // stage without a defined output.
        for value in 0..=64u32 {
            let mode = DisplayMode::from_selector(value);
            match mode.route() {
                CompositeRoute::Stylize => assert_eq!(mode, DisplayMode::PostProcess),
                CompositeRoute::Tonemap => assert_eq!(mode, DisplayMode::Tonemap),
                CompositeRoute::Blit(_) => {}
            }
        }
    }

    #[test]
    fn test_raw_modes_blit_gbuffer_attachments() {
        assert_eq!(
            DisplayMode::RawPosition.route(),
            CompositeRoute::Blit(BlitSource::Position)
        );
        assert_eq!(
            DisplayMode::RawNormal.route(),
            CompositeRoute::Blit(BlitSource::Normal)
        );
        assert_eq!(
            DisplayMode::RawAlbedo.route(),
            CompositeRoute::Blit(BlitSource::Albedo)
        );
        assert_eq!(
            DisplayMode::RawOrdm.route(),
            CompositeRoute::Blit(BlitSource::Ordm)
        );
    }

    #[test]
    fn test_radius_never_reaches_zero() {
        let mut light = LightState::new(Vec3::ZERO, 45.0);
        for _ in 0..1000 {
            light.shrink_radius(0.3);
        }
        assert_eq!(light.radius, RADIUS_FLOOR);
        assert!(light.radius > 0.0);
    }

    #[test]
    fn test_radius_floor_applies_at_construction() {
        let light = LightState::new(Vec3::ZERO, -5.0);
        assert_eq!(light.radius, RADIUS_FLOOR);
    }

    #[test]
    fn test_default_mode_is_tonemap() {
        let ctx = FrameContext::new(&RendererConfig::default());
        assert_eq!(ctx.display_mode, DisplayMode::Tonemap);
        assert!(ctx.vegetation_visible);
    }
}
