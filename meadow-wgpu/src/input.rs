//! Light-control input adapter: translates polled keyboard state into
//! frame-context mutations, once per frame.

use crate::frame::{DisplayMode, FrameContext};

/// Polled key query implemented by the embedding application's input layer.
/// The adapter is the only component that interprets keys semantically.
pub trait InputSource {
    fn is_down(&self, key: Key) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    O,
    P,
    G,
    Digit(u8),
}

/// Applies the control scheme: WASD moves the light on the ground plane,
/// Q/E raises/lowers it, O/P shrink/grow the radius, G toggles the grass,
/// digits 0-9 pick the display mode.
pub struct InputAdapter {
    step: f32,
    grass_latch: bool,
}

impl InputAdapter {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            grass_latch: false,
        }
    }

    /// Sample the input once and mutate the frame context. Must run before
    /// any pass reads the context; the fixed frame order guarantees every
    /// reader sees this frame's values.
    pub fn sample(&mut self, input: &dyn InputSource, ctx: &mut FrameContext) {
        // Opposite keys per axis are mutually exclusive; first one wins.
        if input.is_down(Key::W) {
            ctx.light.position.z -= self.step;
        } else if input.is_down(Key::S) {
            ctx.light.position.z += self.step;
        }

        if input.is_down(Key::A) {
            ctx.light.position.x -= self.step;
        } else if input.is_down(Key::D) {
            ctx.light.position.x += self.step;
        }

        if input.is_down(Key::E) {
            ctx.light.position.y -= self.step;
        } else if input.is_down(Key::Q) {
            ctx.light.position.y += self.step;
        }

        if input.is_down(Key::O) {
            ctx.light.shrink_radius(self.step);
        } else if input.is_down(Key::P) {
            ctx.light.grow_radius(self.step);
        }

        // Edge-detected toggle: one transition per discrete press, however
        // many frames the key stays held.
        if input.is_down(Key::G) {
            if !self.grass_latch {
                ctx.vegetation_visible = !ctx.vegetation_visible;
                self.grass_latch = true;
            }
        } else {
            self.grass_latch = false;
        }

        for digit in 0..=9u8 {
            if input.is_down(Key::Digit(digit)) {
                ctx.display_mode = DisplayMode::from_selector(u32::from(digit));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use crate::frame::RADIUS_FLOOR;
    use std::collections::HashSet;

    struct FakeInput {
        down: HashSet<Key>,
    }

    impl FakeInput {
        fn holding(keys: &[Key]) -> Self {
            Self {
                down: keys.iter().copied().collect(),
            }
        }
    }

    impl InputSource for FakeInput {
        fn is_down(&self, key: Key) -> bool {
            self.down.contains(&key)
        }
    }

    fn context() -> FrameContext {
        FrameContext::new(&RendererConfig::default())
    }

    #[test]
    fn test_light_moves_one_step_per_axis_per_frame() {
        let mut adapter = InputAdapter::new(0.3);
        let mut ctx = context();
        let start = ctx.light.position;

        adapter.sample(&FakeInput::holding(&[Key::W, Key::A, Key::Q]), &mut ctx);
        assert_eq!(ctx.light.position.z, start.z - 0.3);
        assert_eq!(ctx.light.position.x, start.x - 0.3);
        assert_eq!(ctx.light.position.y, start.y + 0.3);
    }

    #[test]
    fn test_opposite_keys_do_not_cancel() {
        // First key of the pair wins outright; holding both must not jitter.
        let mut adapter = InputAdapter::new(0.3);
        let mut ctx = context();
        let start_z = ctx.light.position.z;

        adapter.sample(&FakeInput::holding(&[Key::W, Key::S]), &mut ctx);
        assert_eq!(ctx.light.position.z, start_z - 0.3);
    }

    #[test]
    fn test_radius_decrease_stops_at_floor() {
        let mut adapter = InputAdapter::new(0.3);
        let mut ctx = context();
        let held = FakeInput::holding(&[Key::O]);

        // 45.0 / 0.3 = 150 presses reach zero; keep going well past that.
        for _ in 0..400 {
            adapter.sample(&held, &mut ctx);
        }
        assert_eq!(ctx.light.radius, RADIUS_FLOOR);
    }

    #[test]
    fn test_grass_toggle_latches_while_held() {
        let mut adapter = InputAdapter::new(0.3);
        let mut ctx = context();
        assert!(ctx.vegetation_visible);

        let held = FakeInput::holding(&[Key::G]);
        for _ in 0..10 {
            adapter.sample(&held, &mut ctx);
        }
        // Exactly one transition across ten held frames.
        assert!(!ctx.vegetation_visible);

        // Release, press again: second transition.
        adapter.sample(&FakeInput::holding(&[]), &mut ctx);
        adapter.sample(&held, &mut ctx);
        assert!(ctx.vegetation_visible);
    }

    #[test]
    fn test_first_pressed_digit_selects_mode() {
        let mut adapter = InputAdapter::new(0.3);
        let mut ctx = context();

        adapter.sample(&FakeInput::holding(&[Key::Digit(2), Key::Digit(7)]), &mut ctx);
        assert_eq!(ctx.display_mode, DisplayMode::Pbr);
    }

    #[test]
    fn test_no_digit_keeps_current_mode() {
        let mut adapter = InputAdapter::new(0.3);
        let mut ctx = context();
        ctx.display_mode = DisplayMode::Lambert;

        adapter.sample(&FakeInput::holding(&[Key::W]), &mut ctx);
        assert_eq!(ctx.display_mode, DisplayMode::Lambert);
    }
}
