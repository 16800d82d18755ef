//! Procedural grass field: seeded blade placement and the per-instance
//! attribute stream consumed by the instanced geometry sub-pass.

use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::assets::MeshData;

/// Per-instance attribute record bound at the instance-step vertex buffer
/// slot. Instances share one base mesh; all spatial variation is encoded
/// here, not in per-instance matrices.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GrassInstance {
    pub offset: [f32; 3],
    /// Y-axis rotation in radians.
    pub rotation: f32,
    pub scale: f32,
    /// Per-blade phase seed in [0, 1) for the wind sway.
    pub seed: f32,
}

pub const GRASS_INSTANCE_STRIDE: u64 = std::mem::size_of::<GrassInstance>() as u64;

pub const GRASS_SCALE_MIN: f32 = 0.8;
pub const GRASS_SCALE_MAX: f32 = 1.4;

/// The generated blade population. Immutable after generation.
pub struct GrassField {
    pub instances: Vec<GrassInstance>,
    pub area: f32,
}

impl GrassField {
    /// Scatter `count` blades across a square of side `area` centered on
    /// the origin. The stream is seeded explicitly: the same seed always
    /// produces the same field.
    pub fn generate(count: usize, area: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut instances = Vec::with_capacity(count);
        for _ in 0..count {
            let x = (rng.random::<f32>() - 0.5) * area;
            let z = (rng.random::<f32>() - 0.5) * area;
            let y = rng.random::<f32>() * 0.005 * area + 0.001;
            instances.push(GrassInstance {
                offset: [x, y, z],
                rotation: rng.random::<f32>() * std::f32::consts::TAU,
                scale: GRASS_SCALE_MIN + rng.random::<f32>() * (GRASS_SCALE_MAX - GRASS_SCALE_MIN),
                seed: rng.random::<f32>(),
            });
        }
        Self { instances, area }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Raw attribute stream for the GPU instance buffer.
    pub fn raw(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Blade geometry: a narrow vertical strip with four height segments so
/// the vertex stage can bend it, root at y = 0. uv.y runs 0 at the root to
/// 1 at the tip and doubles as the bend factor.
pub fn blade_mesh() -> MeshData {
    const WIDTH: f32 = 0.25;
    const HEIGHT: f32 = 3.0;
    const SEGMENTS: u32 = 4;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut tangents = Vec::new();
    for row in 0..=SEGMENTS {
        let v = row as f32 / SEGMENTS as f32;
        for col in 0..=1u32 {
            let u = col as f32;
            positions.push([(u - 0.5) * WIDTH, v * HEIGHT, 0.0]);
            normals.push([0.0, 0.0, 1.0]);
            uvs.push([u, v]);
            tangents.push([1.0, 0.0, 0.0, 1.0]);
        }
    }

    let mut indices = Vec::new();
    for row in 0..SEGMENTS {
        let base = row * 2;
        indices.extend_from_slice(&[base, base + 1, base + 3, base, base + 3, base + 2]);
    }

    MeshData {
        positions,
        normals,
        uvs,
        tangents,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_stride_matches_attribute_layout() {
        // offset vec3 + rotation + scale + seed, tightly packed.
        assert_eq!(GRASS_INSTANCE_STRIDE, 24);
    }

    #[test]
    fn test_full_population_within_bounds() {
        let area = 125.0;
        let field = GrassField::generate(250_000, area, 42);
        assert_eq!(field.len(), 250_000);

        let half = area / 2.0;
        for inst in &field.instances {
            assert!(inst.offset[0] >= -half && inst.offset[0] <= half);
            assert!(inst.offset[2] >= -half && inst.offset[2] <= half);
            assert!(inst.offset[1] > 0.0);
            assert!(inst.scale >= GRASS_SCALE_MIN && inst.scale <= GRASS_SCALE_MAX);
            assert!(inst.rotation >= 0.0 && inst.rotation < std::f32::consts::TAU);
            assert!(inst.seed >= 0.0 && inst.seed < 1.0);
        }
    }

    #[test]
    fn test_same_seed_reproduces_field() {
        let a = GrassField::generate(1_000, 125.0, 7);
        let b = GrassField::generate(1_000, 125.0, 7);
        assert_eq!(a.instances, b.instances);
    }

    #[test]
    fn test_different_seed_changes_field() {
        let a = GrassField::generate(100, 125.0, 1);
        let b = GrassField::generate(100, 125.0, 2);
        assert_ne!(a.instances, b.instances);
    }

    #[test]
    fn test_raw_stream_length() {
        let field = GrassField::generate(10, 125.0, 0);
        assert_eq!(field.raw().len(), 10 * GRASS_INSTANCE_STRIDE as usize);
    }

    #[test]
    fn test_blade_mesh_shape() {
        let blade = blade_mesh();
        assert_eq!(blade.positions.len(), 10);
        assert_eq!(blade.indices.len(), 24);
        assert_eq!(blade.tangents.len(), blade.positions.len());
        // Root at y = 0, tip at full height; uv.y is the bend factor.
        assert_eq!(blade.positions[0][1], 0.0);
        assert_eq!(blade.uvs[0][1], 0.0);
        assert_eq!(blade.uvs[9][1], 1.0);
        assert!(blade.positions[9][1] > 0.0);
    }
}
