use bytemuck::{Pod, Zeroable};

/// Per-frame uniform data — matches GPU bind group 0, binding 0 of the
/// geometry pipelines and binding 0 of the lighting bind group.
/// Padded to 256-byte alignment for WebGPU requirements.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PerFrameUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub time: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
    /// Padding to 256-byte alignment for WebGPU minUniformBufferOffsetAlignment.
    pub _alignment_pad: [f32; 24],
}

/// Material uniform data — matches GPU bind group 1, binding 0 of the
/// geometry pipelines. One `has_*` flag per channel selects between the
/// bound texture and the constant fallback.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub albedo: [f32; 4],
    pub emissive: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
    pub ao: f32,
    pub displacement: f32,
    pub has_albedo_tex: i32,
    pub has_normal_tex: i32,
    pub has_rough_tex: i32,
    pub has_metal_tex: i32,
    pub has_ao_tex: i32,
    pub has_disp_tex: i32,
    pub _pad0: i32,
    pub _pad1: i32,
}

/// Per-object uniform data — model matrix + normal matrix columns.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PerObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix_col0: [f32; 4],
    pub normal_matrix_col1: [f32; 4],
    pub normal_matrix_col2: [f32; 4],
    pub _pad: [f32; 4],
}

/// The single point light shared by every lighting pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LightUniforms {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub radius: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

/// Wind parameters for the instanced grass vertex stage.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct GrassUniforms {
    pub wind_dir: [f32; 4],
    pub wind_amp: f32,
    pub hit_amp: f32,
    pub _pad0: f32,
    pub _pad1: f32,
}

/// Tonemap pass parameters.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct TonemapParams {
    pub exposure: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

/// Kuwahara post-process parameters. `texel_size` is the reciprocal of the
/// viewport resolution and must track resizes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct KuwaharaParams {
    pub texel_size: [f32; 2],
    pub radius: f32,
    pub _pad0: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_per_frame_uniforms_alignment() {
        assert_eq!(size_of::<PerFrameUniforms>(), 256);
    }

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(size_of::<MaterialUniforms>() % 16, 0);
        assert_eq!(size_of::<PerObjectUniforms>() % 16, 0);
        assert_eq!(size_of::<LightUniforms>() % 16, 0);
        assert_eq!(size_of::<GrassUniforms>() % 16, 0);
        assert_eq!(size_of::<TonemapParams>(), 16);
        assert_eq!(size_of::<KuwaharaParams>(), 16);
    }
}
