//! Material binding layer: per-channel texture-or-constant shading sources
//! and the clone-then-override variant builder.

use meadow_gpu_shared::uniforms::MaterialUniforms;

/// Reference to a texture owned by the backend's texture store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Texture slot order of the material bind group:
/// albedo, normal, roughness, metallic, ao, displacement.
pub const MATERIAL_TEXTURE_SLOTS: usize = 6;

/// Per-object shading attribute sources. For every channel exactly one of
/// {texture, constant} is authoritative at draw time, selected by the
/// `use_*` flag. Immutable after creation apart from time-varying uniforms
/// owned elsewhere; variants are derived with [`MaterialDescriptor::variant`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    pub use_albedo_tex: bool,
    pub albedo_tex: Option<TextureHandle>,
    pub albedo: [f32; 3],

    pub use_normal_tex: bool,
    pub normal_tex: Option<TextureHandle>,

    pub use_rough_tex: bool,
    pub rough_tex: Option<TextureHandle>,
    pub roughness: f32,

    pub use_metal_tex: bool,
    pub metal_tex: Option<TextureHandle>,
    pub metallic: f32,

    pub use_ao_tex: bool,
    pub ao_tex: Option<TextureHandle>,
    pub ao: f32,

    pub use_disp_tex: bool,
    pub disp_tex: Option<TextureHandle>,
    pub displacement: f32,

    pub emissive: [f32; 3],
    /// Disables back-face culling in the geometry pass. The instanced grass
    /// pipeline never culls, so blades render two-sided regardless.
    pub double_sided: bool,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            use_albedo_tex: false,
            albedo_tex: None,
            albedo: [1.0, 1.0, 1.0],
            use_normal_tex: false,
            normal_tex: None,
            use_rough_tex: false,
            rough_tex: None,
            roughness: 1.0,
            use_metal_tex: false,
            metal_tex: None,
            metallic: 0.0,
            use_ao_tex: false,
            ao_tex: None,
            ao: 1.0,
            use_disp_tex: false,
            disp_tex: None,
            displacement: 0.0,
            emissive: [0.0, 0.0, 0.0],
            double_sided: false,
        }
    }
}

/// Channel overrides consumed by [`MaterialDescriptor::variant`]. For each
/// channel a texture override beats a scalar override; a scalar-only
/// override overwrites the constant; no override preserves the base
/// constant. In every case the variant's use-texture flag reflects whether
/// a texture override was supplied.
#[derive(Debug, Clone, Default)]
pub struct MaterialOverrides {
    pub albedo_tex: Option<TextureHandle>,
    pub albedo_color: Option<[f32; 3]>,
    pub normal_tex: Option<TextureHandle>,
    pub rough_tex: Option<TextureHandle>,
    pub roughness: Option<f32>,
    pub metal_tex: Option<TextureHandle>,
    pub metallic: Option<f32>,
    pub ao_tex: Option<TextureHandle>,
    pub ao: Option<f32>,
    pub disp_tex: Option<TextureHandle>,
    pub displacement: Option<f32>,
}

impl MaterialDescriptor {
    /// Derive a variant by cloning this descriptor and applying the
    /// overrides channel by channel. The base is never mutated, so many
    /// variants can share one template safely.
    pub fn variant(&self, overrides: &MaterialOverrides) -> MaterialDescriptor {
        let mut mat = self.clone();

        if let Some(tex) = overrides.albedo_tex {
            mat.albedo_tex = Some(tex);
            mat.use_albedo_tex = true;
        } else {
            mat.use_albedo_tex = false;
            if let Some(color) = overrides.albedo_color {
                mat.albedo = color;
            }
        }

        if let Some(tex) = overrides.normal_tex {
            mat.normal_tex = Some(tex);
            mat.use_normal_tex = true;
        } else {
            mat.use_normal_tex = false;
        }

        if let Some(tex) = overrides.rough_tex {
            mat.rough_tex = Some(tex);
            mat.use_rough_tex = true;
        } else {
            mat.use_rough_tex = false;
            if let Some(value) = overrides.roughness {
                mat.roughness = value;
            }
        }

        if let Some(tex) = overrides.metal_tex {
            mat.metal_tex = Some(tex);
            mat.use_metal_tex = true;
        } else {
            mat.use_metal_tex = false;
            if let Some(value) = overrides.metallic {
                mat.metallic = value;
            }
        }

        if let Some(tex) = overrides.ao_tex {
            mat.ao_tex = Some(tex);
            mat.use_ao_tex = true;
        } else {
            mat.use_ao_tex = false;
            if let Some(value) = overrides.ao {
                mat.ao = value;
            }
        }

        if let Some(tex) = overrides.disp_tex {
            mat.disp_tex = Some(tex);
            mat.use_disp_tex = true;
        } else {
            mat.use_disp_tex = false;
            if let Some(value) = overrides.displacement {
                mat.displacement = value;
            }
        }

        mat
    }

    /// GPU-side uniform block. A channel's flag is raised only when the
    /// flag is set *and* a texture is actually referenced, so the shader
    /// never selects a slot backed by the default fallback by accident.
    pub fn to_uniforms(&self) -> MaterialUniforms {
        MaterialUniforms {
            albedo: [self.albedo[0], self.albedo[1], self.albedo[2], 1.0],
            emissive: [self.emissive[0], self.emissive[1], self.emissive[2], 1.0],
            roughness: self.roughness,
            metallic: self.metallic,
            ao: self.ao,
            displacement: self.displacement,
            has_albedo_tex: i32::from(self.use_albedo_tex && self.albedo_tex.is_some()),
            has_normal_tex: i32::from(self.use_normal_tex && self.normal_tex.is_some()),
            has_rough_tex: i32::from(self.use_rough_tex && self.rough_tex.is_some()),
            has_metal_tex: i32::from(self.use_metal_tex && self.metal_tex.is_some()),
            has_ao_tex: i32::from(self.use_ao_tex && self.ao_tex.is_some()),
            has_disp_tex: i32::from(self.use_disp_tex && self.disp_tex.is_some()),
            _pad0: 0,
            _pad1: 0,
        }
    }

    /// Texture handles in bind-group slot order. Inactive channels yield
    /// `None` so the geometry pass binds the default texture instead; the
    /// inactive alternative is never bound.
    pub fn texture_slots(&self) -> [Option<TextureHandle>; MATERIAL_TEXTURE_SLOTS] {
        [
            if self.use_albedo_tex { self.albedo_tex } else { None },
            if self.use_normal_tex { self.normal_tex } else { None },
            if self.use_rough_tex { self.rough_tex } else { None },
            if self.use_metal_tex { self.metal_tex } else { None },
            if self.use_ao_tex { self.ao_tex } else { None },
            if self.use_disp_tex { self.disp_tex } else { None },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_with_textures() -> MaterialDescriptor {
        MaterialDescriptor::default().variant(&MaterialOverrides {
            albedo_tex: Some(TextureHandle(1)),
            normal_tex: Some(TextureHandle(2)),
            rough_tex: Some(TextureHandle(3)),
            ..Default::default()
        })
    }

    #[test]
    fn test_texture_override_raises_flag() {
        let mat = base_with_textures();
        assert!(mat.use_albedo_tex);
        assert_eq!(mat.albedo_tex, Some(TextureHandle(1)));
        assert!(mat.use_normal_tex);
        assert!(mat.use_rough_tex);
        assert!(!mat.use_metal_tex);
        assert!(!mat.use_ao_tex);
        assert!(!mat.use_disp_tex);
    }

    #[test]
    fn test_scalar_override_clears_flag_and_sets_constant() {
        let base = base_with_textures();
        let variant = base.variant(&MaterialOverrides {
            roughness: Some(0.25),
            metallic: Some(0.9),
            ..Default::default()
        });
        assert!(!variant.use_rough_tex);
        assert_eq!(variant.roughness, 0.25);
        assert_eq!(variant.metallic, 0.9);
        // Base keeps its texture binding untouched.
        assert!(base.use_rough_tex);
        assert_eq!(base.roughness, 1.0);
    }

    #[test]
    fn test_texture_beats_scalar_for_same_channel() {
        let mat = MaterialDescriptor::default().variant(&MaterialOverrides {
            rough_tex: Some(TextureHandle(9)),
            roughness: Some(0.1),
            ..Default::default()
        });
        assert!(mat.use_rough_tex);
        assert_eq!(mat.rough_tex, Some(TextureHandle(9)));
        // Scalar for a texture-backed channel is ignored outright.
        assert_eq!(mat.roughness, 1.0);
    }

    #[test]
    fn test_missing_override_preserves_constant() {
        let base = MaterialDescriptor {
            ao: 0.5,
            ..MaterialDescriptor::default()
        };
        let variant = base.variant(&MaterialOverrides::default());
        assert_eq!(variant.ao, 0.5);
        assert!(!variant.use_ao_tex);
    }

    #[test]
    fn test_exactly_one_source_authoritative_per_channel() {
        let mat = base_with_textures();
        let uniforms = mat.to_uniforms();
        let slots = mat.texture_slots();
        let flags = [
            uniforms.has_albedo_tex,
            uniforms.has_normal_tex,
            uniforms.has_rough_tex,
            uniforms.has_metal_tex,
            uniforms.has_ao_tex,
            uniforms.has_disp_tex,
        ];
        for (flag, slot) in flags.iter().zip(slots.iter()) {
            // Flag raised exactly when a texture is bound for the slot.
            assert_eq!(*flag != 0, slot.is_some());
        }
    }

    #[test]
    fn test_inactive_channel_never_binds_texture() {
        // A descriptor that kept its handle but lost its flag must not
        // expose the handle to the geometry pass.
        let mut mat = base_with_textures();
        mat.use_albedo_tex = false;
        assert_eq!(mat.texture_slots()[0], None);
        assert_eq!(mat.to_uniforms().has_albedo_tex, 0);
    }

    #[test]
    fn test_variant_keeps_emissive_and_sidedness() {
        let base = MaterialDescriptor {
            emissive: [2.0, 1.5, 0.5],
            double_sided: true,
            ..MaterialDescriptor::default()
        };
        let variant = base.variant(&MaterialOverrides {
            roughness: Some(0.3),
            ..Default::default()
        });
        assert_eq!(variant.emissive, [2.0, 1.5, 0.5]);
        assert!(variant.double_sided);
    }

    #[test]
    fn test_variants_do_not_share_mutable_state() {
        let base = MaterialDescriptor::default();
        let a = base.variant(&MaterialOverrides {
            albedo_color: Some([1.0, 0.0, 0.0]),
            ..Default::default()
        });
        let b = base.variant(&MaterialOverrides {
            albedo_color: Some([0.0, 1.0, 0.0]),
            ..Default::default()
        });
        assert_eq!(a.albedo, [1.0, 0.0, 0.0]);
        assert_eq!(b.albedo, [0.0, 1.0, 0.0]);
        assert_eq!(base.albedo, [1.0, 1.0, 1.0]);
    }
}
