//! Render pipeline creation for all deferred rendering passes.
//! Each function creates a wgpu::RenderPipeline with appropriate shader,
//! bind group layouts, and vertex buffer layouts.

use crate::render_targets::{DEPTH_FORMAT, GEOMETRY_FORMAT, HDR_FORMAT};
use crate::vegetation::GRASS_INSTANCE_STRIDE;
use meadow_gpu_shared::shaders;

/// Shared fullscreen vertex state (vertex-index-based full-screen triangle).
fn fullscreen_vertex_state(module: &wgpu::ShaderModule) -> wgpu::VertexState<'_> {
    wgpu::VertexState {
        module,
        entry_point: Some("vs_main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        buffers: &[],
    }
}

/// Standard depth stencil state for the geometry passes.
fn depth_stencil_rw() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// G-Buffer fragment outputs: position, normal, albedo, ORDM, emission.
fn gbuffer_color_targets() -> [Option<wgpu::ColorTargetState>; 5] {
    let target = |format| {
        Some(wgpu::ColorTargetState {
            format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })
    };
    [
        target(GEOMETRY_FORMAT),
        target(GEOMETRY_FORMAT),
        target(HDR_FORMAT),
        target(HDR_FORMAT),
        target(HDR_FORMAT),
    ]
}

/// Vertex buffer layouts shared by the geometry pipelines:
/// position, normal, uv, tangent in separate buffers.
fn mesh_vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 4] {
    const POSITION: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }];
    const NORMAL: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 1,
    }];
    const UV: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: 2,
    }];
    const TANGENT: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x4,
        offset: 0,
        shader_location: 3,
    }];
    [
        wgpu::VertexBufferLayout {
            array_stride: 12,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION,
        },
        wgpu::VertexBufferLayout {
            array_stride: 12,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL,
        },
        wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &UV,
        },
        wgpu::VertexBufferLayout {
            array_stride: 16,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TANGENT,
        },
    ]
}

// ============================================================
// Bind Group Layouts
// ============================================================

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    filterable: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn depth_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    binding_type: wgpu::SamplerBindingType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(binding_type),
        count: None,
    }
}

pub fn create_per_frame_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Per-Frame BGL"),
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        )],
    })
}

/// Material bind group: uniform block + six channel textures + sampler.
/// Visible to the vertex stage too because displacement samples there.
pub fn create_material_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let vis = wgpu::ShaderStages::VERTEX_FRAGMENT;
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material BGL"),
        entries: &[
            uniform_entry(0, vis),
            texture_entry(1, vis, true),
            texture_entry(2, vis, true),
            texture_entry(3, vis, true),
            texture_entry(4, vis, true),
            texture_entry(5, vis, true),
            texture_entry(6, vis, true),
            sampler_entry(7, vis, wgpu::SamplerBindingType::Filtering),
        ],
    })
}

pub fn create_per_object_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Per-Object BGL"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    })
}

/// Grass group: wind parameters plus the shared light buffer, both read by
/// the instanced vertex stage.
pub fn create_grass_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Grass BGL"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX),
            uniform_entry(1, wgpu::ShaderStages::VERTEX),
        ],
    })
}

/// Shared G-Buffer read contract of the four lighting passes:
/// per-frame uniforms, the five attachments, depth, and a point sampler.
/// The position/normal attachments are full-float and never filtered, so
/// every attachment binds as non-filterable.
pub fn create_lighting_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Lighting BGL"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            texture_entry(1, wgpu::ShaderStages::FRAGMENT, false),
            texture_entry(2, wgpu::ShaderStages::FRAGMENT, false),
            texture_entry(3, wgpu::ShaderStages::FRAGMENT, false),
            texture_entry(4, wgpu::ShaderStages::FRAGMENT, false),
            texture_entry(5, wgpu::ShaderStages::FRAGMENT, false),
            depth_texture_entry(6),
            sampler_entry(
                7,
                wgpu::ShaderStages::FRAGMENT,
                wgpu::SamplerBindingType::NonFiltering,
            ),
        ],
    })
}

pub fn create_light_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Light BGL"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
    })
}

/// Tonemap group: exposure params + the HDR lighting result.
pub fn create_tonemap_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Tonemap BGL"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            texture_entry(1, wgpu::ShaderStages::FRAGMENT, true),
            sampler_entry(
                2,
                wgpu::ShaderStages::FRAGMENT,
                wgpu::SamplerBindingType::Filtering,
            ),
        ],
    })
}

/// Kuwahara group: filter params, the lit color, the G-Buffer normal and
/// depth for edge-aware weighting, and one sampler per sampling regime.
pub fn create_kuwahara_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Kuwahara BGL"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            texture_entry(1, wgpu::ShaderStages::FRAGMENT, true),
            texture_entry(2, wgpu::ShaderStages::FRAGMENT, false),
            depth_texture_entry(3),
            sampler_entry(
                4,
                wgpu::ShaderStages::FRAGMENT,
                wgpu::SamplerBindingType::Filtering,
            ),
            sampler_entry(
                5,
                wgpu::ShaderStages::FRAGMENT,
                wgpu::SamplerBindingType::NonFiltering,
            ),
        ],
    })
}

/// Blit group: one source texture + point sampler. Non-filterable so the
/// same pipeline can display both lighting targets and the full-float
/// G-Buffer attachments.
pub fn create_blit_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Blit BGL"),
        entries: &[
            texture_entry(0, wgpu::ShaderStages::FRAGMENT, false),
            sampler_entry(
                1,
                wgpu::ShaderStages::FRAGMENT,
                wgpu::SamplerBindingType::NonFiltering,
            ),
        ],
    })
}

// ============================================================
// G-Buffer Pipeline
// ============================================================

/// `double_sided` disables back-face culling for materials that mark it
/// (cloth, foliage cards); everything else culls back faces.
pub fn create_gbuffer_pipeline(
    device: &wgpu::Device,
    per_frame_bgl: &wgpu::BindGroupLayout,
    material_bgl: &wgpu::BindGroupLayout,
    per_object_bgl: &wgpu::BindGroupLayout,
    double_sided: bool,
) -> wgpu::RenderPipeline {
    let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("GBuffer Vertex"),
        source: wgpu::ShaderSource::Wgsl(shaders::GBUFFER_VERT.into()),
    });

    let frag_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("GBuffer Fragment"),
        source: wgpu::ShaderSource::Wgsl(shaders::GBUFFER_FRAG.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("GBuffer Pipeline Layout"),
        bind_group_layouts: &[per_frame_bgl, material_bgl, per_object_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if double_sided {
            "GBuffer Pipeline (double sided)"
        } else {
            "GBuffer Pipeline"
        }),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vert_module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &mesh_vertex_layouts(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &gbuffer_color_targets(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: if double_sided {
                None
            } else {
                Some(wgpu::Face::Back)
            },
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_rw()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Instanced Grass G-Buffer Pipeline
// ============================================================

pub fn create_grass_pipeline(
    device: &wgpu::Device,
    per_frame_bgl: &wgpu::BindGroupLayout,
    material_bgl: &wgpu::BindGroupLayout,
    grass_bgl: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("GBuffer Grass Vertex"),
        source: wgpu::ShaderSource::Wgsl(shaders::GBUFFER_GRASS_VERT.into()),
    });

    let frag_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("GBuffer Fragment"),
        source: wgpu::ShaderSource::Wgsl(shaders::GBUFFER_FRAG.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("GBuffer Grass Pipeline Layout"),
        bind_group_layouts: &[per_frame_bgl, material_bgl, grass_bgl],
        push_constant_ranges: &[],
    });

    let mesh_layouts = mesh_vertex_layouts();
    // Per-instance data: offset vec3 + rotation + scale + seed, 24 bytes.
    let instance_layout = wgpu::VertexBufferLayout {
        array_stride: GRASS_INSTANCE_STRIDE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 4,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32,
                offset: 12,
                shader_location: 5,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32,
                offset: 16,
                shader_location: 6,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32,
                offset: 20,
                shader_location: 7,
            },
        ],
    };
    let buffers = [
        mesh_layouts[0].clone(),
        mesh_layouts[1].clone(),
        mesh_layouts[2].clone(),
        mesh_layouts[3].clone(),
        instance_layout,
    ];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("GBuffer Grass Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vert_module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &gbuffer_color_targets(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            // Blades are single quads viewed from both sides.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_rw()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Lighting Pipelines
// ============================================================

/// Create one full-screen lighting pipeline over the shared G-Buffer
/// contract. The four shading techniques differ only in fragment source.
pub fn create_lighting_pipeline(
    device: &wgpu::Device,
    label: &str,
    frag_source: &str,
    lighting_bgl: &wgpu::BindGroupLayout,
    light_bgl: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Fullscreen Vert"),
        source: wgpu::ShaderSource::Wgsl(shaders::FULLSCREEN_VERT.into()),
    });

    let frag_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(frag_source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Layout")),
        bind_group_layouts: &[lighting_bgl, light_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: fullscreen_vertex_state(&vert_module),
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Compositing Pipelines (tonemap, kuwahara, blit)
// ============================================================

/// Create a full-screen pipeline that renders straight onto the display
/// surface (tonemap, post-process, raw blit).
pub fn create_surface_effect_pipeline(
    device: &wgpu::Device,
    label: &str,
    frag_source: &str,
    bgl: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Fullscreen Vert"),
        source: wgpu::ShaderSource::Wgsl(shaders::FULLSCREEN_VERT.into()),
    });

    let frag_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(frag_source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Layout")),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: fullscreen_vertex_state(&vert_module),
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
