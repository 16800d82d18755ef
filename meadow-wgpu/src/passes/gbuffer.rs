//! G-Buffer geometry pass — rasterize every scene object into the five
//! attachments + depth. The static pass clears everything first; the
//! instanced grass sub-pass loads on top of it.

use crate::backend::{GBuffer, GpuMesh};
use crate::material::MATERIAL_TEXTURE_SLOTS;
use meadow_gpu_shared::uniforms::{MaterialUniforms, PerObjectUniforms};

/// Sky color written into the albedo attachment by the clear, so uncovered
/// pixels display as the scene background in every mode.
const CLEAR_ALBEDO: wgpu::Color = wgpu::Color {
    r: 0.5019,
    g: 0.8078,
    b: 0.8823,
    a: 1.0,
};

/// Data needed to render one entity in the G-Buffer pass.
pub struct GBufferEntity<'a> {
    pub mesh: &'a GpuMesh,
    pub per_object: PerObjectUniforms,
    pub material: MaterialUniforms,
    /// Texture views in slot order: [albedo, normal, roughness, metallic,
    /// ao, displacement]. None = bind the default white texture.
    pub texture_views: [Option<&'a wgpu::TextureView>; MATERIAL_TEXTURE_SLOTS],
    /// Selects the cull-disabled pipeline variant.
    pub double_sided: bool,
}

fn color_attachments(
    gbuffer: &GBuffer,
    clear: bool,
) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 5] {
    let attach = |view, clear_color: wgpu::Color| {
        Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: if clear {
                    wgpu::LoadOp::Clear(clear_color)
                } else {
                    wgpu::LoadOp::Load
                },
                store: wgpu::StoreOp::Store,
            },
        })
    };
    let black = wgpu::Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    [
        attach(&gbuffer.position_view, black),
        // Arbitrary up-facing normal for uncovered pixels.
        attach(
            &gbuffer.normal_view,
            wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 1.0,
                a: 1.0,
            },
        ),
        attach(&gbuffer.albedo_view, CLEAR_ALBEDO),
        // ao = 1, roughness = 1, displacement = 0, metallic = 0.
        attach(
            &gbuffer.ordm_view,
            wgpu::Color {
                r: 1.0,
                g: 1.0,
                b: 0.0,
                a: 0.0,
            },
        ),
        attach(&gbuffer.emission_view, black),
    ]
}

fn create_material_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_bgl: &wgpu::BindGroupLayout,
    material: &MaterialUniforms,
    texture_views: &[Option<&wgpu::TextureView>; MATERIAL_TEXTURE_SLOTS],
    default_texture_view: &wgpu::TextureView,
    material_sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let mat_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Material UBO"),
        size: std::mem::size_of::<MaterialUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    queue.write_buffer(&mat_buffer, 0, bytemuck::bytes_of(material));

    let views: Vec<&wgpu::TextureView> = texture_views
        .iter()
        .map(|v| v.unwrap_or(default_texture_view))
        .collect();

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("GBuffer Material BG"),
        layout: material_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: mat_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(views[0]),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(views[1]),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(views[2]),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(views[3]),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(views[4]),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::TextureView(views[5]),
            },
            wgpu::BindGroupEntry {
                binding: 7,
                resource: wgpu::BindingResource::Sampler(material_sampler),
            },
        ],
    })
}

/// Render all static entities into the G-Buffer. Starts with a full clear
/// of every attachment and depth; undefined content never reaches a
/// downstream pass.
#[allow(clippy::too_many_arguments)]
pub fn render_gbuffer_pass(
    encoder: &mut wgpu::CommandEncoder,
    gbuffer: &GBuffer,
    pipeline: &wgpu::RenderPipeline,
    two_sided_pipeline: &wgpu::RenderPipeline,
    per_frame_bg: &wgpu::BindGroup,
    material_bgl: &wgpu::BindGroupLayout,
    per_object_bgl: &wgpu::BindGroupLayout,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    entities: &[GBufferEntity<'_>],
    default_texture_view: &wgpu::TextureView,
    material_sampler: &wgpu::Sampler,
) {
    let attachments = color_attachments(gbuffer, true);
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("G-Buffer Pass"),
        color_attachments: &attachments,
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &gbuffer.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        ..Default::default()
    });

    pass.set_bind_group(0, per_frame_bg, &[]);

    for entity in entities {
        pass.set_pipeline(if entity.double_sided {
            two_sided_pipeline
        } else {
            pipeline
        });

        // Create a per-entity object buffer (a single shared buffer cannot
        // be reused: queue.write_buffer is staged and only the last write
        // would survive to submission).
        let obj_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Per-Object UBO"),
            size: std::mem::size_of::<PerObjectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&obj_buffer, 0, bytemuck::bytes_of(&entity.per_object));

        let obj_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GBuffer Per-Object BG"),
            layout: per_object_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: obj_buffer.as_entire_binding(),
            }],
        });

        let mat_bg = create_material_bind_group(
            device,
            queue,
            material_bgl,
            &entity.material,
            &entity.texture_views,
            default_texture_view,
            material_sampler,
        );

        pass.set_bind_group(1, &mat_bg, &[]);
        pass.set_bind_group(2, &obj_bg, &[]);

        pass.set_vertex_buffer(0, entity.mesh.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, entity.mesh.normal_buffer.slice(..));
        pass.set_vertex_buffer(2, entity.mesh.uv_buffer.slice(..));
        pass.set_vertex_buffer(3, entity.mesh.tangent_buffer.slice(..));
        pass.set_index_buffer(entity.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..entity.mesh.index_count, 0, 0..1);
    }
}

/// Render the instanced grass batch into the G-Buffer with LoadOp::Load,
/// preserving the static geometry. All blades share one mesh + material;
/// per-instance variation comes from the attribute stream at slot 4.
#[allow(clippy::too_many_arguments)]
pub fn render_gbuffer_grass_pass(
    encoder: &mut wgpu::CommandEncoder,
    gbuffer: &GBuffer,
    pipeline: &wgpu::RenderPipeline,
    per_frame_bg: &wgpu::BindGroup,
    material_bgl: &wgpu::BindGroupLayout,
    grass_bg: &wgpu::BindGroup,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mesh: &GpuMesh,
    material: &MaterialUniforms,
    texture_views: [Option<&wgpu::TextureView>; MATERIAL_TEXTURE_SLOTS],
    instance_buffer: &wgpu::Buffer,
    instance_count: u32,
    default_texture_view: &wgpu::TextureView,
    material_sampler: &wgpu::Sampler,
) {
    let attachments = color_attachments(gbuffer, false);
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("G-Buffer Grass Pass"),
        color_attachments: &attachments,
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &gbuffer.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        ..Default::default()
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, per_frame_bg, &[]);

    let mat_bg = create_material_bind_group(
        device,
        queue,
        material_bgl,
        material,
        &texture_views,
        default_texture_view,
        material_sampler,
    );
    pass.set_bind_group(1, &mat_bg, &[]);
    pass.set_bind_group(2, grass_bg, &[]);

    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    pass.set_vertex_buffer(1, mesh.normal_buffer.slice(..));
    pass.set_vertex_buffer(2, mesh.uv_buffer.slice(..));
    pass.set_vertex_buffer(3, mesh.tangent_buffer.slice(..));
    pass.set_vertex_buffer(4, instance_buffer.slice(..));
    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..mesh.index_count, 0, 0..instance_count);
}
