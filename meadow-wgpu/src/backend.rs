//! wgpu backend: device and surface ownership, resource upload, and the
//! fixed per-frame pass sequence (geometry, four lighting passes, the
//! selected compositing path).

use glam::{Mat3, Mat4, Vec3};

use meadow_gpu_shared::shaders;
use meadow_gpu_shared::uniforms::{
    GrassUniforms, KuwaharaParams, LightUniforms, MaterialUniforms, PerFrameUniforms,
    PerObjectUniforms, TonemapParams,
};

use crate::assets::{MeshData, DEFAULT_TANGENT};
use crate::config::RendererConfig;
use crate::frame::{BlitSource, CompositeRoute, FrameContext};
use crate::handle::HandleStore;
use crate::material::{MaterialDescriptor, TextureHandle, MATERIAL_TEXTURE_SLOTS};
use crate::passes;
use crate::passes::gbuffer::GBufferEntity;
use crate::pipeline;
use crate::render_targets;
use crate::vegetation::GrassField;

/// Reference to a mesh owned by the backend's mesh store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// GPU mesh with one vertex buffer per attribute stream.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub normal_buffer: wgpu::Buffer,
    pub uv_buffer: wgpu::Buffer,
    pub tangent_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// GPU texture with its view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// Single-attachment render target (lighting pass output).
pub struct RenderTarget {
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// G-Buffer: five named attachments plus depth, all at one extent.
pub struct GBuffer {
    pub position: wgpu::Texture,
    pub position_view: wgpu::TextureView,
    pub normal: wgpu::Texture,
    pub normal_view: wgpu::TextureView,
    pub albedo: wgpu::Texture,
    pub albedo_view: wgpu::TextureView,
    /// ao / roughness / displacement / metallic, packed.
    pub ordm: wgpu::Texture,
    pub ordm_view: wgpu::TextureView,
    pub emission: wgpu::Texture,
    pub emission_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// Camera transform supplied by the scene collaborator each frame.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

/// One renderable object: mesh + material + world transform.
pub struct SceneEntity {
    pub mesh: MeshHandle,
    pub material: MaterialDescriptor,
    pub model: Mat4,
}

/// The installed grass batch: blade mesh, instance stream and material.
struct GrassBatch {
    mesh: GpuMesh,
    material: MaterialDescriptor,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

/// All render pipelines, layouts, targets and shared resources of the
/// deferred pipeline.
pub struct DeferredPipeline {
    pub gbuffer_pipeline: wgpu::RenderPipeline,
    /// Cull-disabled variant for double-sided materials.
    pub gbuffer_two_sided_pipeline: wgpu::RenderPipeline,
    pub grass_pipeline: wgpu::RenderPipeline,
    pub gouraud_pipeline: wgpu::RenderPipeline,
    pub lambert_pipeline: wgpu::RenderPipeline,
    pub blinn_pipeline: wgpu::RenderPipeline,
    pub pbr_pipeline: wgpu::RenderPipeline,
    pub tonemap_pipeline: wgpu::RenderPipeline,
    pub kuwahara_pipeline: wgpu::RenderPipeline,
    pub blit_pipeline: wgpu::RenderPipeline,

    pub per_frame_bgl: wgpu::BindGroupLayout,
    pub material_bgl: wgpu::BindGroupLayout,
    pub per_object_bgl: wgpu::BindGroupLayout,
    pub grass_bgl: wgpu::BindGroupLayout,
    pub lighting_bgl: wgpu::BindGroupLayout,
    pub light_bgl: wgpu::BindGroupLayout,
    pub tonemap_bgl: wgpu::BindGroupLayout,
    pub kuwahara_bgl: wgpu::BindGroupLayout,
    pub blit_bgl: wgpu::BindGroupLayout,

    pub per_frame_buffer: wgpu::Buffer,
    pub light_buffer: wgpu::Buffer,
    pub grass_buffer: wgpu::Buffer,
    pub tonemap_buffer: wgpu::Buffer,
    pub kuwahara_buffer: wgpu::Buffer,

    pub material_sampler: wgpu::Sampler,
    /// Nearest/clamp sampler for the point-sampled G-Buffer reads.
    pub gbuffer_sampler: wgpu::Sampler,
    pub linear_sampler: wgpu::Sampler,

    pub default_texture: wgpu::Texture,
    pub default_texture_view: wgpu::TextureView,

    pub gbuffer: GBuffer,
    pub gouraud_target: RenderTarget,
    pub lambert_target: RenderTarget,
    pub blinn_target: RenderTarget,
    pub pbr_target: RenderTarget,

    pub per_frame_bg: wgpu::BindGroup,
    pub lighting_bg: wgpu::BindGroup,
    pub light_bg: wgpu::BindGroup,
    pub grass_bg: wgpu::BindGroup,
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl DeferredPipeline {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: &RendererConfig,
    ) -> Self {
        let per_frame_bgl = pipeline::create_per_frame_bgl(device);
        let material_bgl = pipeline::create_material_bgl(device);
        let per_object_bgl = pipeline::create_per_object_bgl(device);
        let grass_bgl = pipeline::create_grass_bgl(device);
        let lighting_bgl = pipeline::create_lighting_bgl(device);
        let light_bgl = pipeline::create_light_bgl(device);
        let tonemap_bgl = pipeline::create_tonemap_bgl(device);
        let kuwahara_bgl = pipeline::create_kuwahara_bgl(device);
        let blit_bgl = pipeline::create_blit_bgl(device);

        let gbuffer_pipeline = pipeline::create_gbuffer_pipeline(
            device,
            &per_frame_bgl,
            &material_bgl,
            &per_object_bgl,
            false,
        );
        let gbuffer_two_sided_pipeline = pipeline::create_gbuffer_pipeline(
            device,
            &per_frame_bgl,
            &material_bgl,
            &per_object_bgl,
            true,
        );
        let grass_pipeline =
            pipeline::create_grass_pipeline(device, &per_frame_bgl, &material_bgl, &grass_bgl);
        let gouraud_pipeline = pipeline::create_lighting_pipeline(
            device,
            "Gouraud Lighting",
            shaders::LIGHT_GOURAUD_FRAG,
            &lighting_bgl,
            &light_bgl,
        );
        let lambert_pipeline = pipeline::create_lighting_pipeline(
            device,
            "Lambert Lighting",
            shaders::LIGHT_LAMBERT_FRAG,
            &lighting_bgl,
            &light_bgl,
        );
        let blinn_pipeline = pipeline::create_lighting_pipeline(
            device,
            "Blinn-Phong Lighting",
            shaders::LIGHT_BLINN_PHONG_FRAG,
            &lighting_bgl,
            &light_bgl,
        );
        let pbr_pipeline = pipeline::create_lighting_pipeline(
            device,
            "PBR Lighting",
            shaders::LIGHT_PBR_FRAG,
            &lighting_bgl,
            &light_bgl,
        );
        let tonemap_pipeline = pipeline::create_surface_effect_pipeline(
            device,
            "Tonemap",
            shaders::TONEMAP_REINHARD_FRAG,
            &tonemap_bgl,
            surface_format,
        );
        let kuwahara_pipeline = pipeline::create_surface_effect_pipeline(
            device,
            "Kuwahara",
            shaders::POST_KUWAHARA_FRAG,
            &kuwahara_bgl,
            surface_format,
        );
        let blit_pipeline = pipeline::create_surface_effect_pipeline(
            device,
            "Blit",
            shaders::BLIT_FRAG,
            &blit_bgl,
            surface_format,
        );

        let per_frame_buffer = uniform_buffer(
            device,
            "Per-Frame UBO",
            std::mem::size_of::<PerFrameUniforms>() as u64,
        );
        let light_buffer = uniform_buffer(
            device,
            "Light UBO",
            std::mem::size_of::<LightUniforms>() as u64,
        );
        let grass_buffer = uniform_buffer(
            device,
            "Grass UBO",
            std::mem::size_of::<GrassUniforms>() as u64,
        );
        let tonemap_buffer = uniform_buffer(
            device,
            "Tonemap UBO",
            std::mem::size_of::<TonemapParams>() as u64,
        );
        let kuwahara_buffer = uniform_buffer(
            device,
            "Kuwahara UBO",
            std::mem::size_of::<KuwaharaParams>() as u64,
        );

        // Wind parameters are fixed for the lifetime of the renderer.
        let wind = config.wind_dir.normalize_or_zero();
        queue.write_buffer(
            &grass_buffer,
            0,
            bytemuck::bytes_of(&GrassUniforms {
                wind_dir: [wind.x, wind.y, wind.z, 0.0],
                wind_amp: config.wind_amp,
                hit_amp: config.hit_amp,
                _pad0: 0.0,
                _pad1: 0.0,
            }),
        );

        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let gbuffer_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("GBuffer Point Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let (default_texture, default_texture_view) =
            render_targets::create_default_texture(device, queue);

        let gbuffer = render_targets::create_gbuffer(device, width, height);
        let gouraud_target = render_targets::create_hdr_target(device, width, height, "Gouraud RT");
        let lambert_target = render_targets::create_hdr_target(device, width, height, "Lambert RT");
        let blinn_target = render_targets::create_hdr_target(device, width, height, "Blinn RT");
        let pbr_target = render_targets::create_hdr_target(device, width, height, "PBR RT");

        let per_frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Per-Frame BG"),
            layout: &per_frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: per_frame_buffer.as_entire_binding(),
            }],
        });
        let lighting_bg = passes::lighting::create_lighting_bind_group(
            device,
            &lighting_bgl,
            &per_frame_buffer,
            &gbuffer,
            &gbuffer_sampler,
        );
        let light_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Light BG"),
            layout: &light_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });
        let grass_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Grass BG"),
            layout: &grass_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: grass_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            gbuffer_pipeline,
            gbuffer_two_sided_pipeline,
            grass_pipeline,
            gouraud_pipeline,
            lambert_pipeline,
            blinn_pipeline,
            pbr_pipeline,
            tonemap_pipeline,
            kuwahara_pipeline,
            blit_pipeline,
            per_frame_bgl,
            material_bgl,
            per_object_bgl,
            grass_bgl,
            lighting_bgl,
            light_bgl,
            tonemap_bgl,
            kuwahara_bgl,
            blit_bgl,
            per_frame_buffer,
            light_buffer,
            grass_buffer,
            tonemap_buffer,
            kuwahara_buffer,
            material_sampler,
            gbuffer_sampler,
            linear_sampler,
            default_texture,
            default_texture_view,
            gbuffer,
            gouraud_target,
            lambert_target,
            blinn_target,
            pbr_target,
            per_frame_bg,
            lighting_bg,
            light_bg,
            grass_bg,
        }
    }

    /// Reallocate every viewport-sized target at the new extent. The whole
    /// set is rebuilt in one step; attachments can never disagree on
    /// resolution, and the G-Buffer bind group is rebuilt so no pass holds
    /// a view of a dropped attachment.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.gbuffer = render_targets::create_gbuffer(device, width, height);
        self.gouraud_target = render_targets::create_hdr_target(device, width, height, "Gouraud RT");
        self.lambert_target = render_targets::create_hdr_target(device, width, height, "Lambert RT");
        self.blinn_target = render_targets::create_hdr_target(device, width, height, "Blinn RT");
        self.pbr_target = render_targets::create_hdr_target(device, width, height, "PBR RT");
        self.lighting_bg = passes::lighting::create_lighting_bind_group(
            device,
            &self.lighting_bgl,
            &self.per_frame_buffer,
            &self.gbuffer,
            &self.gbuffer_sampler,
        );
        log::info!("deferred pipeline resized to {}x{}", width, height);
    }

    /// The buffer displayed verbatim by a pass-through route.
    fn blit_view(&self, source: BlitSource) -> &wgpu::TextureView {
        match source {
            BlitSource::Pbr => &self.pbr_target.color_view,
            BlitSource::BlinnPhong => &self.blinn_target.color_view,
            BlitSource::Lambert => &self.lambert_target.color_view,
            BlitSource::Gouraud => &self.gouraud_target.color_view,
            BlitSource::Position => &self.gbuffer.position_view,
            BlitSource::Normal => &self.gbuffer.normal_view,
            BlitSource::Albedo => &self.gbuffer.albedo_view,
            BlitSource::Ordm => &self.gbuffer.ordm_view,
        }
    }
}

fn per_object_uniforms(model: Mat4) -> PerObjectUniforms {
    let normal = Mat3::from_mat4(model).inverse().transpose();
    PerObjectUniforms {
        model: model.to_cols_array_2d(),
        normal_matrix_col0: normal.x_axis.extend(0.0).to_array(),
        normal_matrix_col1: normal.y_axis.extend(0.0).to_array(),
        normal_matrix_col2: normal.z_axis.extend(0.0).to_array(),
        _pad: [0.0; 4],
    }
}

fn create_gpu_mesh(device: &wgpu::Device, data: &MeshData) -> Result<GpuMesh, String> {
    use wgpu::util::DeviceExt;

    let count = data.positions.len();
    if count == 0 {
        return Err("mesh has no positions".to_string());
    }
    if data.normals.len() != count || data.uvs.len() != count {
        return Err(format!(
            "mesh attribute streams disagree: {} positions, {} normals, {} uvs",
            count,
            data.normals.len(),
            data.uvs.len()
        ));
    }
    if data.indices.is_empty() || data.indices.len() % 3 != 0 {
        return Err(format!(
            "mesh index count {} is not a triangle list",
            data.indices.len()
        ));
    }

    // A missing tangent stream degrades normal mapping, not placement.
    let tangents;
    let tangent_slice: &[[f32; 4]] = if data.tangents.len() == count {
        &data.tangents
    } else {
        log::warn!("mesh uploaded without tangents; using the default tangent frame");
        tangents = vec![DEFAULT_TANGENT; count];
        &tangents
    };

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Positions"),
        contents: bytemuck::cast_slice(&data.positions),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Normals"),
        contents: bytemuck::cast_slice(&data.normals),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let uv_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh UVs"),
        contents: bytemuck::cast_slice(&data.uvs),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let tangent_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Tangents"),
        contents: bytemuck::cast_slice(tangent_slice),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Indices"),
        contents: bytemuck::cast_slice(&data.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    Ok(GpuMesh {
        vertex_buffer,
        normal_buffer,
        uv_buffer,
        tangent_buffer,
        index_buffer,
        index_count: data.indices.len() as u32,
    })
}

/// The renderer: owns the device, the surface and the deferred pipeline,
/// and runs one fixed-order pass sequence per refresh tick.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: DeferredPipeline,
    meshes: HandleStore<GpuMesh>,
    textures: HandleStore<GpuTexture>,
    grass: Option<GrassBatch>,
    config: RendererConfig,
}

impl WgpuBackend {
    /// Create the backend on a display surface. Blocks on adapter and
    /// device acquisition.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        config: RendererConfig,
    ) -> Result<Self, String> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(target)
            .map_err(|e| format!("failed to create surface: {e}"))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| "no compatible GPU adapter found".to_string())?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Meadow Device"),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| format!("failed to create device: {e}"))?;

        let caps = surface.get_capabilities(&adapter);
        let first_format = caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| "surface reports no supported formats".to_string())?;
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(first_format);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let pipeline = DeferredPipeline::new(
            &device,
            &queue,
            surface_format,
            surface_config.width,
            surface_config.height,
            &config,
        );
        log::info!(
            "deferred pipeline ready at {}x{} ({:?})",
            surface_config.width,
            surface_config.height,
            surface_format
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            pipeline,
            meshes: HandleStore::new(),
            textures: HandleStore::new(),
            grass: None,
            config,
        })
    }

    pub fn width(&self) -> u32 {
        self.surface_config.width
    }

    pub fn height(&self) -> u32 {
        self.surface_config.height
    }

    /// Resize the surface and every intermediate target in lockstep.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.pipeline.resize(&self.device, width, height);
    }

    /// Upload a prepared mesh and hand back its handle.
    pub fn upload_mesh(&mut self, data: &MeshData) -> Result<MeshHandle, String> {
        let mesh = create_gpu_mesh(&self.device, data)?;
        Ok(MeshHandle(self.meshes.insert(mesh)))
    }

    pub fn destroy_mesh(&mut self, handle: MeshHandle) {
        self.meshes.remove(handle.0);
    }

    /// Upload an RGBA8 texture (sRGB) and hand back its handle.
    pub fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureHandle, String> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(format!(
                "texture data is {} bytes, expected {} for {}x{} rgba8",
                pixels.len(),
                expected,
                width,
                height
            ));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Material Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(TextureHandle(self.textures.insert(GpuTexture {
            texture,
            view,
            width,
            height,
        })))
    }

    pub fn destroy_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(handle.0);
    }

    /// Install the grass batch: blade mesh plus the immutable per-instance
    /// attribute stream.
    pub fn install_grass(
        &mut self,
        field: &GrassField,
        blade: &MeshData,
        material: MaterialDescriptor,
    ) -> Result<(), String> {
        use wgpu::util::DeviceExt;

        if field.is_empty() {
            return Err("grass field has no instances".to_string());
        }
        let mesh = create_gpu_mesh(&self.device, blade)?;
        let instance_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grass Instances"),
                contents: field.raw(),
                usage: wgpu::BufferUsages::VERTEX,
            });
        log::info!("grass installed: {} instances", field.len());
        self.grass = Some(GrassBatch {
            mesh,
            material,
            instance_buffer,
            instance_count: field.len() as u32,
        });
        Ok(())
    }

    fn material_views(
        &self,
        material: &MaterialDescriptor,
    ) -> [Option<&wgpu::TextureView>; MATERIAL_TEXTURE_SLOTS] {
        material
            .texture_slots()
            .map(|slot| slot.and_then(|handle| self.textures.get(handle.0)).map(|t| &t.view))
    }

    /// Run one frame: input-updated context in, fixed pass sequence out.
    /// Geometry first, then all four lighting passes unconditionally, then
    /// the compositing path selected by the display mode.
    pub fn render_frame(
        &mut self,
        entities: &[SceneEntity],
        camera: &Camera,
        ctx: &FrameContext,
    ) -> Result<(), String> {
        let p = &self.pipeline;

        // Frame-wide uniforms, written once before any pass reads them.
        self.queue.write_buffer(
            &p.per_frame_buffer,
            0,
            bytemuck::bytes_of(&PerFrameUniforms {
                view: camera.view.to_cols_array_2d(),
                projection: camera.projection.to_cols_array_2d(),
                camera_pos: camera.position.extend(1.0).to_array(),
                time: ctx.time,
                _pad1: 0.0,
                _pad2: 0.0,
                _pad3: 0.0,
                _alignment_pad: [0.0; 24],
            }),
        );
        self.queue.write_buffer(
            &p.light_buffer,
            0,
            bytemuck::bytes_of(&LightUniforms {
                position: ctx.light.position.extend(1.0).to_array(),
                color: [1.0, 1.0, 1.0, 1.0],
                radius: ctx.light.radius,
                _pad0: 0.0,
                _pad1: 0.0,
                _pad2: 0.0,
            }),
        );
        self.queue.write_buffer(
            &p.tonemap_buffer,
            0,
            bytemuck::bytes_of(&TonemapParams {
                exposure: ctx.exposure,
                _pad0: 0.0,
                _pad1: 0.0,
                _pad2: 0.0,
            }),
        );
        // Recomputed from the live extent every frame so a resize can never
        // leave the filter with a stale texel size.
        self.queue.write_buffer(
            &p.kuwahara_buffer,
            0,
            bytemuck::bytes_of(&KuwaharaParams {
                texel_size: [
                    1.0 / self.surface_config.width as f32,
                    1.0 / self.surface_config.height as f32,
                ],
                radius: self.config.kuwahara_radius,
                _pad0: 0.0,
            }),
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(format!("failed to acquire frame: {e}")),
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        // Geometry pass: static entities, full clear.
        let gbuffer_entities: Vec<GBufferEntity<'_>> = entities
            .iter()
            .filter_map(|entity| {
                let Some(mesh) = self.meshes.get(entity.mesh.0) else {
                    log::warn!("skipping entity with stale mesh handle {:?}", entity.mesh);
                    return None;
                };
                Some(GBufferEntity {
                    mesh,
                    per_object: per_object_uniforms(entity.model),
                    material: entity.material.to_uniforms(),
                    texture_views: self.material_views(&entity.material),
                    double_sided: entity.material.double_sided,
                })
            })
            .collect();

        passes::gbuffer::render_gbuffer_pass(
            &mut encoder,
            &p.gbuffer,
            &p.gbuffer_pipeline,
            &p.gbuffer_two_sided_pipeline,
            &p.per_frame_bg,
            &p.material_bgl,
            &p.per_object_bgl,
            &self.device,
            &self.queue,
            &gbuffer_entities,
            &p.default_texture_view,
            &p.material_sampler,
        );

        // Instanced vegetation on top, same G-Buffer.
        if ctx.vegetation_visible {
            if let Some(grass) = &self.grass {
                let material: MaterialUniforms = grass.material.to_uniforms();
                passes::gbuffer::render_gbuffer_grass_pass(
                    &mut encoder,
                    &p.gbuffer,
                    &p.grass_pipeline,
                    &p.per_frame_bg,
                    &p.material_bgl,
                    &p.grass_bg,
                    &self.device,
                    &self.queue,
                    &grass.mesh,
                    &material,
                    self.material_views(&grass.material),
                    &grass.instance_buffer,
                    grass.instance_count,
                    &p.default_texture_view,
                    &p.material_sampler,
                );
            }
        }

        // All four lighting passes run every frame regardless of the
        // display mode, so switching modes never shows a stale buffer.
        passes::lighting::render_lighting_pass(
            &mut encoder,
            &p.pbr_target,
            &p.pbr_pipeline,
            &p.lighting_bg,
            &p.light_bg,
            "PBR Pass",
        );
        passes::lighting::render_lighting_pass(
            &mut encoder,
            &p.blinn_target,
            &p.blinn_pipeline,
            &p.lighting_bg,
            &p.light_bg,
            "Blinn-Phong Pass",
        );
        passes::lighting::render_lighting_pass(
            &mut encoder,
            &p.lambert_target,
            &p.lambert_pipeline,
            &p.lighting_bg,
            &p.light_bg,
            "Lambert Pass",
        );
        passes::lighting::render_lighting_pass(
            &mut encoder,
            &p.gouraud_target,
            &p.gouraud_pipeline,
            &p.lighting_bg,
            &p.light_bg,
            "Gouraud Pass",
        );

        // Compositing: the selected route onto the display surface.
        match ctx.display_mode.route() {
            CompositeRoute::Stylize => {
                let bind_group = passes::postprocess::create_kuwahara_bind_group(
                    &self.device,
                    &p.kuwahara_bgl,
                    &p.kuwahara_buffer,
                    &p.blinn_target.color_view,
                    &p.gbuffer,
                    &p.linear_sampler,
                    &p.gbuffer_sampler,
                );
                passes::postprocess::render_kuwahara_pass(
                    &mut encoder,
                    &surface_view,
                    &p.kuwahara_pipeline,
                    &bind_group,
                );
            }
            CompositeRoute::Tonemap => {
                let bind_group = passes::tonemap::create_tonemap_bind_group(
                    &self.device,
                    &p.tonemap_bgl,
                    &p.tonemap_buffer,
                    &p.pbr_target.color_view,
                    &p.linear_sampler,
                );
                passes::tonemap::render_tonemap_pass(
                    &mut encoder,
                    &surface_view,
                    &p.tonemap_pipeline,
                    &bind_group,
                );
            }
            CompositeRoute::Blit(source) => {
                let bind_group = passes::present::create_blit_bind_group(
                    &self.device,
                    &p.blit_bgl,
                    p.blit_view(source),
                    &p.gbuffer_sampler,
                );
                passes::present::render_blit_pass(
                    &mut encoder,
                    &surface_view,
                    &p.blit_pipeline,
                    &bind_group,
                );
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
