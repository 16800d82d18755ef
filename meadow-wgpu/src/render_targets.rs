//! Render target creation for the deferred pipeline.
//! G-Buffer with five named attachments plus depth, and the per-technique
//! lighting targets.

use crate::backend::{GBuffer, RenderTarget};

/// HDR color format for the albedo/ORDM/emission attachments and every
/// lighting target.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Full-precision format for the position and normal attachments. Point
/// sampled only; reconstruction from half floats shows banding artifacts.
pub const GEOMETRY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
/// Depth format.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

fn create_color_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Create the G-Buffer: position, normal, albedo, ORDM and emission
/// attachments plus depth, all at the same extent. Resizing goes through
/// recreating the whole set so the attachments can never disagree on
/// resolution.
pub fn create_gbuffer(device: &wgpu::Device, width: u32, height: u32) -> GBuffer {
    let (position, position_view) =
        create_color_texture(device, width, height, "GBuffer Position", GEOMETRY_FORMAT);
    let (normal, normal_view) =
        create_color_texture(device, width, height, "GBuffer Normal", GEOMETRY_FORMAT);
    let (albedo, albedo_view) =
        create_color_texture(device, width, height, "GBuffer Albedo", HDR_FORMAT);
    let (ordm, ordm_view) = create_color_texture(device, width, height, "GBuffer ORDM", HDR_FORMAT);
    let (emission, emission_view) =
        create_color_texture(device, width, height, "GBuffer Emission", HDR_FORMAT);

    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("GBuffer Depth"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    GBuffer {
        position,
        position_view,
        normal,
        normal_view,
        albedo,
        albedo_view,
        ordm,
        ordm_view,
        emission,
        emission_view,
        depth,
        depth_view,
        width,
        height,
    }
}

/// Create a single HDR lighting target (no depth; the lighting passes are
/// full-screen and depth-independent).
pub fn create_hdr_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
) -> RenderTarget {
    let (color_texture, color_view) = create_color_texture(device, width, height, label, HDR_FORMAT);
    RenderTarget {
        color_texture,
        color_view,
        width,
        height,
    }
}

/// Create a 1x1 white default texture bound to every unused material slot.
pub fn create_default_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Default 1x1 White"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[255u8, 255, 255, 255],
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
