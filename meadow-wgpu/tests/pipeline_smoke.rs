//! Headless-device tests for target allocation, resize behavior and
//! pipeline creation. Skipped gracefully on machines without a GPU
//! adapter.

use meadow_wgpu::{pipeline, render_targets};

fn create_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let instance = wgpu::Instance::default();
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
}

#[test]
fn test_gbuffer_resize_reallocates_every_attachment() {
    let Some((device, _queue)) = create_device() else {
        eprintln!("no GPU adapter available, skipping");
        return;
    };

    let gbuffer = render_targets::create_gbuffer(&device, 1920, 1080);
    assert_eq!(gbuffer.width, 1920);
    assert_eq!(gbuffer.position.width(), 1920);
    assert_eq!(gbuffer.depth.height(), 1080);

    // Recreating at the new extent replaces the whole attachment set.
    let gbuffer = render_targets::create_gbuffer(&device, 800, 600);
    for texture in [
        &gbuffer.position,
        &gbuffer.normal,
        &gbuffer.albedo,
        &gbuffer.ordm,
        &gbuffer.emission,
        &gbuffer.depth,
    ] {
        assert_eq!(texture.width(), 800);
        assert_eq!(texture.height(), 600);
    }

    let target = render_targets::create_hdr_target(&device, 800, 600, "Lighting RT");
    assert_eq!(target.color_texture.width(), 800);
    assert_eq!(target.color_texture.height(), 600);
}

#[test]
fn test_all_pipelines_validate() {
    let Some((device, _queue)) = create_device() else {
        eprintln!("no GPU adapter available, skipping");
        return;
    };

    let per_frame_bgl = pipeline::create_per_frame_bgl(&device);
    let material_bgl = pipeline::create_material_bgl(&device);
    let per_object_bgl = pipeline::create_per_object_bgl(&device);
    let grass_bgl = pipeline::create_grass_bgl(&device);
    let lighting_bgl = pipeline::create_lighting_bgl(&device);
    let light_bgl = pipeline::create_light_bgl(&device);
    let tonemap_bgl = pipeline::create_tonemap_bgl(&device);
    let kuwahara_bgl = pipeline::create_kuwahara_bgl(&device);
    let blit_bgl = pipeline::create_blit_bgl(&device);

    pipeline::create_gbuffer_pipeline(&device, &per_frame_bgl, &material_bgl, &per_object_bgl, false);
    pipeline::create_gbuffer_pipeline(&device, &per_frame_bgl, &material_bgl, &per_object_bgl, true);
    pipeline::create_grass_pipeline(&device, &per_frame_bgl, &material_bgl, &grass_bgl);

    for (label, source) in [
        ("Gouraud", meadow_gpu_shared::shaders::LIGHT_GOURAUD_FRAG),
        ("Lambert", meadow_gpu_shared::shaders::LIGHT_LAMBERT_FRAG),
        ("Blinn-Phong", meadow_gpu_shared::shaders::LIGHT_BLINN_PHONG_FRAG),
        ("PBR", meadow_gpu_shared::shaders::LIGHT_PBR_FRAG),
    ] {
        pipeline::create_lighting_pipeline(&device, label, source, &lighting_bgl, &light_bgl);
    }

    let surface_format = wgpu::TextureFormat::Bgra8UnormSrgb;
    pipeline::create_surface_effect_pipeline(
        &device,
        "Tonemap",
        meadow_gpu_shared::shaders::TONEMAP_REINHARD_FRAG,
        &tonemap_bgl,
        surface_format,
    );
    pipeline::create_surface_effect_pipeline(
        &device,
        "Kuwahara",
        meadow_gpu_shared::shaders::POST_KUWAHARA_FRAG,
        &kuwahara_bgl,
        surface_format,
    );
    pipeline::create_surface_effect_pipeline(
        &device,
        "Blit",
        meadow_gpu_shared::shaders::BLIT_FRAG,
        &blit_bgl,
        surface_format,
    );
}
