#![cfg(feature = "integration-tests")]

mod common;

use haunted_house::{
    Preset,
    camera::CameraResources,
    data_structures::{
        geometry::Geometry,
        texture::{ColourSpace, Sampling, Texture},
    },
    pipelines::{
        basic::mk_basic_pipeline, light::LightResources, transparent::mk_transparent_pipeline,
    },
    resources::{mesh::load_mesh, texture::material_layout},
};

async fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .ok()?;
    adapter
        .request_device(&wgpu::DeviceDescriptor::default())
        .await
        .ok()
}

#[tokio::test]
async fn shader_matches_the_pipeline_layouts() {
    let Some((device, queue)) = headless_device().await else {
        eprintln!("no graphics adapter, skipping");
        return;
    };
    let state = common::app_state(Preset::Haunted);
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        width: 64,
        height: 64,
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let camera = CameraResources::new(&device, &state.camera, &state.projection);
    let light = LightResources::new(&device, &state.lights);
    let materials = material_layout(&device);
    mk_basic_pipeline(
        &device,
        &config,
        &materials,
        &camera.bind_group_layout,
        &light.bind_group_layout,
    );
    mk_transparent_pipeline(
        &device,
        &config,
        &materials,
        &camera.bind_group_layout,
        &light.bind_group_layout,
    );
    for geometry in [
        Geometry::cuboid(4.0, 2.5, 4.0),
        Geometry::cone(3.5, 1.0, 4),
        Geometry::sphere(1.0, 16, 16),
        Geometry::subdivided_plane(2.2, 2.2, 100, 100),
    ] {
        let mesh = load_mesh(&device, &geometry);
        assert!(mesh.num_elements > 0);
    }
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 30, 30, 255]));
    Texture::from_image(&device, &queue, &img, Some("red"), ColourSpace::Srgb, &Sampling::default());

    assert!(device.pop_error_scope().await.is_none());
}

#[cfg(feature = "ui")]
#[tokio::test]
async fn gui_renderer_builds_for_the_surface_format() {
    let Some((device, _queue)) = headless_device().await else {
        eprintln!("no graphics adapter, skipping");
        return;
    };
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let _renderer = egui_wgpu::Renderer::new(
        &device,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        haunted_house::pipelines::gui::renderer_options(),
    );
    assert!(device.pop_error_scope().await.is_none());
}
