use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

#[cfg(feature = "ui")]
use crate::pipelines::gui::GuiRenderer;
use crate::{
    camera::{Camera, CameraResources, Projection, Viewport},
    data_structures::texture,
    lighting::LightingRig,
    pipelines::{
        basic::mk_basic_pipeline, light::LightResources, transparent::mk_transparent_pipeline,
    },
    resources::texture::material_layout,
};

pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
}

/// Window, GPU handles and the per-frame uniforms shared by every draw.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub light: LightResources,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipelines: Pipelines,
    #[cfg(feature = "ui")]
    pub gui: GuiRenderer,
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        viewport: Viewport,
        camera: Camera,
        projection: Projection,
        rig: LightingRig,
    ) -> anyhow::Result<Self> {
        let [width, height] = viewport.surface_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("cannot open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour and rely on an sRGB surface for encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("surface configured at {width}x{height} ({surface_format:?})");

        let camera = CameraResources::new(&device, &camera, &projection);
        let light = LightResources::new(&device, &rig);
        let material_layout = material_layout(&device);
        let pipelines = Pipelines {
            basic: mk_basic_pipeline(
                &device,
                &config,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
            transparent: mk_transparent_pipeline(
                &device,
                &config,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
        };

        let depth_texture =
            texture::Texture::create_depth_texture(&device, [width, height], "depth_texture");

        #[cfg(feature = "ui")]
        let gui = GuiRenderer::new(&device, config.format, &window);

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            light,
            material_layout,
            pipelines,
            #[cfg(feature = "ui")]
            gui,
        })
    }

    /// Reconfigures the surface and depth buffer; zero sizes are ignored.
    pub fn resize(&mut self, size: [u32; 2]) {
        let [width, height] = size;
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, size, "depth_texture");
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }
}
