//! Application state, the per-frame step and the winit event loop.
//!
//! Everything the scene needs between frames lives in one [`AppState`]. A
//! frame is a single [`step`]: the orbit controls advance, the ghosts move to
//! their positions for the elapsed time, the frame is drawn through a
//! [`FrameTarget`] and the next frame is requested from a [`Scheduler`].
//!
//! Texture files are fetched on the async runtime (tokio natively,
//! `spawn_local` in the browser). Results come back as [`AppEvent`]s through
//! the event loop proxy, so they are applied on the event loop thread and
//! never interleave with a frame.

use std::sync::Arc;

use anyhow::Context as _;
use cgmath::Deg;
use instant::Instant;
use rand::Rng;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    camera::{Camera, OrbitControls, Projection, Viewport},
    config::{Config, Preset},
    context::Context,
    lighting::LightingRig,
    render::SceneRenderer,
    resources::{AssetLoader, LoadingManager, LogObserver, fetch_image},
    scene::{Scene, SceneBuilder},
    tweak::TweakPanel,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub const FIELD_OF_VIEW: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;
pub const CAMERA_START: [f32; 3] = [4.0, 2.0, 5.0];

/// Seconds since the first frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct Clock {
    start: Option<Instant>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock on first use.
    pub fn elapsed(&mut self) -> f32 {
        self.start
            .get_or_insert_with(Instant::now)
            .elapsed()
            .as_secs_f32()
    }
}

pub struct AppState {
    pub scene: Scene,
    pub lights: LightingRig,
    pub camera: Camera,
    pub projection: Projection,
    pub viewport: Viewport,
    pub controls: OrbitControls,
    pub panel: TweakPanel,
    pub loader: AssetLoader,
    pub clock: Clock,
    pub preset: Preset,
    pub asset_root: String,
}

impl AppState {
    pub fn new(config: &Config, viewport: Viewport, rng: &mut impl Rng) -> Self {
        let loader = AssetLoader::new(LoadingManager::new(Box::new(LogObserver)));
        Self::with_loader(config, viewport, loader, rng)
    }

    /// Builds the scene, requesting its textures from `loader`.
    pub fn with_loader(
        config: &Config,
        viewport: Viewport,
        mut loader: AssetLoader,
        rng: &mut impl Rng,
    ) -> Self {
        let scene = SceneBuilder::new(config.preset, &mut loader).build(rng);
        let camera = Camera::new(CAMERA_START);
        let projection = Projection::new(
            viewport.width,
            viewport.height,
            Deg(FIELD_OF_VIEW),
            NEAR,
            FAR,
        );
        let controls = OrbitControls::new(&projection, pointer_height(&viewport));
        Self {
            scene,
            lights: LightingRig::new(config.preset),
            camera,
            projection,
            viewport,
            controls,
            panel: TweakPanel::new(config.preset),
            loader,
            clock: Clock::new(),
            preset: config.preset,
            asset_root: config.asset_root.clone(),
        }
    }

    /// Applies a new viewport. Only the aspect ratio of the projection changes.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.projection.resize(viewport.width, viewport.height);
        self.controls.set_screen_height(pointer_height(&viewport));
    }

    pub fn clear_colour(&self) -> wgpu::Color {
        self.preset.clear_colour().into()
    }

    /// Feeds an input event to the orbit controls.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.controls.handle_window_events(&self.camera, event)
    }

    pub fn complete_texture(&mut self, url: &str, result: anyhow::Result<image::RgbaImage>) {
        self.loader.complete(url, result);
    }
}

/// Pointer positions arrive in physical pixels.
fn pointer_height(viewport: &Viewport) -> f32 {
    viewport.height * viewport.device_pixel_ratio as f32
}

/// Requests the next frame.
pub trait Scheduler {
    fn schedule_next(&self);
}

impl Scheduler for Window {
    fn schedule_next(&self) {
        self.request_redraw();
    }
}

/// Something a frame can be drawn to.
pub trait FrameTarget {
    type Error;

    fn draw(&mut self, state: &mut AppState) -> Result<(), Self::Error>;
}

/// One frame at `elapsed` seconds. The next frame is scheduled even if
/// drawing fails.
pub fn step_at<T: FrameTarget + ?Sized>(
    state: &mut AppState,
    elapsed: f32,
    target: &mut T,
    scheduler: &dyn Scheduler,
) -> Result<(), T::Error> {
    state.controls.update(&mut state.camera);
    state.lights.animate(elapsed);
    let drawn = target.draw(state);
    scheduler.schedule_next();
    drawn
}

/// One frame at the current clock time.
pub fn step<T: FrameTarget + ?Sized>(
    state: &mut AppState,
    target: &mut T,
    scheduler: &dyn Scheduler,
) -> Result<(), T::Error> {
    let elapsed = state.clock.elapsed();
    step_at(state, elapsed, target, scheduler)
}

/// The GPU side of a frame.
pub struct Gpu {
    pub ctx: Context,
    renderer: SceneRenderer,
}

impl Gpu {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            renderer: SceneRenderer::new(),
        }
    }
}

impl FrameTarget for Gpu {
    type Error = wgpu::SurfaceError;

    fn draw(&mut self, state: &mut AppState) -> Result<(), Self::Error> {
        self.ctx
            .camera
            .write(&self.ctx.queue, &state.camera, &state.projection);
        self.ctx.light.write(&self.ctx.queue, &state.lights);
        let clear_colour = state.clear_colour();

        #[cfg(not(feature = "ui"))]
        let drawn = self
            .renderer
            .render(&mut self.ctx, &state.scene, clear_colour, |_, _, _| {});

        #[cfg(feature = "ui")]
        let drawn = {
            let pixels_per_point = state.viewport.pixel_ratio() as f32;
            let panel = &state.panel;
            let lights = &mut state.lights;
            self.renderer
                .render(&mut self.ctx, &state.scene, clear_colour, |ctx, encoder, view| {
                    let size = ctx.size();
                    ctx.gui.draw(
                        &ctx.device,
                        &ctx.queue,
                        encoder,
                        &ctx.window,
                        view,
                        size,
                        pixels_per_point,
                        |egui_ctx| {
                            panel.show(egui_ctx, lights);
                        },
                    );
                })
        };

        drawn
    }
}

pub enum AppEvent {
    TextureLoaded {
        url: String,
        result: anyhow::Result<image::RgbaImage>,
    },
    #[cfg(target_arch = "wasm32")]
    Initialized(Gpu),
}

impl std::fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextureLoaded { url, result } => f
                .debug_struct("TextureLoaded")
                .field("url", url)
                .field("ok", &result.is_ok())
                .finish(),
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    config: Config,
    window: Option<Arc<Window>>,
    state: Option<AppState>,
    gpu: Option<Gpu>,
}

impl App {
    pub fn new(event_loop: &EventLoop<AppEvent>, config: Config) -> anyhow::Result<Self> {
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime =
            tokio::runtime::Runtime::new().context("cannot start the async runtime")?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy: event_loop.create_proxy(),
            config,
            window: None,
            state: None,
            gpu: None,
        })
    }

    fn spawn_fetch(&self, url: String) {
        let root = self.config.asset_root.clone();
        let proxy = self.proxy.clone();
        let fetch = async move {
            let result = fetch_image(root, url.clone()).await;
            if proxy
                .send_event(AppEvent::TextureLoaded { url, result })
                .is_err()
            {
                log::warn!("event loop closed before a texture finished loading");
            }
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(fetch);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(fetch);
    }

    fn create_window(event_loop: &ActiveEventLoop) -> anyhow::Result<Arc<Window>> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Haunted House");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .context("no canvas element to draw into")?;
            window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
        }

        Ok(Arc::new(event_loop.create_window(window_attributes)?))
    }

    fn resize(&mut self) {
        let (Some(window), Some(state)) = (&self.window, &mut self.state) else {
            return;
        };
        let viewport = Viewport::from_physical(window.inner_size(), window.scale_factor());
        state.resize(viewport);
        if let Some(gpu) = &mut self.gpu {
            gpu.ctx.resize(viewport.surface_size());
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(state), Some(gpu)) =
            (&self.window, &mut self.state, &mut self.gpu)
        else {
            return;
        };
        match step(state, gpu, window.as_ref()) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.ctx.resize(state.viewport.surface_size());
            }
            Err(e) => log::error!("Unable to render {e}"),
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match Self::create_window(event_loop) {
            Ok(window) => window,
            Err(e) => {
                log::error!("Cannot create the window: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let viewport = Viewport::from_physical(window.inner_size(), window.scale_factor());
        let mut state = AppState::new(&self.config, viewport, &mut rand::rng());
        for url in state.loader.take_requests() {
            self.spawn_fetch(url);
        }

        let init = Context::new(
            window.clone(),
            state.viewport,
            state.camera,
            state.projection,
            state.lights.clone(),
        );

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(init) {
            Ok(ctx) => self.gpu = Some(Gpu::new(ctx)),
            Err(e) => {
                log::error!("App initialization failed: {e:#}");
                event_loop.exit();
                return;
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init.await {
                    Ok(ctx) => {
                        if proxy.send_event(AppEvent::Initialized(Gpu::new(ctx))).is_err() {
                            log::error!("event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {e:#}"),
                }
            });
        }

        window.request_redraw();
        self.state = Some(state);
        self.window = Some(window);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::TextureLoaded { url, result } => {
                if let Some(state) = &mut self.state {
                    state.complete_texture(&url, result);
                }
            }
            #[cfg(target_arch = "wasm32")]
            AppEvent::Initialized(gpu) => {
                self.gpu = Some(gpu);
                self.resize();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        #[cfg(feature = "ui")]
        let captured = match (&self.window, &mut self.gpu) {
            (Some(window), Some(gpu)) => {
                let consumed = gpu.ctx.gui.handle_window_event(window, &event);
                consumed || gpu.ctx.gui.wants_pointer_input()
            }
            _ => false,
        };
        #[cfg(not(feature = "ui"))]
        let captured = false;

        if !captured {
            if let Some(state) = &mut self.state {
                state.handle_window_event(&event);
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

pub fn run(config: Config) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {e}");
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::log_1(&format!("Could not initialize logger: {e}").into());
        }
    }

    log::info!("starting the {} preset", config.preset);
    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(Config::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
