//! Frame orchestration and the native event loop.
//!
//! A [`Configurator`] owns every component of one configurator page and is
//! driven by a host: the native winit loop in this module or the DOM glue in
//! `web`. Hosts forward events as they arrive and call
//! [`Configurator::render`] once per frame.
//!
//! # Lifecycle Flow
//!
//! Within one frame:
//! 1. Scroll, resize and control events queued since the last frame are applied
//! 2. The return-to-top animation (if any) produces a new scroll offset
//! 3. The animation driver moves both tracks and writes the scene graph
//! 4. The camera uniform is recomputed from the active camera
//! 5. The [`RenderSurface`] draws the resulting [`Frame`]

use std::fmt::Debug;

use instant::Duration;

use crate::{
    adapter::SceneGraphAdapter,
    animation::driver::{AnimationDriver, DriverMode},
    camera::CameraUniform,
    context::{Config, Context},
    data_structures::{
        instance::InstanceRaw,
        scene_graph::{NodeHandle, SceneAsset},
    },
    listeners::Subscription,
    overlay::{ControlChange, ControlEvent, OverlayPanel, OverlayView},
    parametric::ParametricMeshController,
    scroll::{ScrollPosition, ScrollProgress, ScrollState},
    viewport::{ViewportAdapter, ViewportSize},
};

///
/// Output of a frame update that the host has to act on.
///
/// `Out::ScrollTo` asks the host to move the page to the given offset (in CSS pixels); the
/// resulting scroll event comes back through [`Configurator::on_scroll`].
///
/// `Empty` is the default output used when nothing needs to be handled.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Out {
    ScrollTo(f64),
    #[default]
    Empty,
}

/// What the host draws each frame.
#[derive(Debug)]
pub struct Frame<'a> {
    /// `None` until the asset is mounted.
    pub scene: Option<&'a SceneAsset>,
    pub camera: CameraUniform,
    /// World transforms of every visible mesh node.
    pub instances: Vec<(NodeHandle, InstanceRaw)>,
    pub overlay: OverlayView,
    pub mode: DriverMode,
    pub viewport: ViewportSize,
}

/// The external renderer. Implemented by the host.
pub trait RenderSurface {
    fn resize(&mut self, size: ViewportSize);

    fn draw(&mut self, frame: &Frame<'_>) -> anyhow::Result<()>;
}

// Dummy impl to make trait objects debuggable
impl Debug for dyn RenderSurface + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RenderSurface")
    }
}

#[derive(Debug)]
pub struct Configurator {
    ctx: Context,
    scroll: ScrollProgress,
    viewport: ViewportAdapter,
    driver: AnimationDriver,
    adapter: SceneGraphAdapter,
    controller: ParametricMeshController,
    overlay: OverlayPanel,
    scroll_offset: f64,
}

impl Configurator {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_adapter(config, SceneGraphAdapter::new())
    }

    /// `on_ready` is called exactly once, with the mounted scene.
    pub fn with_ready_callback(
        config: &Config,
        on_ready: impl FnOnce(&SceneAsset) + 'static,
    ) -> anyhow::Result<Self> {
        Self::with_adapter(config, SceneGraphAdapter::with_ready_callback(on_ready))
    }

    fn with_adapter(config: &Config, adapter: SceneGraphAdapter) -> anyhow::Result<Self> {
        Ok(Self {
            ctx: Context::new(config.viewport),
            scroll: ScrollProgress::new(config.scroll_curve()?),
            viewport: ViewportAdapter::new(config.viewport),
            driver: AnimationDriver::new(),
            adapter,
            controller: ParametricMeshController::new(),
            overlay: OverlayPanel::new(),
            scroll_offset: 0.0,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn scroll(&self) -> &ScrollProgress {
        &self.scroll
    }

    pub fn viewport(&self) -> &ViewportAdapter {
        &self.viewport
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn adapter(&self) -> &SceneGraphAdapter {
        &self.adapter
    }

    pub fn overlay(&self) -> &OverlayPanel {
        &self.overlay
    }

    pub fn scene(&self) -> Option<&SceneAsset> {
        self.adapter.asset()
    }

    pub fn subscribe_scroll(&self, callback: impl FnMut(&ScrollState) + 'static) -> Subscription {
        self.scroll.subscribe(callback)
    }

    pub fn subscribe_viewport(
        &self,
        callback: impl FnMut(&ViewportSize) + 'static,
    ) -> Subscription {
        self.viewport.subscribe(callback)
    }

    pub fn on_asset_loaded(&mut self, asset: SceneAsset) {
        self.adapter.mount(asset, &mut self.ctx);
        if let Some(asset) = self.adapter.asset_mut() {
            self.driver.bind(asset);
        }
        self.controller
            .apply_all(self.adapter.asset_mut(), &self.overlay.controls());
        self.driver.observe_progress(self.scroll.progress());
    }

    pub fn on_asset_failed(&mut self, error: anyhow::Error) {
        self.adapter.fail(format!("{:#}", error));
    }

    pub fn on_scroll(&mut self, position: ScrollPosition) -> ScrollState {
        self.scroll_offset = position.offset;
        let state = self.scroll.set_position(position);
        if let Some(mode) = self.driver.observe_progress(state.progress) {
            log::debug!("Scroll progress {} switched the driver to {:?}", state.progress, mode);
        }
        state
    }

    /// Returns `true` if the size changed.
    pub fn on_resize(&mut self, size: ViewportSize) -> bool {
        if !self.viewport.observe(size) {
            return false;
        }
        self.ctx.resize(size, self.adapter.asset_mut());
        true
    }

    /// Forward an overlay widget event; resulting changes go straight to the target mesh.
    pub fn on_control(&mut self, event: ControlEvent, now: Duration) -> Option<ControlChange> {
        let change = self
            .overlay
            .handle(event, self.viewport.size(), self.scroll_offset, now)?;
        let asset = self.adapter.asset_mut();
        match change {
            ControlChange::Length(length) => self.controller.set_length(asset, length),
            ControlChange::Width(width) => self.controller.set_width(asset, width),
            ControlChange::Color(color) => self.controller.set_color(asset, color),
        };
        Some(change)
    }

    /// Advance everything that depends on the frame clock.
    pub fn on_update(&mut self, clock: Duration) -> Out {
        let out = match self.overlay.step_return_to_top(clock) {
            Some(offset) => Out::ScrollTo(offset),
            None => Out::Empty,
        };
        self.driver.update(self.adapter.asset_mut(), clock);
        self.ctx.update_camera_uniform(self.adapter.asset());
        out
    }

    pub fn frame(&self) -> Frame<'_> {
        let scene = self.adapter.asset();
        Frame {
            scene,
            camera: self.ctx.camera_uniform,
            instances: scene
                .map(|asset| asset.graph().visible_instances())
                .unwrap_or_default(),
            overlay: self
                .overlay
                .view(self.scroll.state(), self.viewport.layout()),
            mode: self.driver.mode(),
            viewport: self.viewport.size(),
        }
    }

    /// Update and draw one frame.
    pub fn render(
        &mut self,
        surface: &mut dyn RenderSurface,
        clock: Duration,
    ) -> anyhow::Result<Out> {
        let out = self.on_update(clock);
        surface.draw(&self.frame())?;
        Ok(out)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::run;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::sync::Arc;

    use instant::Instant;
    use winit::{
        application::ApplicationHandler,
        event::{MouseScrollDelta, WindowEvent},
        event_loop::{ActiveEventLoop, EventLoop},
        window::Window,
    };

    use super::{Configurator, Out, RenderSurface};
    use crate::{context::Config, resources, scroll::ScrollPosition, viewport::ViewportSize};

    /// Pixels scrolled per wheel line.
    const LINE_HEIGHT: f64 = 40.0;

    struct App<S: RenderSurface> {
        async_runtime: tokio::runtime::Runtime,
        config: Config,
        configurator: Configurator,
        surface: S,
        window: Option<Arc<Window>>,
        started: Instant,
        // the native window has no page, so the scroll offset is emulated
        offset: f64,
        loaded: bool,
    }

    impl<S: RenderSurface> App<S> {
        fn scroll_position(&self) -> ScrollPosition {
            let viewport_height = self.configurator.viewport().size().height as f64;
            ScrollPosition {
                offset: self.offset,
                scroll_height: viewport_height * self.config.page_viewports,
                viewport_height,
            }
        }

        fn scroll_to(&mut self, offset: f64) {
            self.offset = offset.clamp(0.0, self.scroll_position().max_offset());
            let position = self.scroll_position();
            self.configurator.on_scroll(position);
        }

        fn load(&mut self) {
            if self.loaded {
                return;
            }
            self.loaded = true;
            let result = self
                .async_runtime
                .block_on(resources::load_scene_gltf(&self.config.model_path));
            match result {
                Ok(asset) => self.configurator.on_asset_loaded(asset),
                Err(e) => self.configurator.on_asset_failed(e),
            }
        }
    }

    impl<S: RenderSurface> ApplicationHandler for App<S> {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }
            let window = match event_loop.create_window(Window::default_attributes()) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    log::error!("Could not create a window: {}", e);
                    event_loop.exit();
                    return;
                }
            };
            let size = window.inner_size();
            let size = ViewportSize::new(size.width, size.height);
            self.configurator.on_resize(size);
            self.surface.resize(size);
            self.load();
            self.scroll_to(self.offset);
            window.request_redraw();
            self.window = Some(window);
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            _window_id: winit::window::WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::Resized(size) => {
                    let size = ViewportSize::new(size.width, size.height);
                    if self.configurator.on_resize(size) {
                        self.surface.resize(size);
                        // keep the same fraction of the page in view
                        self.scroll_to(self.offset);
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let dy = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y as f64 * LINE_HEIGHT,
                        MouseScrollDelta::PixelDelta(position) => position.y,
                    };
                    self.scroll_to(self.offset - dy);
                }
                WindowEvent::RedrawRequested => {
                    let clock = self.started.elapsed();
                    match self.configurator.render(&mut self.surface, clock) {
                        Ok(Out::ScrollTo(offset)) => self.scroll_to(offset),
                        Ok(Out::Empty) => (),
                        Err(e) => log::error!("Frame could not be drawn: {:#}", e),
                    }
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                _ => {}
            }
        }
    }

    /// Open a window and run the configurator until it is closed.
    pub fn run<S: RenderSurface + 'static>(config: Config, surface: S) -> anyhow::Result<()> {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };

        let event_loop = EventLoop::new()?;
        let mut app = App {
            async_runtime: tokio::runtime::Runtime::new()?,
            configurator: Configurator::new(&config)?,
            config,
            surface,
            window: None,
            started: Instant::now(),
            offset: 0.0,
            loaded: false,
        };

        event_loop.run_app(&mut app)?;

        Ok(())
    }
}
