//! Per-page context: viewport, active camera and runtime configuration.

use crate::{
    camera::{self, CameraUniform, PerspectiveCamera},
    data_structures::scene_graph::{CameraHandle, SceneAsset},
    scroll::{PiecewiseLinear, PROGRESS_BREAKPOINTS, SCROLL_BREAKPOINTS},
    viewport::ViewportSize,
};

/// Asset file loaded on start, relative to the assets directory.
pub const MODEL_PATH: &str = "models/blenderfile.glb";

/// Runtime configuration of a configurator page.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub model_path: String,
    /// Scrollable page height in viewport heights. Only used by hosts that emulate the page.
    pub page_viewports: f64,
    pub scroll_input: Vec<f32>,
    pub scroll_output: Vec<f32>,
    /// Initial viewport until the host reports a real one.
    pub viewport: ViewportSize,
}

impl Config {
    pub fn scroll_curve(&self) -> anyhow::Result<PiecewiseLinear> {
        PiecewiseLinear::new(&self.scroll_input, &self.scroll_output)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: MODEL_PATH.to_string(),
            page_viewports: 6.0,
            scroll_input: SCROLL_BREAKPOINTS.to_vec(),
            scroll_output: PROGRESS_BREAKPOINTS.to_vec(),
            viewport: ViewportSize::new(1280, 720),
        }
    }
}

/// The camera frames are rendered through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveCamera {
    /// The host's camera, used until an asset provides one.
    #[default]
    Default,
    Embedded(CameraHandle),
}

#[derive(Debug)]
pub struct Context {
    pub viewport: ViewportSize,
    pub default_camera: PerspectiveCamera,
    pub active_camera: ActiveCamera,
    pub camera_uniform: CameraUniform,
}

impl Context {
    pub fn new(viewport: ViewportSize) -> Self {
        let mut default_camera = PerspectiveCamera::default();
        default_camera.aspect = viewport.aspect();
        default_camera.update_projection_matrix();
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(camera::default_camera_world(), &default_camera);
        Self {
            viewport,
            default_camera,
            active_camera: ActiveCamera::Default,
            camera_uniform,
        }
    }

    /// Adopt a new viewport size and refit the active camera to it.
    pub fn resize(&mut self, size: ViewportSize, asset: Option<&mut SceneAsset>) {
        self.viewport = size;
        self.default_camera.resize(size.width, size.height);
        if let (ActiveCamera::Embedded(handle), Some(asset)) = (self.active_camera, asset) {
            if let Some(embedded) = asset.camera_mut(handle) {
                embedded.camera.resize(size.width, size.height);
            }
        }
    }

    /// Recompute the camera uniform from the active camera's current pose.
    ///
    /// An embedded camera whose asset is gone falls back to the default camera.
    pub fn update_camera_uniform(&mut self, asset: Option<&SceneAsset>) -> CameraUniform {
        let embedded = match (self.active_camera, asset) {
            (ActiveCamera::Embedded(handle), Some(asset)) => asset.camera(handle).and_then(|embedded| {
                let world = asset.graph().world_matrix(embedded.node)?;
                Some((world, &embedded.camera))
            }),
            _ => None,
        };
        match embedded {
            Some((world, camera)) => self.camera_uniform.update_view_proj(world, camera),
            None => self
                .camera_uniform
                .update_view_proj(camera::default_camera_world(), &self.default_camera),
        }
        self.camera_uniform
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Config::default().viewport)
    }
}
