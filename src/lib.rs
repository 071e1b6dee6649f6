//! configurator-ngin
//!
//! The core of a scroll-driven 3D product configurator. A glTF scene is
//! scrubbed through its baked body and camera animations as the page
//! scrolls, loops an idle animation once the end is reached, and has one
//! mesh reshaped and recoloured live from an overlay panel. Rendering is
//! left to a host-provided [`flow::RenderSurface`]; the crate runs natively
//! on a winit window or in the browser.
//!
//! High-level modules
//! - `scroll`: scroll fraction to remapped progress
//! - `animation`: animation tracks and the scroll-synchronised driver
//! - `adapter`: mounting the loaded scene and taking over its camera
//! - `parametric`: length, width and colour of the adjustable mesh
//! - `overlay`: state of the control panel drawn over the scene
//! - `viewport`: viewport size and layout regime
//! - `camera`, `context`: projection, active camera and runtime configuration
//! - `data_structures`: scene graph, node transforms and materials
//! - `resources`: asset loading and glTF keyframe sampling
//! - `flow`: frame orchestration and the native event loop
//! - `web`: DOM bindings for the wasm build
//!

pub mod adapter;
pub mod animation;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod listeners;
pub mod overlay;
pub mod parametric;
pub mod resources;
pub mod scroll;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use flow::{Configurator, Frame, Out, RenderSurface};
