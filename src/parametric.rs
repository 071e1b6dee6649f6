//! Parametric deformation of the adjustable handle mesh.
//!
//! Length and width map to a non-uniform scale of the target mesh, colour to
//! its base colour. The calibration constants below belong to the authored
//! geometry of the bag asset: at the default length of 176 cm the handle has
//! scale 0.322 and sits at y = 0.334.

use crate::data_structures::{
    material::Rgb,
    scene_graph::{NodeHandle, SceneAsset},
};

/// Name of the adjustable mesh node in the asset.
pub const TARGET_MESH: &str = "Cylinder2";

pub const LENGTH_MIN: f32 = 50.0;
pub const LENGTH_MAX: f32 = 176.0;
pub const WIDTH_MIN: f32 = 26.0;
pub const WIDTH_MAX: f32 = 42.0;

pub const DEFAULT_LENGTH: f32 = LENGTH_MAX;
pub const DEFAULT_WIDTH: f32 = 32.0;
pub const DEFAULT_COLOR: &str = "#227772";

/// Authored Y scale of the handle at [`LENGTH_MAX`].
pub const BASE_SCALE_Y: f32 = 0.322;
/// Authored Y position of the handle at [`BASE_SCALE_Y`].
pub const BASE_POSITION_Y: f32 = 0.334;
/// X/Z scale per centimetre of width; 32 cm reproduces the authored 0.322.
pub const WIDTH_SCALE_PER_CM: f32 = 0.0100625;

pub const ROUGHNESS: f32 = 0.5;
pub const REFLECTIVITY: f32 = 0.0;

pub fn length_in_range(length: f32) -> bool {
    (LENGTH_MIN..=LENGTH_MAX).contains(&length)
}

pub fn width_in_range(width: f32) -> bool {
    (WIDTH_MIN..=WIDTH_MAX).contains(&width)
}

/// `(scale_y, position_y)` for `length`, keeping the top edge of a mesh of height `h` fixed.
pub fn length_transform(length: f32, h: f32) -> (f32, f32) {
    let factor = length / LENGTH_MAX;
    let scale_y = BASE_SCALE_Y * factor;
    let top_y = BASE_POSITION_Y + h * BASE_SCALE_Y;
    (scale_y, top_y - h * scale_y)
}

pub fn width_scale(width: f32) -> f32 {
    width * WIDTH_SCALE_PER_CM
}

/// The values the visitor has configured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParametricControls {
    pub length: f32,
    pub width: f32,
    pub color: Rgb,
}

impl Default for ParametricControls {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            width: DEFAULT_WIDTH,
            color: Rgb::from_hex(DEFAULT_COLOR).unwrap_or(Rgb::WHITE),
        }
    }
}

/// Writes length, width and colour into the target mesh.
///
/// The mesh is resolved through the scene index on every call; with no scene
/// or no target mesh every update is a silent no-op.
#[derive(Clone, Debug)]
pub struct ParametricMeshController {
    target: String,
}

impl ParametricMeshController {
    pub fn new() -> Self {
        Self::with_target(TARGET_MESH)
    }

    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn resolve(&self, asset: &SceneAsset) -> Option<NodeHandle> {
        let handle = asset.index().node(&self.target)?;
        asset.node(handle)?.mesh().map(|_| handle)
    }

    /// Returns `true` if the mesh was changed.
    pub fn set_color(&self, asset: Option<&mut SceneAsset>, color: Rgb) -> bool {
        let Some(asset) = asset else { return false };
        let Some(handle) = self.resolve(asset) else {
            return false;
        };
        let Some(mesh) = asset.node_mut(handle).and_then(|node| node.mesh_mut()) else {
            return false;
        };
        mesh.material.base_color = color.to_linear();
        mesh.material.roughness = ROUGHNESS;
        mesh.material.reflectivity = REFLECTIVITY;
        true
    }

    /// Out-of-range lengths are ignored. Returns `true` if the mesh was changed.
    pub fn set_length(&self, asset: Option<&mut SceneAsset>, length: f32) -> bool {
        if !length_in_range(length) {
            return false;
        }
        let Some(asset) = asset else { return false };
        let Some(handle) = self.resolve(asset) else {
            return false;
        };
        let Some(node) = asset.node_mut(handle) else {
            return false;
        };
        let h = node.mesh().map(|mesh| mesh.bounds.height()).unwrap_or(0.0);
        let (scale_y, position_y) = length_transform(length, h);
        node.local.scale.y = scale_y;
        node.local.position.y = position_y;
        true
    }

    /// Out-of-range widths are ignored. Returns `true` if the mesh was changed.
    pub fn set_width(&self, asset: Option<&mut SceneAsset>, width: f32) -> bool {
        if !width_in_range(width) {
            return false;
        }
        let Some(asset) = asset else { return false };
        let Some(handle) = self.resolve(asset) else {
            return false;
        };
        let Some(node) = asset.node_mut(handle) else {
            return false;
        };
        let scale = width_scale(width);
        node.local.scale.x = scale;
        node.local.scale.z = scale;
        true
    }

    /// Push every control onto the mesh, e.g. right after the asset is mounted.
    pub fn apply_all(&self, mut asset: Option<&mut SceneAsset>, controls: &ParametricControls) {
        self.set_color(asset.as_deref_mut(), controls.color);
        self.set_length(asset.as_deref_mut(), controls.length);
        self.set_width(asset, controls.width);
    }
}

impl Default for ParametricMeshController {
    fn default() -> Self {
        Self::new()
    }
}
