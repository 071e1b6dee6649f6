//! Mounting a loaded scene: render fixes and camera takeover.

use crate::{
    context::{ActiveCamera, Context},
    data_structures::scene_graph::{NodeKind, SceneAsset},
};

pub const CAMERA_FOV_DEG: f32 = 50.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;

/// Where the scene asset is in its lifecycle.
#[derive(Debug, Default)]
pub enum AssetSlot {
    #[default]
    Loading,
    Failed(String),
    Ready(SceneAsset),
}

/// What [`prepare_scene`] changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrepareReport {
    pub unculled: usize,
    pub made_visible: usize,
}

/// Skinned meshes are never frustum culled: their bounds don't follow the joints, so culling
/// would clip them mid-animation. Meshes and groups are forced visible.
pub fn prepare_scene(asset: &mut SceneAsset) -> PrepareReport {
    let mut report = PrepareReport::default();
    asset.graph_mut().traverse_mut(|node| {
        if node.is_skinned() {
            node.frustum_culled = false;
            report.unculled += 1;
        }
        if matches!(
            node.kind,
            NodeKind::Mesh(_) | NodeKind::SkinnedMesh(_) | NodeKind::Group
        ) {
            if !node.visible {
                report.made_visible += 1;
            }
            node.visible = true;
        }
    });
    report
}

type ReadyCallback = Box<dyn FnOnce(&SceneAsset)>;

/// Owns the scene asset for the lifetime of the page.
pub struct SceneGraphAdapter {
    slot: AssetSlot,
    on_ready: Option<ReadyCallback>,
}

impl SceneGraphAdapter {
    pub fn new() -> Self {
        Self {
            slot: AssetSlot::Loading,
            on_ready: None,
        }
    }

    /// `on_ready` runs exactly once, when the first asset has been mounted.
    pub fn with_ready_callback(on_ready: impl FnOnce(&SceneAsset) + 'static) -> Self {
        Self {
            slot: AssetSlot::Loading,
            on_ready: Some(Box::new(on_ready)),
        }
    }

    pub fn slot(&self) -> &AssetSlot {
        &self.slot
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.slot, AssetSlot::Ready(_))
    }

    pub fn asset(&self) -> Option<&SceneAsset> {
        match &self.slot {
            AssetSlot::Ready(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn asset_mut(&mut self) -> Option<&mut SceneAsset> {
        match &mut self.slot {
            AssetSlot::Ready(asset) => Some(asset),
            _ => None,
        }
    }

    /// Fix up the asset, take over its first camera and notify the ready callback.
    pub fn mount(&mut self, mut asset: SceneAsset, ctx: &mut Context) {
        let report = prepare_scene(&mut asset);
        log::info!(
            "Mounted scene: {} nodes, {} tracks, {} cameras ({} skinned meshes unculled, {} nodes made visible)",
            asset.graph().len(),
            asset.tracks().len(),
            asset.cameras().len(),
            report.unculled,
            report.made_visible
        );
        match asset.first_camera() {
            Some(handle) => {
                if let Some(embedded) = asset.camera_mut(handle) {
                    let camera = &mut embedded.camera;
                    camera.fovy = cgmath::Deg(CAMERA_FOV_DEG);
                    camera.znear = CAMERA_NEAR;
                    camera.zfar = CAMERA_FAR;
                    camera.aspect = ctx.viewport.aspect();
                    camera.update_projection_matrix();
                }
                ctx.active_camera = ActiveCamera::Embedded(handle);
            }
            None => log::warn!("Scene has no embedded camera, keeping the default camera"),
        }
        if let Some(on_ready) = self.on_ready.take() {
            on_ready(&asset);
        }
        self.slot = AssetSlot::Ready(asset);
    }

    /// Record a failed load. The adapter stays inert; an existing scene is kept.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::error!("Scene failed to load: {}", reason);
        if !self.is_ready() {
            self.slot = AssetSlot::Failed(reason);
        }
    }
}

impl Default for SceneGraphAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneGraphAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraphAdapter")
            .field("slot", &self.slot)
            .field("notified", &self.on_ready.is_none())
            .finish()
    }
}
