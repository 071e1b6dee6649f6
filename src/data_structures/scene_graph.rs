//! Scene graph and the loaded scene asset.
//!
//! The graph is an arena of [`SceneNode`]s addressed by [`NodeHandle`]. A
//! [`SceneAsset`] bundles the graph with its animation tracks, embedded
//! cameras and a [`SceneIndex`] that is built once at load time, so that
//! components resolve names to typed handles instead of searching the tree.
//!
//! Write ownership inside a mounted asset is partitioned:
//! - animation tracks and the node transforms they target belong to the
//!   animation driver,
//! - the target mesh's transform and material belong to the parametric
//!   mesh controller,
//! - cameras, visibility and culling flags belong to the scene adapter.

use std::collections::{HashMap, HashSet};

use anyhow::bail;
use cgmath::SquareMatrix;

use crate::{
    animation::track::AnimationTrack,
    camera::PerspectiveCamera,
    data_structures::{
        instance::{Instance, InstanceRaw},
        material::Material,
    },
    resources::animation::{Interpolation, Keyframes},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackHandle(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub(crate) usize);

/// Axis-aligned bounds of a mesh in its local (authored) space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: cgmath::Vector3<f32>,
    pub max: cgmath::Vector3<f32>,
}

impl Aabb {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: cgmath::Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: cgmath::Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub bounds: Aabb,
    pub material: Material,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshData),
    SkinnedMesh(MeshData),
    Bone,
    Camera(CameraHandle),
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub local: Instance,
    pub visible: bool,
    pub frustum_culled: bool,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, local: Instance) -> Self {
        Self {
            name: name.into(),
            kind,
            local,
            visible: true,
            frustum_culled: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        match &self.kind {
            NodeKind::Mesh(mesh) | NodeKind::SkinnedMesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshData> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) | NodeKind::SkinnedMesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_skinned(&self) -> bool {
        matches!(self.kind, NodeKind::SkinnedMesh(_))
    }
}

/// Arena of scene nodes. Handles stay valid for the lifetime of the graph.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeHandle>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node` below `parent` (or as a root) and returns its handle.
    pub fn add_node(&mut self, parent: Option<NodeHandle>, mut node: SceneNode) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        node.parent = parent.filter(|p| p.0 < self.nodes.len());
        node.children.clear();
        match node.parent {
            Some(parent) => self.nodes[parent.0].children.push(handle),
            None => self.roots.push(handle),
        }
        self.nodes.push(node);
        handle
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    /// Handles in depth-first, parent-before-children order.
    pub fn traverse(&self) -> Vec<NodeHandle> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeHandle> = self.roots.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            order.push(handle);
            stack.extend(self.nodes[handle.0].children.iter().rev().copied());
        }
        order
    }

    pub fn traverse_mut(&mut self, mut visit: impl FnMut(&mut SceneNode)) {
        for handle in self.traverse() {
            visit(&mut self.nodes[handle.0]);
        }
    }

    pub fn world_matrix(&self, handle: NodeHandle) -> Option<cgmath::Matrix4<f32>> {
        let mut node = self.node(handle)?;
        let mut world = node.local.to_matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            world = node.local.to_matrix() * world;
        }
        Some(world)
    }

    /// World matrices of every node, indexed like the arena.
    pub fn world_matrices(&self) -> Vec<cgmath::Matrix4<f32>> {
        let mut worlds = vec![cgmath::Matrix4::identity(); self.nodes.len()];
        for handle in self.traverse() {
            let node = &self.nodes[handle.0];
            let local = node.local.to_matrix();
            worlds[handle.0] = match node.parent {
                Some(parent) => worlds[parent.0] * local,
                None => local,
            };
        }
        worlds
    }

    /// Raw instances of all visible mesh nodes, ready for a render surface.
    pub fn visible_instances(&self) -> Vec<(NodeHandle, InstanceRaw)> {
        let worlds = self.world_matrices();
        self.traverse()
            .into_iter()
            .filter(|handle| self.is_visible(*handle))
            .filter(|handle| self.nodes[handle.0].mesh().is_some())
            .map(|handle| (handle, InstanceRaw::from_world(worlds[handle.0])))
            .collect()
    }

    /// A node is drawn only if it and all its ancestors are visible.
    pub fn is_visible(&self, handle: NodeHandle) -> bool {
        let mut current = self.node(handle);
        while let Some(node) = current {
            if !node.visible {
                return false;
            }
            current = node.parent.and_then(|p| self.node(p));
        }
        true
    }
}

/// One animated property of one node.
#[derive(Clone, Debug)]
pub struct Channel {
    pub target: NodeHandle,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
    pub interpolation: Interpolation,
}

/// An animation clip: a named set of channels sharing one timeline.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .filter_map(|channel| channel.timestamps.last())
            .fold(0.0, |acc, &t| acc.max(t))
    }
}

#[derive(Clone, Debug)]
pub struct EmbeddedCamera {
    pub node: NodeHandle,
    pub camera: PerspectiveCamera,
}

/// Name → handle registry, resolved once when the asset is built.
#[derive(Clone, Debug, Default)]
pub struct SceneIndex {
    nodes: HashMap<String, NodeHandle>,
    tracks: HashMap<String, TrackHandle>,
}

impl SceneIndex {
    fn build(graph: &SceneGraph, tracks: &[AnimationTrack]) -> Self {
        let mut nodes = HashMap::new();
        // first node in traversal order wins, like a depth-first lookup by name
        for handle in graph.traverse() {
            if let Some(node) = graph.node(handle) {
                nodes.entry(node.name.clone()).or_insert(handle);
            }
        }
        let mut index = HashMap::new();
        for (i, track) in tracks.iter().enumerate() {
            index.entry(track.name().to_string()).or_insert(TrackHandle(i));
        }
        Self {
            nodes,
            tracks: index,
        }
    }

    pub fn node(&self, name: &str) -> Option<NodeHandle> {
        self.nodes.get(name).copied()
    }

    pub fn track(&self, name: &str) -> Option<TrackHandle> {
        self.tracks.get(name).copied()
    }
}

/// A loaded scene: graph, animation tracks, embedded cameras and the name registry.
#[derive(Clone, Debug)]
pub struct SceneAsset {
    graph: SceneGraph,
    tracks: Vec<AnimationTrack>,
    cameras: Vec<EmbeddedCamera>,
    index: SceneIndex,
}

impl SceneAsset {
    pub fn new(graph: SceneGraph, clips: Vec<AnimationClip>, cameras: Vec<EmbeddedCamera>) -> Self {
        let tracks: Vec<AnimationTrack> = clips.into_iter().map(AnimationTrack::new).collect();
        let index = SceneIndex::build(&graph, &tracks);
        Self {
            graph,
            tracks,
            cameras,
            index,
        }
    }

    pub fn index(&self) -> &SceneIndex {
        &self.index
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.graph.node(handle)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.graph.node_mut(handle)
    }

    pub fn tracks(&self) -> &[AnimationTrack] {
        &self.tracks
    }

    pub fn track(&self, handle: TrackHandle) -> Option<&AnimationTrack> {
        self.tracks.get(handle.0)
    }

    pub fn track_mut(&mut self, handle: TrackHandle) -> Option<&mut AnimationTrack> {
        self.tracks.get_mut(handle.0)
    }

    /// Writes the pose of track `handle` at its current time into the graph.
    pub fn apply_track(&mut self, handle: TrackHandle) {
        if let Some(track) = self.tracks.get(handle.0) {
            track.apply(&mut self.graph);
        }
    }

    pub fn cameras(&self) -> &[EmbeddedCamera] {
        &self.cameras
    }

    pub fn camera(&self, handle: CameraHandle) -> Option<&EmbeddedCamera> {
        self.cameras.get(handle.0)
    }

    pub fn camera_mut(&mut self, handle: CameraHandle) -> Option<&mut EmbeddedCamera> {
        self.cameras.get_mut(handle.0)
    }

    pub fn first_camera(&self) -> Option<CameraHandle> {
        (!self.cameras.is_empty()).then_some(CameraHandle(0))
    }
}

/// Converts a glTF node and its subtree into graph nodes below `parent`.
///
/// Joints of any skin become [`NodeKind::Bone`]; embedded cameras are collected into `cameras`
/// in traversal order. A node listed under several parents is only instantiated at its first
/// occurrence. `ancestors` holds the glTF indices on the path from the root; a node that is its
/// own ancestor fails the conversion.
pub fn to_scene_node(
    node: gltf::scene::Node,
    parent: Option<NodeHandle>,
    graph: &mut SceneGraph,
    joints: &HashSet<usize>,
    cameras: &mut Vec<EmbeddedCamera>,
    handles: &mut HashMap<usize, NodeHandle>,
    ancestors: &mut Vec<usize>,
) -> anyhow::Result<()> {
    if ancestors.contains(&node.index()) {
        bail!("node {} is its own ancestor, the hierarchy has a cycle", node.index());
    }
    if handles.contains_key(&node.index()) {
        log::warn!(
            "Node {} appears twice in the hierarchy, keeping the first occurrence",
            node.index()
        );
        return Ok(());
    }
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let mesh = node.mesh().map(|mesh| {
        let bounds = mesh
            .primitives()
            .map(|primitive| {
                let bb = primitive.bounding_box();
                Aabb::new(bb.min, bb.max)
            })
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Aabb::new([0.0; 3], [0.0; 3]));
        // TODO: keep one material per primitive once multi-material meshes need recolouring
        let material = mesh
            .primitives()
            .next()
            .map(|primitive| Material::from(primitive.material()))
            .unwrap_or_default();
        MeshData { bounds, material }
    });
    // a node carrying both a mesh and a camera is treated as a mesh
    let camera = if mesh.is_none() { node.camera() } else { None };
    let kind = match (mesh, &camera) {
        (Some(mesh), _) if node.skin().is_some() => NodeKind::SkinnedMesh(mesh),
        (Some(mesh), _) => NodeKind::Mesh(mesh),
        (None, Some(_)) => NodeKind::Camera(CameraHandle(cameras.len())),
        (None, None) if joints.contains(&node.index()) => NodeKind::Bone,
        (None, None) => NodeKind::Group,
    };
    log::debug!("Found: {}", name);
    let local: Instance = node.transform().decomposed().into();
    let handle = graph.add_node(parent, SceneNode::new(name, kind, local));
    handles.insert(node.index(), handle);
    if let Some(camera) = camera {
        cameras.push(EmbeddedCamera {
            node: handle,
            camera: camera.into(),
        });
    }
    ancestors.push(node.index());
    for child in node.children() {
        to_scene_node(child, Some(handle), graph, joints, cameras, handles, ancestors)?;
    }
    ancestors.pop();
    Ok(())
}
