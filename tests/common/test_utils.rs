#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use configurator_ngin::{
    data_structures::scene_graph::{NodeHandle, SceneAsset},
    flow::{Frame, RenderSurface},
    resources::parse_scene_gltf,
    viewport::ViewportSize,
};

/// Authored height of the fixture's triangle mesh.
pub const MESH_HEIGHT: f32 = 2.0;
/// Both fixture tracks move their node's y by exactly the track time.
pub const TRACK_LENGTH: f32 = 6.3;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

fn push_f32s(bin: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        bin.extend_from_slice(&value.to_le_bytes());
    }
}

/// Wraps a glTF JSON document and its binary buffer into a GLB container.
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&bin);
    out
}

fn bag_bin() -> Vec<u8> {
    let mut bin = Vec::new();
    // triangle, 36 bytes
    push_f32s(&mut bin, &[-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0]);
    // keyframe times, 8 bytes
    push_f32s(&mut bin, &[0.0, TRACK_LENGTH]);
    // bone translations, 24 bytes
    push_f32s(&mut bin, &[0.0, 0.0, 0.0, 0.0, TRACK_LENGTH, 0.0]);
    // camera translations, 24 bytes
    push_f32s(&mut bin, &[0.0, 0.0, 10.0, 0.0, TRACK_LENGTH, 10.0]);
    bin
}

/// A small bag: an armature with one bone driving a skinned mesh, the adjustable
/// handle mesh (named `target`), a camera and the two animations `Action` and `CameraAction`.
pub fn bag_glb_with_target(target: &str) -> Vec<u8> {
    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [
    {{ "name": "Scene", "children": [1, 3, 4] }},
    {{ "name": "Armature", "children": [2, 5] }},
    {{ "name": "Bone" }},
    {{ "name": "{target}", "mesh": 0, "translation": [0.0, 0.334, 0.0], "scale": [0.322, 0.322, 0.322] }},
    {{ "name": "Camera", "camera": 0, "translation": [0.0, 0.0, 10.0] }},
    {{ "name": "Bag", "mesh": 1, "skin": 0 }}
  ],
  "meshes": [
    {{ "name": "HandleMesh", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }},
    {{ "name": "BagMesh", "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}
  ],
  "materials": [
    {{ "name": "Handle", "pbrMetallicRoughness": {{ "baseColorFactor": [0.8, 0.8, 0.8, 1.0], "metallicFactor": 0.0, "roughnessFactor": 0.9 }} }}
  ],
  "skins": [{{ "joints": [2] }}],
  "cameras": [
    {{ "type": "perspective", "perspective": {{ "yfov": 0.8, "znear": 0.01, "zfar": 1000.0 }} }}
  ],
  "animations": [
    {{
      "name": "Action",
      "samplers": [{{ "input": 1, "output": 2, "interpolation": "LINEAR" }}],
      "channels": [{{ "sampler": 0, "target": {{ "node": 2, "path": "translation" }} }}]
    }},
    {{
      "name": "CameraAction",
      "samplers": [{{ "input": 1, "output": 3, "interpolation": "LINEAR" }}],
      "channels": [{{ "sampler": 0, "target": {{ "node": 4, "path": "translation" }} }}]
    }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [-1.0, -1.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [{len}] }},
    {{ "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [0.0, {len}, 0.0] }},
    {{ "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3", "min": [0.0, 0.0, 10.0], "max": [0.0, {len}, 10.0] }}
  ],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 8 }},
    {{ "buffer": 0, "byteOffset": 44, "byteLength": 24 }},
    {{ "buffer": 0, "byteOffset": 68, "byteLength": 24 }}
  ],
  "buffers": [{{ "byteLength": 92 }}]
}}"#,
        target = target,
        len = TRACK_LENGTH,
    );
    glb(&json, &bag_bin())
}

pub fn bag_glb() -> Vec<u8> {
    bag_glb_with_target("Cylinder2")
}

pub fn bag_scene() -> SceneAsset {
    parse_scene_gltf(&bag_glb()).expect("fixture should parse")
}

/// The same bag, but the adjustable mesh is missing.
pub fn scene_without_target() -> SceneAsset {
    parse_scene_gltf(&bag_glb_with_target("Handle")).expect("fixture should parse")
}

pub fn node(asset: &SceneAsset, name: &str) -> NodeHandle {
    asset
        .index()
        .node(name)
        .unwrap_or_else(|| panic!("fixture has no node {}", name))
}

pub fn track_time(asset: &SceneAsset, name: &str) -> f32 {
    let handle = asset
        .index()
        .track(name)
        .unwrap_or_else(|| panic!("fixture has no track {}", name));
    asset.track(handle).expect("valid handle").time()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

/// What a [`RecordingSurface`] saw.
#[derive(Debug, Default)]
pub struct Recorded {
    pub resizes: Vec<ViewportSize>,
    pub frames: u32,
    pub last_instances: usize,
    pub last_scene_ready: bool,
    pub last_view_proj: [[f32; 4]; 4],
}

/// A render surface that only records what it was asked to draw.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub recorded: Rc<RefCell<Recorded>>,
}

impl RenderSurface for RecordingSurface {
    fn resize(&mut self, size: ViewportSize) {
        self.recorded.borrow_mut().resizes.push(size);
    }

    fn draw(&mut self, frame: &Frame<'_>) -> anyhow::Result<()> {
        let mut recorded = self.recorded.borrow_mut();
        recorded.frames += 1;
        recorded.last_instances = frame.instances.len();
        recorded.last_scene_ready = frame.scene.is_some();
        recorded.last_view_proj = frame.camera.view_proj;
        Ok(())
    }
}
