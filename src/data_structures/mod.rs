//! Scene data: node transforms, materials and the scene graph.
//!
//! - `instance` holds per-node transformation data and its raw upload form
//! - `material` holds colours and the scalar PBR factors of a mesh
//! - `scene_graph` is the node arena, animation clips and the loaded asset

pub mod instance;
pub mod material;
pub mod scene_graph;
