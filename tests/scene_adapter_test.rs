use std::{cell::Cell, rc::Rc};

use configurator_ngin::{
    adapter::{AssetSlot, SceneGraphAdapter, prepare_scene},
    camera::PerspectiveCamera,
    context::{ActiveCamera, Context},
    data_structures::scene_graph::{NodeKind, SceneAsset, SceneGraph},
    resources::{animation::Interpolation, parse_scene_gltf},
    viewport::ViewportSize,
};

use crate::common::test_utils::{TRACK_LENGTH, approx, bag_scene, glb, node};

mod common;

fn embedded_camera(asset: &SceneAsset) -> &PerspectiveCamera {
    &asset.cameras().first().expect("fixture camera").camera
}

#[test]
fn should_load_nodes_tracks_and_cameras() {
    let asset = bag_scene();
    assert_eq!(asset.graph().len(), 6);
    assert_eq!(asset.graph().roots().len(), 1);

    let bag = asset.node(node(&asset, "Bag")).expect("bag");
    assert!(bag.is_skinned());
    assert!(matches!(
        asset.node(node(&asset, "Bone")).expect("bone").kind,
        NodeKind::Bone
    ));
    assert!(matches!(
        asset.node(node(&asset, "Camera")).expect("camera").kind,
        NodeKind::Camera(_)
    ));
    assert!(matches!(
        asset.node(node(&asset, "Armature")).expect("armature").kind,
        NodeKind::Group
    ));

    let handle = asset.node(node(&asset, "Cylinder2")).expect("handle mesh");
    let mesh = handle.mesh().expect("mesh data");
    assert!(approx(mesh.bounds.height(), 2.0));
    assert!(approx(mesh.material.roughness, 0.9));
    assert!(approx(handle.local.scale.y, 0.322));
    assert!(approx(handle.local.position.y, 0.334));
    assert_eq!(handle.parent(), Some(node(&asset, "Scene")));

    assert_eq!(asset.tracks().len(), 2);
    for name in ["Action", "CameraAction"] {
        let track = asset
            .track(asset.index().track(name).expect("named track"))
            .expect("valid handle");
        assert!(approx(track.duration(), TRACK_LENGTH));
    }

    assert_eq!(asset.cameras().len(), 1);
    assert_eq!(asset.cameras()[0].node, node(&asset, "Camera"));
    assert!(approx(embedded_camera(&asset).znear, 0.01));
}

#[test]
fn should_place_nodes_in_world_space() {
    let asset = bag_scene();
    let world = asset
        .graph()
        .world_matrix(node(&asset, "Camera"))
        .expect("camera world");
    assert!(approx(world.w.z, 10.0));
    assert_eq!(
        Interpolation::from(gltf::animation::Interpolation::Step),
        Interpolation::Step
    );
}

#[test]
fn should_reject_broken_assets() {
    assert!(parse_scene_gltf(b"not a gltf file").is_err());
    let external = r#"{
  "asset": { "version": "2.0" },
  "scenes": [{ "nodes": [] }],
  "buffers": [{ "byteLength": 4, "uri": "missing.bin" }]
}"#;
    assert!(parse_scene_gltf(&glb(external, &[0; 4])).is_err());
    let sceneless = r#"{ "asset": { "version": "2.0" } }"#;
    assert!(parse_scene_gltf(&glb(sceneless, &[0; 4])).is_err());
}

#[test]
fn should_reject_cyclic_hierarchy() {
    let cyclic = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "A", "children": [1] },
    { "name": "B", "children": [0] }
  ]
}"#;
    let error = parse_scene_gltf(&glb(cyclic, &[0; 4])).expect_err("cycle must not load");
    assert!(format!("{:#}", error).contains("cycle"));
}

#[test]
fn should_keep_first_occurrence_of_shared_child() {
    let shared = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0, 1] }],
  "nodes": [
    { "name": "Left", "children": [2] },
    { "name": "Right", "children": [2] },
    { "name": "Shared", "translation": [0.0, 1.0, 0.0] }
  ]
}"#;
    let asset = parse_scene_gltf(&glb(shared, &[0; 4])).expect("shared child loads");
    assert_eq!(asset.graph().len(), 3);
    let shared = asset.node(node(&asset, "Shared")).expect("shared");
    assert_eq!(shared.parent(), Some(node(&asset, "Left")));
    assert!(asset.node(node(&asset, "Right")).expect("right").children().is_empty());
}

#[test]
fn should_uncull_skinned_meshes_and_force_visibility() {
    let mut asset = bag_scene();
    let bag = node(&asset, "Bag");
    let armature = node(&asset, "Armature");
    asset.node_mut(armature).expect("armature").visible = false;
    asset.node_mut(bag).expect("bag").visible = false;

    let report = prepare_scene(&mut asset);
    assert_eq!(report.unculled, 1);
    assert_eq!(report.made_visible, 2);
    assert!(!asset.node(bag).expect("bag").frustum_culled);
    assert!(asset.node(node(&asset, "Cylinder2")).expect("handle").frustum_culled);
    assert!(asset.graph().is_visible(bag));
}

#[test]
fn should_take_over_the_embedded_camera() {
    let mut ctx = Context::new(ViewportSize::new(1600, 800));
    let mut adapter = SceneGraphAdapter::new();
    assert!(matches!(adapter.slot(), AssetSlot::Loading));
    adapter.mount(bag_scene(), &mut ctx);

    assert!(adapter.is_ready());
    assert!(matches!(ctx.active_camera, ActiveCamera::Embedded(_)));
    let camera = embedded_camera(adapter.asset().expect("mounted"));
    assert_eq!(camera.fovy, cgmath::Deg(50.0));
    assert_eq!(camera.znear, 0.1);
    assert_eq!(camera.zfar, 100.0);
    assert_eq!(camera.aspect, 2.0);
    assert_eq!(
        camera.projection_matrix(),
        cgmath::perspective(cgmath::Deg(50.0), 2.0, 0.1, 100.0)
    );
    let asset = adapter.asset().expect("mounted");
    assert!(!asset.node(node(asset, "Bag")).expect("bag").frustum_culled);
}

#[test]
fn should_keep_default_camera_without_embedded_one() {
    let mut ctx = Context::new(ViewportSize::new(1280, 720));
    let mut adapter = SceneGraphAdapter::new();
    adapter.mount(SceneAsset::new(SceneGraph::new(), Vec::new(), Vec::new()), &mut ctx);
    assert!(adapter.is_ready());
    assert_eq!(ctx.active_camera, ActiveCamera::Default);
}

#[test]
fn should_notify_ready_exactly_once() {
    let calls = Rc::new(Cell::new(0));
    let seen_nodes = Rc::new(Cell::new(0));
    let (counter, nodes) = (calls.clone(), seen_nodes.clone());
    let mut adapter = SceneGraphAdapter::with_ready_callback(move |asset| {
        counter.set(counter.get() + 1);
        nodes.set(asset.graph().len());
    });
    let mut ctx = Context::default();
    assert_eq!(calls.get(), 0);
    adapter.mount(bag_scene(), &mut ctx);
    adapter.mount(bag_scene(), &mut ctx);
    assert_eq!(calls.get(), 1);
    assert_eq!(seen_nodes.get(), 6);
}

#[test]
fn should_stay_inert_after_a_failed_load() {
    let mut adapter = SceneGraphAdapter::new();
    adapter.fail("404");
    assert!(matches!(adapter.slot(), AssetSlot::Failed(reason) if reason == "404"));
    assert!(adapter.asset().is_none());
    assert!(adapter.asset_mut().is_none());

    let mut ctx = Context::default();
    adapter.mount(bag_scene(), &mut ctx);
    adapter.fail("late error");
    assert!(adapter.is_ready());
}

#[test]
fn should_refit_active_camera_on_resize() {
    let mut ctx = Context::new(ViewportSize::new(1280, 720));
    let mut adapter = SceneGraphAdapter::new();
    adapter.mount(bag_scene(), &mut ctx);

    ctx.resize(ViewportSize::new(500, 1000), adapter.asset_mut());
    assert_eq!(ctx.viewport, ViewportSize::new(500, 1000));
    assert_eq!(embedded_camera(adapter.asset().expect("mounted")).aspect, 0.5);
    assert_eq!(ctx.default_camera.aspect, 0.5);
}

#[test]
fn should_view_through_the_active_camera() {
    let mut ctx = Context::new(ViewportSize::new(1280, 720));
    let default_uniform = ctx.update_camera_uniform(None);
    assert!(approx(default_uniform.view_position[2], 5.0));
    assert_eq!(default_uniform.view_position[3], 1.0);

    let mut adapter = SceneGraphAdapter::new();
    adapter.mount(bag_scene(), &mut ctx);
    let uniform = ctx.update_camera_uniform(adapter.asset());
    assert!(approx(uniform.view_position[2], 10.0));
    assert_eq!(uniform.view_position[3], 1.0);

    // an embedded camera without its asset falls back to the default camera
    let fallback = ctx.update_camera_uniform(None);
    assert_eq!(fallback, default_uniform);
}
