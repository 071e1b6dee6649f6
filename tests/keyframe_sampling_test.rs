use cgmath::{Quaternion, Rotation3, Vector3};
use configurator_ngin::{
    animation::track::{AnimationTrack, LoopMode},
    data_structures::{
        instance::Instance,
        scene_graph::{AnimationClip, Channel, NodeHandle, NodeKind, SceneGraph, SceneNode},
    },
    resources::animation::{Interpolation, Keyframes, Sample},
};

fn translation(sample: Option<Sample>) -> Vector3<f32> {
    match sample {
        Some(Sample::Translation(v)) => v,
        other => panic!("expected a translation, got {:?}", other),
    }
}

fn line() -> Keyframes {
    Keyframes::Translation(vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 4.0, 0.0)])
}

#[test]
fn should_interpolate_linearly_and_hold_ends() {
    let times = [0.0, 2.0];
    let keys = line();
    assert_eq!(translation(keys.sample(&times, Interpolation::Linear, 0.5)).y, 1.0);
    assert_eq!(translation(keys.sample(&times, Interpolation::Linear, -1.0)).y, 0.0);
    assert_eq!(translation(keys.sample(&times, Interpolation::Linear, 9.0)).y, 4.0);
    assert_eq!(translation(keys.sample(&times, Interpolation::Linear, f32::NAN)).y, 0.0);
}

#[test]
fn should_hold_previous_key_when_stepping() {
    let keys = line();
    assert_eq!(translation(keys.sample(&[0.0, 2.0], Interpolation::Step, 1.99)).y, 0.0);
    assert_eq!(translation(keys.sample(&[0.0, 2.0], Interpolation::Step, 2.0)).y, 4.0);
}

#[test]
fn should_pass_through_cubic_keys() {
    // [in_tangent, value, out_tangent] per key, flat tangents
    let zero = Vector3::new(0.0, 0.0, 0.0);
    let keys = Keyframes::Translation(vec![
        zero,
        zero,
        zero,
        zero,
        Vector3::new(0.0, 4.0, 0.0),
        zero,
    ]);
    let times = [0.0, 2.0];
    assert_eq!(translation(keys.sample(&times, Interpolation::CubicSpline, 0.0)).y, 0.0);
    assert_eq!(translation(keys.sample(&times, Interpolation::CubicSpline, 2.0)).y, 4.0);
    let halfway = translation(keys.sample(&times, Interpolation::CubicSpline, 1.0)).y;
    assert!((halfway - 2.0).abs() < 1e-5);
    let early = translation(keys.sample(&times, Interpolation::CubicSpline, 0.5)).y;
    assert!(early < 1.0);
}

#[test]
fn should_slerp_rotations() {
    let keys = Keyframes::Rotation(vec![
        Quaternion::from_angle_y(cgmath::Deg(0.0)),
        Quaternion::from_angle_y(cgmath::Deg(90.0)),
    ]);
    let expected = Quaternion::from_angle_y(cgmath::Deg(45.0));
    match keys.sample(&[0.0, 1.0], Interpolation::Linear, 0.5) {
        Some(Sample::Rotation(q)) => {
            assert!((q.s - expected.s).abs() < 1e-5);
            assert!((q.v.y - expected.v.y).abs() < 1e-5);
        }
        other => panic!("expected a rotation, got {:?}", other),
    }
}

#[test]
fn should_skip_unsupported_and_empty_channels() {
    assert_eq!(Keyframes::Other.sample(&[0.0, 1.0], Interpolation::Linear, 0.5), None);
    assert_eq!(
        Keyframes::Translation(Vec::new()).sample(&[], Interpolation::Linear, 0.5),
        None
    );
}

fn bone_track() -> (AnimationTrack, SceneGraph, NodeHandle) {
    let mut graph = SceneGraph::new();
    let target = graph.add_node(None, SceneNode::new("Bone", NodeKind::Bone, Instance::default()));
    let clip = AnimationClip {
        name: "Action".to_string(),
        channels: vec![Channel {
            target,
            keyframes: line(),
            timestamps: vec![0.0, 2.0],
            interpolation: Interpolation::Linear,
        }],
    };
    (AnimationTrack::new(clip), graph, target)
}

#[test]
fn should_clamp_or_wrap_the_cursor() {
    let (mut track, _, _) = bone_track();
    assert_eq!(track.duration(), 2.0);
    track.set_loop(LoopMode::Once).set_time(5.0);
    assert_eq!(track.time(), 2.0);
    track.set_time(-1.0);
    assert_eq!(track.time(), 0.0);
    track.set_loop(LoopMode::Repeat).set_time(5.0);
    assert_eq!(track.time(), 1.0);
}

#[test]
fn should_only_advance_while_playing() {
    let (mut track, _, _) = bone_track();
    track.advance(0.5);
    assert_eq!(track.time(), 0.0);

    track.set_loop(LoopMode::Once).set_clamp_when_finished(true).play();
    track.advance(0.5).advance(5.0);
    assert_eq!(track.time(), 2.0);
    assert!(track.is_enabled());

    let (mut unclamped, _, _) = bone_track();
    unclamped.set_loop(LoopMode::Once).play();
    unclamped.advance(5.0);
    assert!(!unclamped.is_enabled());
}

#[test]
fn should_pose_targets_at_the_cursor() {
    let (mut track, mut graph, target) = bone_track();
    track.set_loop(LoopMode::Once).set_time(1.0);
    track.apply(&mut graph);
    assert_eq!(graph.node(target).expect("target").local.position.y, 2.0);

    track.set_enabled(false).set_time(2.0);
    track.apply(&mut graph);
    assert_eq!(graph.node(target).expect("target").local.position.y, 2.0);
}
