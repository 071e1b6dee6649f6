use cgmath::InnerSpace;

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    /// Outputs are stored as `[in_tangent, value, out_tangent]` triplets.
    CubicSpline,
}

impl From<gltf::animation::Interpolation> for Interpolation {
    fn from(interpolation: gltf::animation::Interpolation) -> Self {
        match interpolation {
            gltf::animation::Interpolation::Linear => Self::Linear,
            gltf::animation::Interpolation::Step => Self::Step,
            gltf::animation::Interpolation::CubicSpline => Self::CubicSpline,
        }
    }
}

/// A sampled value of one channel at one point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    Translation(cgmath::Vector3<f32>),
    Rotation(cgmath::Quaternion<f32>),
    Scale(cgmath::Vector3<f32>),
}

/// Where `time` falls between two keyframes: indices and the blend factor.
fn locate(timestamps: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    let last = timestamps.len().checked_sub(1)?;
    // also catches NaN
    if !(time > timestamps[0]) {
        return Some((0, 0, 0.0));
    }
    if time >= timestamps[last] {
        return Some((last, last, 0.0));
    }
    // first keyframe strictly after `time`
    let next = timestamps.partition_point(|&t| t <= time);
    let prev = next - 1;
    let span = timestamps[next] - timestamps[prev];
    let factor = if span > 0.0 {
        (time - timestamps[prev]) / span
    } else {
        0.0
    };
    Some((prev, next, factor))
}

fn value_at<T: Copy>(values: &[T], interpolation: Interpolation, keyframe: usize) -> Option<T> {
    match interpolation {
        Interpolation::CubicSpline => values.get(keyframe * 3 + 1).copied(),
        _ => values.get(keyframe).copied(),
    }
}

fn hermite(
    p0: cgmath::Vector3<f32>,
    m0: cgmath::Vector3<f32>,
    p1: cgmath::Vector3<f32>,
    m1: cgmath::Vector3<f32>,
    t: f32,
) -> cgmath::Vector3<f32> {
    let t2 = t * t;
    let t3 = t2 * t;
    p0 * (2.0 * t3 - 3.0 * t2 + 1.0)
        + m0 * (t3 - 2.0 * t2 + t)
        + p1 * (-2.0 * t3 + 3.0 * t2)
        + m1 * (t3 - t2)
}

fn sample_vector(
    values: &[cgmath::Vector3<f32>],
    timestamps: &[f32],
    interpolation: Interpolation,
    time: f32,
) -> Option<cgmath::Vector3<f32>> {
    let (prev, next, factor) = locate(timestamps, time)?;
    let a = value_at(values, interpolation, prev)?;
    let b = value_at(values, interpolation, next)?;
    match interpolation {
        Interpolation::Step => Some(a),
        Interpolation::Linear => Some(a + (b - a) * factor),
        Interpolation::CubicSpline => {
            if prev == next {
                return Some(a);
            }
            let span = timestamps[next] - timestamps[prev];
            let out_tangent = values.get(prev * 3 + 2).copied()? * span;
            let in_tangent = values.get(next * 3).copied()? * span;
            Some(hermite(a, out_tangent, b, in_tangent, factor))
        }
    }
}

fn sample_rotation(
    values: &[cgmath::Quaternion<f32>],
    timestamps: &[f32],
    interpolation: Interpolation,
    time: f32,
) -> Option<cgmath::Quaternion<f32>> {
    let (prev, next, factor) = locate(timestamps, time)?;
    let a = value_at(values, interpolation, prev)?;
    let b = value_at(values, interpolation, next)?;
    match interpolation {
        Interpolation::Step => Some(a),
        // TODO: hermite interpolation for cubic rotations, these fall back to slerp
        Interpolation::Linear | Interpolation::CubicSpline => {
            if prev == next {
                return Some(a);
            }
            Some(a.slerp(b, factor).normalize())
        }
    }
}

impl Keyframes {
    /// Sample the keyframes at `time`. `None` for unsupported (morph) channels or empty tracks.
    pub fn sample(
        &self,
        timestamps: &[f32],
        interpolation: Interpolation,
        time: f32,
    ) -> Option<Sample> {
        match self {
            Keyframes::Translation(values) => {
                sample_vector(values, timestamps, interpolation, time).map(Sample::Translation)
            }
            Keyframes::Rotation(values) => {
                sample_rotation(values, timestamps, interpolation, time).map(Sample::Rotation)
            }
            Keyframes::Scale(values) => {
                sample_vector(values, timestamps, interpolation, time).map(Sample::Scale)
            }
            Keyframes::Other => None,
        }
    }
}
