//! Local node transforms.
//!
//! Every scene node carries one `Instance`: position, rotation and scale
//! relative to its parent. Animation tracks and the parametric controller
//! write into these; world matrices are derived on demand.

use cgmath::{Matrix, One, SquareMatrix};

/// Local transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// glTF stores node transforms decomposed as `(translation, [x, y, z, w], scale)`.
impl From<([f32; 3], [f32; 4], [f32; 3])> for Instance {
    fn from((position, rotation, scale): ([f32; 3], [f32; 4], [f32; 3])) -> Self {
        Instance {
            position: position.into(),
            rotation: rotation.into(),
            scale: scale.into(),
        }
    }
}

/**
 * The raw instance is what a render surface uploads per visible mesh: the world matrix
 * plus the normal matrix and the handedness of the transform (mirrored scales flip winding).
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub handedness: f32,
}

impl InstanceRaw {
    pub fn from_world(world: cgmath::Matrix4<f32>) -> Self {
        let det = world.determinant();
        let normal = cgmath::Matrix3::from_cols(
            world.x.truncate(),
            world.y.truncate(),
            world.z.truncate(),
        );
        // inverse-transpose keeps normals perpendicular under non-uniform scale
        let normal = normal
            .invert()
            .map(|inv| inv.transpose())
            .unwrap_or(normal);
        InstanceRaw {
            model: world.into(),
            normal: normal.into(),
            handedness: det.signum(),
        }
    }
}
