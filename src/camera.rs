//! Camera projection and the uniform handed to the render surface.

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix, Vector3};

/// Perspective projection parameters of a camera.
///
/// The cached matrix only changes through [`PerspectiveCamera::update_projection_matrix`],
/// mirroring how parameters are usually tweaked in batches before recomputing.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub fovy: cgmath::Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fovy: cgmath::Deg<f32>, aspect: f32, znear: f32, zfar: f32) -> Self {
        let mut camera = Self {
            fovy,
            aspect,
            znear,
            zfar,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Aspect ratio of a `width` x `height` viewport; a degenerate size keeps the old value.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
            self.update_projection_matrix();
        }
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }
}

impl From<gltf::camera::Camera<'_>> for PerspectiveCamera {
    /// Orthographic cameras fall back to the default perspective frustum.
    fn from(camera: gltf::camera::Camera<'_>) -> Self {
        match camera.projection() {
            gltf::camera::Projection::Perspective(p) => PerspectiveCamera::new(
                cgmath::Rad(p.yfov()).into(),
                p.aspect_ratio().unwrap_or(1.0),
                p.znear(),
                p.zfar().unwrap_or(DEFAULT_FAR),
            ),
            gltf::camera::Projection::Orthographic(_) => {
                log::warn!(
                    "Camera {:?} is orthographic; using a perspective frustum instead",
                    camera.name()
                );
                PerspectiveCamera::default()
            }
        }
    }
}

const DEFAULT_FAR: f32 = 1000.0;

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(cgmath::Deg(75.0), 1.0, 0.1, DEFAULT_FAR)
    }
}

/// Where the default camera sits before an asset camera takes over.
pub const DEFAULT_EYE: [f32; 3] = [0.0, 0.0, 5.0];

/// The camera matrices a render surface needs, laid out for direct upload.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    /// `world` is the camera's world matrix; the view matrix is its inverse.
    pub fn update_view_proj(&mut self, world: Matrix4<f32>, camera: &PerspectiveCamera) {
        let eye = Point3::from_vec(world.w.truncate());
        self.view_position = eye.to_homogeneous().into();
        let view = world.invert().unwrap_or_else(Matrix4::identity);
        self.view_proj = (camera.projection_matrix() * view).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// World matrix of the default camera: at [`DEFAULT_EYE`] looking at the origin.
pub fn default_camera_world() -> Matrix4<f32> {
    let eye = Point3::from(DEFAULT_EYE);
    Matrix4::look_at_rh(eye, Point3::origin(), Vector3::unit_y())
        .invert()
        .unwrap_or_else(|| Matrix4::from_translation(eye.to_vec()))
}
