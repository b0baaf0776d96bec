/// Per-frame uniform block and the push-constant model matrix.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// View/projection pair written once per frame into the acquired image's
/// uniform buffer. Layout matches `layout(set = 0, binding = 0)` in
/// `geometry.vert`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UboViewProjection {
    pub projection: Mat4,
    pub view: Mat4,
}

/// Size of the geometry pipeline's push-constant range (one 4x4 matrix)
pub const MODEL_PUSH_CONSTANT_SIZE: u32 = std::mem::size_of::<Mat4>() as u32;

/// Camera parameters used to derive [`UboViewProjection`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub field_of_view_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            field_of_view_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 100.0,
            eye: Vec3::new(0.0, 0.0, 20.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl UboViewProjection {
    /// Build the uniform block for a surface of `width` x `height` pixels.
    ///
    /// Depth is mapped to [0, 1] and Y is flipped for Vulkan clip space.
    pub fn from_camera(camera: &CameraConfig, width: u32, height: u32) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let mut projection = Mat4::perspective_rh(
            camera.field_of_view_degrees.to_radians(),
            aspect,
            camera.near_plane,
            camera.far_plane,
        );
        projection.y_axis.y *= -1.0;

        Self {
            projection,
            view: Mat4::look_at_rh(camera.eye, camera.target, camera.up),
        }
    }
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
