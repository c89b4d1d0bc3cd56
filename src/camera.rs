//! Camera and per-layer model transforms for the fixed water rig.

use glam::{Mat4, Vec3};

use crate::params::CameraRig;

/// Perspective camera over the tilted water planes
pub struct CameraSystem {
    rig: CameraRig,
}

impl CameraSystem {
    pub fn new(rig: CameraRig) -> Self {
        Self { rig }
    }

    /// View-projection matrix for a render target aspect ratio (width / height)
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        let proj = Mat4::perspective_rh(
            self.rig.fov_degrees.to_radians(),
            aspect,
            self.rig.near_plane,
            self.rig.far_plane,
        );
        // Camera looks down -Z from its position with +Y up
        let view = Mat4::from_translation(Vec3::from_array(self.rig.position)).inverse();
        proj * view
    }

    /// Model matrix of a layer: tilt the plane about X, then lift it to its offset.
    pub fn layer_model(&self, vertical_offset: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, vertical_offset, 0.0))
            * Mat4::from_rotation_x(self.rig.plane_tilt_rad)
    }
}
