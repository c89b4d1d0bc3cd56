//! Fixed camera rig looking down onto the tilted water planes.

/// Stationary perspective camera
#[derive(Debug, Clone)]
pub struct CameraRig {
    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Eye position; the camera looks down -Z with +Y up
    pub position: [f32; 3],

    /// Rotation of every water plane about X (radians, negative tips the top away)
    pub plane_tilt_rad: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            fov_degrees: 55.0,
            near_plane: 0.1,
            far_plane: 100.0,
            position: [0.0, 1.2, 2.2],
            plane_tilt_rad: -0.9,
        }
    }
}
