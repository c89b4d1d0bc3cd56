//! Tessellation density and plane extent for the water surface.

use crate::error::ConfigError;

/// Adaptive tessellation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDensity {
    /// Segments per logical pixel (lower = fewer segments)
    pub density: f32,

    /// Horizontal segment clamp (inclusive)
    pub seg_x_min: u32,
    pub seg_x_max: u32,

    /// Vertical segment clamp (inclusive)
    pub seg_y_min: u32,
    pub seg_y_max: u32,

    /// Plane width in world units (maps u ∈ [0, 1])
    pub plane_width: f32,

    /// Plane height in world units (maps v ∈ [0, 1])
    pub plane_height: f32,
}

impl Default for MeshDensity {
    fn default() -> Self {
        Self {
            density: 0.08,
            seg_x_min: 180,
            seg_x_max: 420, // ~127k vertices at the top end
            seg_y_min: 120,
            seg_y_max: 300,
            plane_width: 20.0,
            plane_height: 12.0,
        }
    }
}

impl MeshDensity {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(ConfigError::InvalidDensity(self.density));
        }
        for (axis, min, max) in [
            ('x', self.seg_x_min, self.seg_x_max),
            ('y', self.seg_y_min, self.seg_y_max),
        ] {
            if min == 0 || min > max {
                return Err(ConfigError::InvalidSegmentClamp { axis, min, max });
            }
        }
        Ok(())
    }

    /// Plane extent as (width, height)
    pub fn extent(&self) -> (f32, f32) {
        (self.plane_width, self.plane_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MeshDensity::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_clamp_rejected() {
        let density = MeshDensity {
            seg_y_min: 400,
            seg_y_max: 300,
            ..Default::default()
        };
        assert_eq!(
            density.validate(),
            Err(ConfigError::InvalidSegmentClamp {
                axis: 'y',
                min: 400,
                max: 300
            })
        );
    }

    #[test]
    fn test_zero_density_rejected() {
        let density = MeshDensity {
            density: 0.0,
            ..Default::default()
        };
        assert!(density.validate().is_err());
    }
}
