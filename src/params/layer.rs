//! Per-layer shading style and the overrides a layer may apply on top of shared defaults.

use glam::Vec3;

use crate::error::ConfigError;
use crate::params::{ShapingParameters, WaveSet};

/// Linear RGB color with components in [0, 1]
pub type Rgb = Vec3;

/// Decode a `0xRRGGBB` literal.
pub fn rgb_hex(hex: u32) -> Rgb {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Tint toward a background color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogTint {
    /// Background color the layer fades toward
    pub color: Rgb,

    /// Weight of the layer's own color (1 = no fog, 0 = all fog)
    pub mix: f32,
}

/// Shading parameters of one composited surface.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    /// Layer alpha in [0, 1]
    pub opacity: f32,

    /// Color at the wave troughs
    pub color_low: Rgb,

    /// Color at the wave crests
    pub color_high: Rgb,

    /// Exponent on the normalized height before color interpolation (> 0)
    pub gamma: f32,

    /// Foam highlight strength in [0, 1]; 0 disables foam
    pub foam_intensity: f32,

    /// Offset of the layer along world Y (world units)
    pub vertical_offset: f32,

    /// Ascending order = drawn first
    pub draw_order: i32,

    pub fog: Option<FogTint>,
}

impl LayerStyle {
    /// Check every ranged field. `name` only labels the error.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let unit = |field: &'static str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::OutOfUnitRange {
                    layer: name.to_string(),
                    field,
                    value,
                })
            }
        };

        unit("opacity", self.opacity)?;
        unit("foam_intensity", self.foam_intensity)?;
        if let Some(fog) = &self.fog {
            unit("fog mix", fog.mix)?;
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(ConfigError::InvalidGamma {
                layer: name.to_string(),
                value: self.gamma,
            });
        }
        Ok(())
    }

    /// Opacity clamped to [0, 1]
    pub fn alpha(&self) -> f32 {
        self.opacity.clamp(0.0, 1.0)
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            opacity: 0.95,
            color_low: rgb_hex(0xa78bfa),  // Violet troughs
            color_high: rgb_hex(0x6ee7ff), // Cyan crests
            gamma: 1.0,
            foam_intensity: 0.0,
            vertical_offset: -0.82,
            draw_order: 1,
            fog: Some(FogTint {
                color: rgb_hex(0x0a0c10),
                mix: 0.85,
            }),
        }
    }
}

/// What a single layer changes relative to the shared defaults.
///
/// Resolved once when the layer is added to the compositor; never re-merged per frame.
#[derive(Debug, Clone, Default)]
pub struct LayerOverrides {
    pub opacity: Option<f32>,
    pub color_low: Option<Rgb>,
    pub color_high: Option<Rgb>,
    pub gamma: Option<f32>,
    pub foam_intensity: Option<f32>,
    pub vertical_offset: Option<f32>,
    pub draw_order: Option<i32>,
    /// Fog mix; keeps the default fog color
    pub fog_mix: Option<f32>,
    /// Some(None) disables fog for this layer
    pub fog: Option<Option<FogTint>>,
    pub waves: Option<WaveSet>,
    pub shaping: Option<ShapingParameters>,
}

impl LayerOverrides {
    /// Overlay these overrides on `base`.
    pub fn apply(&self, base: &LayerStyle) -> LayerStyle {
        let mut style = base.clone();
        if let Some(opacity) = self.opacity {
            style.opacity = opacity;
        }
        if let Some(color) = self.color_low {
            style.color_low = color;
        }
        if let Some(color) = self.color_high {
            style.color_high = color;
        }
        if let Some(gamma) = self.gamma {
            style.gamma = gamma;
        }
        if let Some(foam) = self.foam_intensity {
            style.foam_intensity = foam;
        }
        if let Some(offset) = self.vertical_offset {
            style.vertical_offset = offset;
        }
        if let Some(order) = self.draw_order {
            style.draw_order = order;
        }
        if let Some(fog) = self.fog {
            style.fog = fog;
        }
        if let (Some(mix), Some(fog)) = (self.fog_mix, style.fog.as_mut()) {
            fog.mix = mix;
        }
        style
    }
}
