//! Named visual presets bundling waves, shaping, layer styles and tessellation.

use std::str::FromStr;

use super::layer::{LayerOverrides, LayerStyle};
use super::mesh::MeshDensity;
use super::waves::{AmplitudeGradient, ShapingParameters, WaveSet};
use crate::error::ConfigError;

/// Complete, validated configuration of one water look.
///
/// Never mutated while running; switching looks means building another preset.
#[derive(Debug, Clone)]
pub struct WaterPreset {
    pub name: &'static str,

    /// Waves shared by every layer unless a layer overrides them
    pub waves: WaveSet,

    /// Shaping shared by every layer unless a layer overrides it
    pub shaping: ShapingParameters,

    /// Style each layer starts from
    pub base_style: LayerStyle,

    /// Layers as (name, overrides), in declaration order
    pub layers: Vec<(String, LayerOverrides)>,

    pub mesh: MeshDensity,
}

/// Preset selector used by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    /// Original hero tuning: near-zero steepness, pure heightfield look
    Hero,

    /// Same waves with real Gerstner steepness
    Rolling,

    /// Six waves, stronger gradient and foam on the clear layer
    Storm,
}

impl FromStr for PresetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hero" => Ok(Self::Hero),
            "rolling" => Ok(Self::Rolling),
            "storm" => Ok(Self::Storm),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

impl WaterPreset {
    pub fn build(kind: PresetKind) -> Result<Self, ConfigError> {
        match kind {
            PresetKind::Hero => Self::hero(),
            PresetKind::Rolling => Self::rolling(),
            PresetKind::Storm => Self::storm(),
        }
    }

    /// The tuned hero look: a clear layer over a lower, foggier one.
    pub fn hero() -> Result<Self, ConfigError> {
        Ok(Self {
            name: "hero",
            waves: hero_waves()?,
            shaping: ShapingParameters::default(),
            base_style: LayerStyle::default(),
            layers: two_layers(),
            mesh: MeshDensity::default(),
        })
    }

    pub fn rolling() -> Result<Self, ConfigError> {
        Ok(Self {
            name: "rolling",
            waves: hero_waves()?,
            shaping: ShapingParameters::new(
                0.6,
                AmplitudeGradient {
                    bottom_scale: 0.5,
                    top_scale: 3.0,
                },
            )?,
            base_style: LayerStyle::default(),
            layers: two_layers(),
            mesh: MeshDensity::default(),
        })
    }

    pub fn storm() -> Result<Self, ConfigError> {
        let waves = WaveSet::from_components(&[
            ([1.0, 0.2], 6.8, 0.012, 0.90),
            ([0.6, 1.0], 2.3, 0.045, 0.76),
            ([0.3, -1.0], 3.0, 0.060, 0.64),
            ([-0.8, 0.5], 1.4, 0.018, 1.30),
            ([0.1, 1.0], 4.6, 0.030, -0.55),
            ([-1.0, -0.3], 0.9, 0.008, 1.85),
        ])?;
        let mut layers = two_layers();
        if let Some((_, clear)) = layers.iter_mut().find(|(name, _)| name == "clear") {
            clear.foam_intensity = Some(0.35);
            clear.gamma = Some(1.4);
        }
        Ok(Self {
            name: "storm",
            waves,
            shaping: ShapingParameters::new(
                0.35,
                AmplitudeGradient {
                    bottom_scale: 0.7,
                    top_scale: 3.6,
                },
            )?,
            base_style: LayerStyle::default(),
            layers,
            mesh: MeshDensity::default(),
        })
    }

    /// Copy with every shared and per-layer steepness replaced.
    pub fn with_steepness(mut self, steepness: f32) -> Result<Self, ConfigError> {
        self.shaping = self.shaping.with_steepness(steepness)?;
        for (_, overrides) in &mut self.layers {
            if let Some(shaping) = overrides.shaping {
                overrides.shaping = Some(shaping.with_steepness(steepness)?);
            }
        }
        Ok(self)
    }
}

fn hero_waves() -> Result<WaveSet, ConfigError> {
    WaveSet::from_components(&[
        // (direction, wavelength, base amplitude, angular speed)
        ([1.0, 0.2], 6.8, 0.008, 0.90),
        ([0.6, 1.0], 2.3, 0.040, 0.76),
        ([0.3, -1.0], 3.0, 0.055, 0.64),
    ])
}

fn two_layers() -> Vec<(String, LayerOverrides)> {
    vec![
        (
            "clear".to_string(),
            LayerOverrides {
                opacity: Some(0.95),
                fog_mix: Some(0.85),
                vertical_offset: Some(-0.82),
                draw_order: Some(1),
                ..Default::default()
            },
        ),
        (
            // Slightly lower so the two sheets separate visually
            "foggy".to_string(),
            LayerOverrides {
                opacity: Some(0.35),
                fog_mix: Some(0.65),
                vertical_offset: Some(-0.86),
                draw_order: Some(0),
                ..Default::default()
            },
        ),
    ]
}
