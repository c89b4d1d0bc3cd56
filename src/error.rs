//! Error types for configuration and rendering.

use thiserror::Error;

/// Invalid tunable values, detected when a wave set, layer or preset is built.
///
/// None of these may reach the render path: a bad wavelength would divide by zero
/// in the wavenumber and a bad direction would normalize to NaN.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("wave {index}: wavelength must be finite and > 0, got {value}")]
    InvalidWavelength { index: usize, value: f32 },

    #[error("wave {index}: direction must be a finite non-zero vector, got ({x}, {y})")]
    ZeroDirection { index: usize, x: f32, y: f32 },

    #[error("wave {index}: base amplitude must be finite and >= 0, got {value}")]
    InvalidAmplitude { index: usize, value: f32 },

    #[error("wave {index}: angular speed must be finite, got {value}")]
    InvalidSpeed { index: usize, value: f32 },

    #[error("steepness must be within [0, 1], got {0}")]
    SteepnessOutOfRange(f32),

    #[error("amplitude gradient scales must be finite, got ({bottom}, {top})")]
    InvalidGradient { bottom: f32, top: f32 },

    #[error("layer '{layer}': {field} must be within [0, 1], got {value}")]
    OutOfUnitRange {
        layer: String,
        field: &'static str,
        value: f32,
    },

    #[error("layer '{layer}': gamma must be finite and > 0, got {value}")]
    InvalidGamma { layer: String, value: f32 },

    #[error("layer '{0}' is already registered")]
    DuplicateLayer(String),

    #[error("mesh density must be finite and > 0, got {0}")]
    InvalidDensity(f32),

    #[error("segment clamp {axis}: min {min} must be >= 1 and <= max {max}")]
    InvalidSegmentClamp { axis: char, min: u32, max: u32 },

    #[error("unknown preset '{0}' (expected hero, rolling or storm)")]
    UnknownPreset(String),
}

/// Failures of the GPU presentation path.
///
/// Adapter/surface failures mean the host cannot show the background at all; callers
/// treat them as "stay dark" rather than as fatal.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create surface: {0}")]
    CreateSurface(String),

    #[error("failed to request device: {0}")]
    RequestDevice(String),

    #[error("layer '{layer}' has {count} waves, GPU displacement supports at most {max}")]
    TooManyWaves {
        layer: String,
        count: usize,
        max: usize,
    },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
