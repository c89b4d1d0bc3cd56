//! Parameter definitions with units and documented semantics.
//!
//! Every tuned constant of the water look lives here:
//! - Units and ranges documented per field
//! - Validation at construction, so nothing out of range reaches rendering
//! - Named presets bundling a complete look

mod camera;
mod layer;
mod mesh;
mod preset;
mod render;
mod waves;

// Re-export all types
pub use camera::CameraRig;
pub use layer::{rgb_hex, FogTint, LayerOverrides, LayerStyle, Rgb};
pub use mesh::MeshDensity;
pub use preset::{PresetKind, WaterPreset};
pub use render::{DisplacementBackend, RecordingConfig, RenderConfig, ShadingConstants};
pub use waves::{AmplitudeGradient, ShapingParameters, WaveDescriptor, WaveSet};
