//! Rendering, shading and recording configuration.

use super::layer::Rgb;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Initial window width (logical pixels)
    pub window_width: u32,

    /// Initial window height (logical pixels)
    pub window_height: u32,

    /// Upper bound on the device pixel ratio used to size the render target
    pub max_pixel_ratio: f64,

    /// Displacement backend
    pub backend: DisplacementBackend,

    /// Background behind the water layers (linear RGBA)
    pub clear_color: [f64; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            max_pixel_ratio: 2.0,
            backend: DisplacementBackend::Gpu,
            clear_color: [10.0 / 255.0, 12.0 / 255.0, 16.0 / 255.0, 1.0], // 0x0a0c10
        }
    }
}

/// Where the per-vertex wave evaluation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplacementBackend {
    /// Evaluated in the vertex shader; the base grid is uploaded once per rebuild
    Gpu,

    /// Evaluated on the CPU every frame (rayon) and streamed into per-layer vertex buffers
    Cpu,
}

/// Fixed constants of the fragment shading
#[derive(Debug, Clone, Copy)]
pub struct ShadingConstants {
    /// `h' = clamp(height * height_scale + height_bias, 0, 1)`
    pub height_scale: f32,
    pub height_bias: f32,

    /// Vignette smoothstep edges on the UV distance from the center
    pub vignette_outer: f32,
    pub vignette_inner: f32,

    /// Brightness multiplier at the fully vignetted edge
    pub vignette_floor: f32,

    /// Foam smoothstep edges on `|dh/du| + |dh/dv|`
    pub foam_low: f32,
    pub foam_high: f32,

    /// Color foam blends toward
    pub foam_color: Rgb,
}

impl Default for ShadingConstants {
    fn default() -> Self {
        Self {
            height_scale: 0.8,
            height_bias: 0.5,
            vignette_outer: 1.15,
            vignette_inner: 0.25,
            vignette_floor: 0.85,
            // Slopes are in UV units: a 20-unit plane turns a 0.16 crest into ~10
            foam_low: 6.0,
            foam_high: 14.0,
            foam_color: Rgb::ONE,
        }
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Fixed clock step between captured frames (seconds)
    pub fn frame_step(&self) -> f32 {
        1.0 / self.fps as f32
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    pub fn frame_path(&self, frame_num: usize) -> String {
        format!("{}/frame_{:05}.png", self.frames_dir(), frame_num)
    }
}
