//! Command-line argument parsing.

use clap::Parser;

use crate::error::ConfigError;
use crate::params::{DisplacementBackend, PresetKind, RecordingConfig, RenderConfig, WaterPreset};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Wavebed")]
#[command(about = "Animated layered Gerstner water background", long_about = None)]
pub struct Args {
    /// Water preset: hero (default), rolling, storm
    #[arg(long, value_name = "PRESET", default_value = "hero")]
    pub preset: String,

    /// Override the preset's Gerstner steepness (0..=1)
    #[arg(long, value_name = "Q")]
    pub steepness: Option<f32>,

    /// Displacement backend: gpu (default) or cpu
    #[arg(long, value_name = "BACKEND", default_value = "gpu")]
    pub backend: String,

    /// Record frames to disk (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Window width (logical pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// Window height (logical pixels)
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,

    /// Start with reduced motion (static frame, toggle with M)
    #[arg(long, conflicts_with = "record")]
    pub reduced_motion: bool,
}

impl Args {
    /// Build the selected preset with the optional steepness override applied
    pub fn build_preset(&self) -> Result<WaterPreset, ConfigError> {
        let kind: PresetKind = self.preset.parse()?;
        let preset = WaterPreset::build(kind)?;
        match self.steepness {
            Some(steepness) => preset.with_steepness(steepness),
            None => Ok(preset),
        }
    }

    /// Parse displacement backend from command-line arguments
    pub fn parse_backend(&self) -> DisplacementBackend {
        match self.backend.to_lowercase().as_str() {
            "gpu" => DisplacementBackend::Gpu,
            "cpu" => DisplacementBackend::Cpu,
            other => {
                log::warn!("Unknown backend '{}', using gpu", other);
                DisplacementBackend::Gpu
            }
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            backend: self.parse_backend(),
            ..Default::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> std::io::Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(duration);

        // Create output directories
        std::fs::create_dir_all(config.frames_dir())?;
        Ok(Some(config))
    }
}
