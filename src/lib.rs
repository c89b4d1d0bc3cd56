//! Wavebed library - layered Gerstner water background

pub mod camera;
pub mod cli;
pub mod compositor;
pub mod error;
pub mod lifecycle;
pub mod params;
pub mod rendering;
pub mod shading;
pub mod surface;
pub mod waves;
