//! Gerstner displacement evaluator.
//!
//! CPU reference of the per-vertex wave math. `water.wgsl` mirrors `displace` and
//! `height_gradient_uv` line for line in f32, so both backends agree up to rounding.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rayon::prelude::*;

use crate::params::{ShapingParameters, WaveSet};
use crate::surface::SurfaceGrid;

/// Most waves the GPU uniform block can carry
pub const MAX_GPU_WAVES: usize = 8;

/// Displaced point plus the scalar used for shading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub position: Vec3,
    pub height: f32,
}

/// Displace one base point.
///
/// Every wave's phase uses the original horizontal position, so the waves are summed
/// independently and their order does not matter.
///
/// # Arguments
/// * `point` - Base point in plane space (z is "up" before the plane is tilted)
/// * `v` - Normalized vertical texture coordinate, drives the amplitude gradient
/// * `time_s` - Clock value in seconds
pub fn displace(
    point: Vec3,
    v: f32,
    time_s: f32,
    waves: &WaveSet,
    shaping: &ShapingParameters,
) -> Displacement {
    let steepness = shaping.steepness();
    let amp_scale = shaping.amplitude_gradient.scale_at(v);

    let mut offset = Vec3::ZERO;
    for wave in waves {
        let d = wave.direction().normalize();
        let k = TAU / wave.wavelength();
        let phase = k * (d.x * point.x + d.y * point.y) - wave.angular_speed() * time_s;
        let a = wave.base_amplitude() * amp_scale;
        let (sin, cos) = phase.sin_cos();

        offset.x += d.x * a * steepness * cos;
        offset.y += d.y * a * steepness * cos;
        offset.z += a * sin;
    }

    let position = point + offset;
    Displacement {
        position,
        height: position.z,
    }
}

/// Analytic `(∂height/∂u, ∂height/∂v)` at a base point.
///
/// `extent` is the plane size that maps UV to plane space (x spans `extent.0` as u
/// goes 0 → 1, y spans `extent.1` as v does). The v derivative includes the amplitude
/// gradient term.
pub fn height_gradient_uv(
    point: Vec3,
    v: f32,
    time_s: f32,
    waves: &WaveSet,
    shaping: &ShapingParameters,
    extent: (f32, f32),
) -> Vec2 {
    let gradient = shaping.amplitude_gradient;
    let amp_scale = gradient.scale_at(v);
    let amp_scale_dv = gradient.top_scale - gradient.bottom_scale;

    let mut dh = Vec2::ZERO;
    for wave in waves {
        let d = wave.direction().normalize();
        let k = TAU / wave.wavelength();
        let phase = k * (d.x * point.x + d.y * point.y) - wave.angular_speed() * time_s;
        let a = wave.base_amplitude() * amp_scale;
        let (sin, cos) = phase.sin_cos();

        dh.x += a * cos * k * d.x * extent.0;
        dh.y += wave.base_amplitude() * amp_scale_dv * sin + a * cos * k * d.y * extent.1;
    }
    dh
}

/// Vertex streamed to the GPU by the CPU backend
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DisplacedVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub height: f32,
    /// `|∂h/∂u| + |∂h/∂v|`, drives foam
    pub slope: f32,
}

/// Evaluate every vertex of `grid` in parallel.
///
/// Reads the grid immutably and writes a fresh buffer, so vertices are independent.
pub fn displace_grid(
    grid: &SurfaceGrid,
    time_s: f32,
    waves: &WaveSet,
    shaping: &ShapingParameters,
    extent: (f32, f32),
) -> Vec<DisplacedVertex> {
    grid.vertices
        .par_iter()
        .map(|vertex| {
            let base = Vec3::from_array(vertex.position);
            let v = vertex.uv[1];
            let displaced = displace(base, v, time_s, waves, shaping);
            let dh = height_gradient_uv(base, v, time_s, waves, shaping, extent);
            DisplacedVertex {
                position: displaced.position.to_array(),
                uv: vertex.uv,
                height: displaced.height,
                slope: dh.x.abs() + dh.y.abs(),
            }
        })
        .collect()
}

/// One wave in the GPU uniform layout (32 bytes, 16-byte aligned array stride)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct WaveUniform {
    pub direction: [f32; 2],
    pub wavelength: f32,
    pub amplitude: f32,
    pub angular_speed: f32,
    pub _padding: [f32; 3],
}

/// Pack a wave set for the shader.
///
/// Returns `None` when the set does not fit in `MAX_GPU_WAVES`; unused slots stay zeroed
/// and are skipped by the shader's wave count.
pub fn pack_waves(waves: &WaveSet) -> Option<([WaveUniform; MAX_GPU_WAVES], u32)> {
    if waves.len() > MAX_GPU_WAVES {
        return None;
    }
    let mut packed = [WaveUniform::default(); MAX_GPU_WAVES];
    for (slot, wave) in packed.iter_mut().zip(waves) {
        *slot = WaveUniform {
            direction: wave.direction().to_array(),
            wavelength: wave.wavelength(),
            amplitude: wave.base_amplitude(),
            angular_speed: wave.angular_speed(),
            _padding: [0.0; 3],
        };
    }
    Some((packed, waves.len() as u32))
}
