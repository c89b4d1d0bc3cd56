//! Adaptive tessellation: viewport size → segment counts → base grid.

use std::sync::Arc;

use super::grid::SurfaceGrid;
use crate::error::ConfigError;
use crate::params::MeshDensity;

/// Segment counts for a viewport of `width` × `height` logical pixels.
///
/// `round(size * density)` clamped per axis, so vertex count stays bounded on any display.
pub fn segments_for(width: f32, height: f32, density: &MeshDensity) -> (u32, u32) {
    let axis = |size: f32, min: u32, max: u32| {
        let raw = (size.max(0.0) * density.density).round();
        (raw as u32).clamp(min, max)
    };
    (
        axis(width, density.seg_x_min, density.seg_x_max),
        axis(height, density.seg_y_min, density.seg_y_max),
    )
}

/// Owns the single live base grid and replaces it when the viewport needs a different one.
#[derive(Debug)]
pub struct MeshBuilder {
    density: MeshDensity,
    current: Option<Arc<SurfaceGrid>>,
    next_generation: u64,
    builds: u64,
    releases: u64,
}

impl MeshBuilder {
    pub fn new(density: MeshDensity) -> Result<Self, ConfigError> {
        density.validate()?;
        Ok(Self {
            density,
            current: None,
            next_generation: 1,
            builds: 0,
            releases: 0,
        })
    }

    pub fn density(&self) -> &MeshDensity {
        &self.density
    }

    pub fn current(&self) -> Option<&Arc<SurfaceGrid>> {
        self.current.as_ref()
    }

    /// Grids built so far
    pub fn builds(&self) -> u64 {
        self.builds
    }

    /// Grids released so far (replacements plus teardown)
    pub fn releases(&self) -> u64 {
        self.releases
    }

    /// React to a viewport size.
    ///
    /// Returns the new grid when the computed segment counts changed, `None` when the
    /// current grid still fits (identity preserved) or the viewport is empty.
    pub fn resize(&mut self, width: f32, height: f32) -> Option<Arc<SurfaceGrid>> {
        if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
            return None;
        }

        let (seg_x, seg_y) = segments_for(width, height, &self.density);
        if let Some(grid) = &self.current {
            if grid.segments() == (seg_x, seg_y) {
                return None;
            }
        }

        // Old grid goes before the new one is built
        self.release();

        let grid = Arc::new(SurfaceGrid::new(
            seg_x,
            seg_y,
            self.density.plane_width,
            self.density.plane_height,
            self.next_generation,
        ));
        self.next_generation += 1;
        self.builds += 1;
        log::info!(
            "Built surface grid #{}: {}x{} segments, {} vertices",
            grid.generation(),
            seg_x,
            seg_y,
            grid.vertex_count()
        );

        self.current = Some(Arc::clone(&grid));
        Some(grid)
    }

    /// Drop the current grid, if any.
    pub fn release(&mut self) {
        if let Some(grid) = self.current.take() {
            log::debug!("Released surface grid #{}", grid.generation());
            self.releases += 1;
        }
    }
}
