//! Flat base grid shared by every water layer.

use bytemuck::{Pod, Zeroable};

/// Vertex data for the base grid (plane-space position + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Regular (segments_x + 1) × (segments_y + 1) plane in the XY plane, centered on the origin.
///
/// Built once and never mutated; a new size means a new grid.
#[derive(Debug)]
pub struct SurfaceGrid {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    segments_x: u32,
    segments_y: u32,
    /// Distinguishes successive grids for GPU buffer bookkeeping
    generation: u64,
}

impl SurfaceGrid {
    /// Build a `width` × `height` plane with the given segment counts.
    ///
    /// u runs left → right along +X, v bottom → top along +Y.
    pub fn new(segments_x: u32, segments_y: u32, width: f32, height: f32, generation: u64) -> Self {
        let segments_x = segments_x.max(1);
        let segments_y = segments_y.max(1);
        let columns = segments_x + 1;
        let rows = segments_y + 1;

        let mut vertices = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            let v = row as f32 / segments_y as f32;
            for column in 0..columns {
                let u = column as f32 / segments_x as f32;
                vertices.push(Vertex {
                    position: [(u - 0.5) * width, (v - 0.5) * height, 0.0],
                    uv: [u, v],
                });
            }
        }

        // Counter-clockwise seen from +Z
        let mut indices = Vec::with_capacity((segments_x * segments_y * 6) as usize);
        for row in 0..segments_y {
            for column in 0..segments_x {
                let bottom_left = row * columns + column;
                let bottom_right = bottom_left + 1;
                let top_left = bottom_left + columns;
                let top_right = top_left + 1;

                indices.extend_from_slice(&[
                    bottom_left,
                    bottom_right,
                    top_left,
                    bottom_right,
                    top_right,
                    top_left,
                ]);
            }
        }

        Self {
            vertices,
            indices,
            segments_x,
            segments_y,
            generation,
        }
    }

    pub fn segments(&self) -> (u32, u32) {
        (self.segments_x, self.segments_y)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = SurfaceGrid::new(180, 120, 20.0, 12.0, 1);

        // Check vertex count: (segX + 1) * (segY + 1)
        assert_eq!(grid.vertex_count(), 181 * 121);

        // Check triangle count: segX * segY * 2 triangles * 3 indices
        assert_eq!(grid.indices.len(), 180 * 120 * 6);
        assert_eq!(grid.segments(), (180, 120));
    }

    #[test]
    fn test_grid_corners() {
        let grid = SurfaceGrid::new(4, 2, 20.0, 12.0, 0);
        let first = grid.vertices[0];
        let last = grid.vertices[grid.vertex_count() - 1];

        assert_eq!(first.position, [-10.0, -6.0, 0.0]);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.position, [10.0, 6.0, 0.0]);
        assert_eq!(last.uv, [1.0, 1.0]);
    }

    #[test]
    fn test_uvs_in_unit_square() {
        let grid = SurfaceGrid::new(7, 5, 3.0, 2.0, 0);
        assert!(grid
            .vertices
            .iter()
            .all(|v| (0.0..=1.0).contains(&v.uv[0]) && (0.0..=1.0).contains(&v.uv[1])));
        assert!(grid
            .indices
            .iter()
            .all(|&i| (i as usize) < grid.vertex_count()));
    }
}
