//! Base surface tessellation: the shared grid and the builder that sizes it to the viewport.

mod builder;
mod grid;

// Re-export public types
pub use builder::{segments_for, MeshBuilder};
pub use grid::{SurfaceGrid, Vertex};
