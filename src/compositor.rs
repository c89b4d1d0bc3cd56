//! Layer compositor: independently styled water sheets sharing one grid and one clock.

use std::sync::Arc;

use crate::error::{ConfigError, RenderError};
use crate::params::{LayerOverrides, LayerStyle, ShapingParameters, WaterPreset, WaveSet};
use crate::surface::SurfaceGrid;

/// One composited surface with its resolved parameters
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    style: LayerStyle,
    waves: WaveSet,
    shaping: ShapingParameters,
    grid: Arc<SurfaceGrid>,
}

impl Layer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    pub fn waves(&self) -> &WaveSet {
        &self.waves
    }

    pub fn shaping(&self) -> &ShapingParameters {
        &self.shaping
    }

    pub fn grid(&self) -> &Arc<SurfaceGrid> {
        &self.grid
    }
}

/// Everything a renderer needs to draw one composited frame
#[derive(Debug)]
pub struct Frame<'a> {
    /// Clock snapshot shared by every layer
    pub time_s: f32,

    /// Layers in draw order (first = bottom)
    pub layers: &'a [Layer],

    /// The grid every layer is bound to
    pub grid: &'a Arc<SurfaceGrid>,
}

/// Presentation backend the compositor and lifecycle drive.
///
/// Implemented by the wgpu `RenderSystem`; tests substitute recording fakes.
pub trait FrameRenderer {
    /// Install buffers for `grid`, releasing the previous grid's buffers first.
    fn bind_grid(&mut self, grid: &Arc<SurfaceGrid>);

    /// Resize the render target (physical pixels).
    fn resize_target(&mut self, width: u32, height: u32);

    /// Draw and present one frame.
    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;

    /// Free every GPU resource. Called once at teardown.
    fn release(&mut self);
}

/// Ordered set of layers bound to the shared grid
#[derive(Debug)]
pub struct Compositor {
    /// Sorted by ascending draw order, ties in insertion order
    layers: Vec<Layer>,
    grid: Arc<SurfaceGrid>,
}

impl Compositor {
    pub fn new(grid: Arc<SurfaceGrid>) -> Self {
        Self {
            layers: Vec::new(),
            grid,
        }
    }

    /// Build every layer a preset declares.
    pub fn from_preset(preset: &WaterPreset, grid: Arc<SurfaceGrid>) -> Result<Self, ConfigError> {
        let mut compositor = Self::new(grid);
        for (name, overrides) in &preset.layers {
            compositor.add_layer(name, preset, overrides)?;
        }
        Ok(compositor)
    }

    /// Resolve `overrides` on top of the preset's shared defaults and insert the layer.
    ///
    /// The resolved snapshot is owned by the layer; later changes to other layers or
    /// to the preset never reach it.
    pub fn add_layer(
        &mut self,
        name: &str,
        defaults: &WaterPreset,
        overrides: &LayerOverrides,
    ) -> Result<(), ConfigError> {
        if self.layers.iter().any(|layer| layer.name == name) {
            return Err(ConfigError::DuplicateLayer(name.to_string()));
        }

        let style = overrides.apply(&defaults.base_style);
        style.validate(name)?;

        let layer = Layer {
            name: name.to_string(),
            style,
            waves: overrides
                .waves
                .clone()
                .unwrap_or_else(|| defaults.waves.clone()),
            shaping: overrides.shaping.unwrap_or(defaults.shaping),
            grid: Arc::clone(&self.grid),
        };

        let position = self
            .layers
            .iter()
            .position(|existing| existing.style.draw_order > layer.style.draw_order)
            .unwrap_or(self.layers.len());
        log::debug!(
            "Added layer '{}' (draw order {}, {} waves)",
            layer.name,
            layer.style.draw_order,
            layer.waves.len()
        );
        self.layers.insert(position, layer);
        Ok(())
    }

    /// Remove a layer by name; returns whether it existed.
    pub fn remove_layer(&mut self, name: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.name != name);
        before != self.layers.len()
    }

    /// Point every layer at `grid` in one step.
    pub fn rebind(&mut self, grid: Arc<SurfaceGrid>) {
        for layer in &mut self.layers {
            layer.grid = Arc::clone(&grid);
        }
        log::debug!(
            "Rebound {} layers to grid #{}",
            self.layers.len(),
            grid.generation()
        );
        self.grid = grid;
    }

    pub fn grid(&self) -> &Arc<SurfaceGrid> {
        &self.grid
    }

    /// Layers in draw order (first = drawn first = visually beneath)
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Hand the current layers and clock snapshot to the renderer.
    pub fn render_frame<R: FrameRenderer + ?Sized>(
        &self,
        time_s: f32,
        renderer: &mut R,
    ) -> Result<(), RenderError> {
        debug_assert!(self
            .layers
            .iter()
            .all(|layer| Arc::ptr_eq(&layer.grid, &self.grid)));

        renderer.draw(&Frame {
            time_s,
            layers: &self.layers,
            grid: &self.grid,
        })
    }
}
