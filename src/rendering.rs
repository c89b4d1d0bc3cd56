//! Rendering system with wgpu pipeline and per-layer uniforms.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::camera::CameraSystem;
use crate::compositor::{Frame, FrameRenderer, Layer};
use crate::error::RenderError;
use crate::params::{
    CameraRig, DisplacementBackend, RecordingConfig, RenderConfig, ShadingConstants,
};
use crate::surface::{SurfaceGrid, Vertex};
use crate::waves::{displace_grid, pack_waves, DisplacedVertex, WaveUniform, MAX_GPU_WAVES};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform block of one water layer (matches `Layer` in water.wgsl)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LayerUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// rgb + opacity
    pub color_low: [f32; 4],
    /// rgb + gamma
    pub color_high: [f32; 4],
    /// rgb + fog mix (1 = no fog)
    pub fog_color: [f32; 4],
    /// intensity, smoothstep low, smoothstep high, unused
    pub foam: [f32; 4],
    pub foam_color: [f32; 4],
    /// height scale, height bias, vignette outer, vignette inner
    pub shading: [f32; 4],
    /// steepness, amplitude bottom, amplitude top, time
    pub shaping: [f32; 4],
    /// plane width, plane height, vignette floor, wave count
    pub plane: [f32; 4],
    pub waves: [WaveUniform; MAX_GPU_WAVES],
}

impl LayerUniforms {
    /// Flatten a layer's resolved parameters for the shader.
    ///
    /// With `with_waves = false` (CPU backend) the wave block stays empty, so sets larger
    /// than `MAX_GPU_WAVES` are fine; otherwise they are rejected.
    pub fn new(
        layer: &Layer,
        view_proj: Mat4,
        model: Mat4,
        shading: &ShadingConstants,
        extent: (f32, f32),
        time_s: f32,
        with_waves: bool,
    ) -> Result<Self, RenderError> {
        let (waves, wave_count) = if with_waves {
            pack_waves(layer.waves()).ok_or_else(|| RenderError::TooManyWaves {
                layer: layer.name().to_string(),
                count: layer.waves().len(),
                max: MAX_GPU_WAVES,
            })?
        } else {
            ([WaveUniform::default(); MAX_GPU_WAVES], 0)
        };

        let style = layer.style();
        let shaping = layer.shaping();
        let (fog_color, fog_mix) = match &style.fog {
            Some(fog) => (fog.color, fog.mix.clamp(0.0, 1.0)),
            None => (style.color_low, 1.0),
        };

        Ok(Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color_low: style.color_low.extend(style.alpha()).to_array(),
            color_high: style.color_high.extend(style.gamma).to_array(),
            fog_color: fog_color.extend(fog_mix).to_array(),
            foam: [
                style.foam_intensity.clamp(0.0, 1.0),
                shading.foam_low,
                shading.foam_high,
                0.0,
            ],
            foam_color: shading.foam_color.extend(1.0).to_array(),
            shading: [
                shading.height_scale,
                shading.height_bias,
                shading.vignette_outer,
                shading.vignette_inner,
            ],
            shaping: [
                shaping.steepness(),
                shaping.amplitude_gradient.bottom_scale,
                shaping.amplitude_gradient.top_scale,
                time_s,
            ],
            plane: [extent.0, extent.1, shading.vignette_floor, wave_count as f32],
            waves,
        })
    }
}

/// GPU copy of the shared base grid
struct GridBuffers {
    generation: u64,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GridBuffers {
    fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// Per-layer GPU resources
struct LayerSlot {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// CPU backend only: this layer's displaced vertices
    displaced: Option<wgpu::Buffer>,
}

impl LayerSlot {
    fn destroy(&mut self) {
        self.uniform_buffer.destroy();
        if let Some(buffer) = self.displaced.take() {
            buffer.destroy();
        }
    }
}

/// Rendering system managing wgpu device, pipeline, grid buffers and layer uniforms
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    layer_bind_group_layout: wgpu::BindGroupLayout,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    grid: Option<GridBuffers>,
    slots: Vec<LayerSlot>,
    camera: CameraSystem,
    shading: ShadingConstants,
    extent: (f32, f32),
    backend: DisplacementBackend,
    clear_color: wgpu::Color,
    recording_config: Option<RecordingConfig>,
    frames_drawn: usize,
}

impl RenderSystem {
    /// Create new rendering system on `window`.
    ///
    /// `extent` is the plane size the grid was built with (maps UV to plane space).
    pub async fn new(
        window: Arc<winit::window::Window>,
        render_config: &RenderConfig,
        rig: CameraRig,
        shading: ShadingConstants,
        extent: (f32, f32),
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::CreateSurface(e.to_string()))?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Water Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::RequestDevice(e.to_string()))?;

        // Configure surface; colors are authored as display values, so skip sRGB encoding
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats, recording_config.is_some())
            .ok_or_else(|| RenderError::CreateSurface("surface reports no formats".into()))?;
        if recording_config.is_some() && capture_layout(surface_format).is_none() {
            log::warn!(
                "Surface format {:?} cannot be captured, frames will not be saved",
                surface_format
            );
        }

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;

        // Add COPY_SRC if recording (needed for frame capture)
        if recording_config.is_some() {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Water Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("water.wgsl").into()),
        });

        let layer_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Layer Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Water Pipeline Layout"),
            bind_group_layouts: &[&layer_bind_group_layout],
            push_constant_ranges: &[],
        });

        let base_attributes = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ];
        let displaced_attributes = [
            base_attributes[0],
            base_attributes[1],
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
        ];

        let (entry_point, vertex_layout) = match render_config.backend {
            DisplacementBackend::Gpu => (
                "vs_gpu",
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &base_attributes,
                },
            ),
            DisplacementBackend::Cpu => (
                "vs_cpu",
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<DisplacedVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &displaced_attributes,
                },
            ),
        };

        // Translucent sheets: depth-tested, never depth-written, alpha blended
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Water Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(entry_point),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (depth_texture, depth_view) = create_depth_target(&device, config.width, config.height);
        let [r, g, b, a] = render_config.clear_color;

        log::info!(
            "Renderer ready: {:?} backend, {:?} surface, {}x{}",
            render_config.backend,
            config.format,
            config.width,
            config.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            layer_bind_group_layout,
            depth_texture,
            depth_view,
            grid: None,
            slots: Vec::new(),
            camera: CameraSystem::new(rig),
            shading,
            extent,
            backend: render_config.backend,
            clear_color: wgpu::Color { r, g, b, a },
            recording_config,
            frames_drawn: 0,
        })
    }

    /// Make sure there is a uniform slot for each of `count` layers
    fn ensure_slots(&mut self, count: usize) {
        while self.slots.len() < count {
            let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Layer Uniform Buffer"),
                size: std::mem::size_of::<LayerUniforms>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Layer Bind Group"),
                layout: &self.layer_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
            self.slots.push(LayerSlot {
                uniform_buffer,
                bind_group,
                displaced: None,
            });
        }
    }

    /// Write one layer's CPU-displaced vertices into its slot
    fn upload_displaced(&mut self, index: usize, vertices: &[DisplacedVertex]) {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let slot = &mut self.slots[index];
        let fits = slot
            .displaced
            .as_ref()
            .is_some_and(|buffer| buffer.size() == bytes.len() as wgpu::BufferAddress);

        if fits {
            if let Some(buffer) = &slot.displaced {
                self.queue.write_buffer(buffer, 0, bytes);
            }
        } else {
            if let Some(old) = slot.displaced.take() {
                old.destroy();
            }
            slot.displaced = Some(self.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Displaced Vertex Buffer"),
                    contents: bytes,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                },
            ));
        }
    }

    /// Capture a frame to disk (recording mode only)
    fn capture_frame(&self, frame_num: usize, config: &RecordingConfig, texture: &wgpu::Texture) {
        let Some(bgra) = capture_layout(self.config.format) else {
            return;
        };
        let (width, height) = (self.config.width, self.config.height);
        let bytes_per_pixel = 4; // RGBA8 / BGRA8
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        // Create buffer to read texture data
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Capture Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Capture Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, |_| {});
        self.device.poll(wgpu::Maintain::Wait);

        let data = buffer_slice.get_mapped_range();
        let mut image_data = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);

        // Remove row padding (and swizzle BGRA surfaces)
        for row in data.chunks(padded_bytes_per_row as usize) {
            for pixel in row[..unpadded_bytes_per_row as usize].chunks_exact(4) {
                if bgra {
                    image_data.extend_from_slice(&[pixel[2], pixel[1], pixel[0], pixel[3]]);
                } else {
                    image_data.extend_from_slice(pixel);
                }
            }
        }

        drop(data);
        buffer.unmap();
        buffer.destroy();

        let frame_path = config.frame_path(frame_num);
        if let Err(e) = image::save_buffer(
            &frame_path,
            &image_data,
            width,
            height,
            image::ColorType::Rgba8,
        ) {
            log::error!("Failed to save frame {}: {}", frame_num, e);
        }
    }
}

impl FrameRenderer for RenderSystem {
    fn bind_grid(&mut self, grid: &Arc<SurfaceGrid>) {
        // Previous tessellation goes first; per-layer displaced buffers are sized to it
        if let Some(old) = self.grid.take() {
            old.destroy();
            log::debug!("Destroyed GPU buffers of grid #{}", old.generation);
        }
        for slot in &mut self.slots {
            if let Some(buffer) = slot.displaced.take() {
                buffer.destroy();
            }
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Vertex Buffer"),
                contents: bytemuck::cast_slice(&grid.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Index Buffer"),
                contents: bytemuck::cast_slice(&grid.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.grid = Some(GridBuffers {
            generation: grid.generation(),
            vertex_buffer,
            index_buffer,
            index_count: grid.index_count(),
        });
    }

    fn resize_target(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (self.config.width, self.config.height) == (width, height) {
            // Still reconfigure: also used to recover a lost surface
            self.surface.configure(&self.device, &self.config);
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture.destroy();
        let (depth_texture, depth_view) = create_depth_target(&self.device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        let bound = self.grid.as_ref().map(|grid| grid.generation);
        if bound != Some(frame.grid.generation()) {
            self.bind_grid(frame.grid);
        }
        self.ensure_slots(frame.layers.len());

        let aspect = self.config.width as f32 / self.config.height as f32;
        let view_proj = self.camera.view_proj(aspect);
        let gpu_waves = self.backend == DisplacementBackend::Gpu;

        for (index, layer) in frame.layers.iter().enumerate() {
            let model = self.camera.layer_model(layer.style().vertical_offset);
            let uniforms = LayerUniforms::new(
                layer,
                view_proj,
                model,
                &self.shading,
                self.extent,
                frame.time_s,
                gpu_waves,
            )?;
            self.queue.write_buffer(
                &self.slots[index].uniform_buffer,
                0,
                bytemuck::bytes_of(&uniforms),
            );

            if !gpu_waves {
                let vertices = displace_grid(
                    frame.grid,
                    frame.time_s,
                    layer.waves(),
                    layer.shaping(),
                    self.extent,
                );
                self.upload_displaced(index, &vertices);
            }
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Water Encoder"),
            });

        if let Some(grid) = &self.grid {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Water Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_index_buffer(grid.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            // Layers arrive sorted: bottom sheet first
            for slot in &self.slots[..frame.layers.len()] {
                let vertices = match (&slot.displaced, gpu_waves) {
                    (_, true) => &grid.vertex_buffer,
                    (Some(displaced), false) => displaced,
                    (None, false) => continue,
                };
                render_pass.set_bind_group(0, &slot.bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertices.slice(..));
                render_pass.draw_indexed(0..grid.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        // Capture frame if recording
        if let Some(ref config) = self.recording_config {
            self.capture_frame(self.frames_drawn, config, &output.texture);
        }

        output.present();
        self.frames_drawn += 1;

        Ok(())
    }

    fn release(&mut self) {
        if let Some(grid) = self.grid.take() {
            grid.destroy();
        }
        for mut slot in self.slots.drain(..) {
            slot.destroy();
        }
        self.depth_texture.destroy();
        log::debug!("Released GPU resources after {} frames", self.frames_drawn);
    }
}

/// Choose the swapchain format.
///
/// Non-sRGB formats come first so authored colors are written unchanged. When recording,
/// 8-bit RGBA/BGRA wins over wider formats since only those can be saved as PNG.
fn pick_surface_format(
    formats: &[wgpu::TextureFormat],
    recording: bool,
) -> Option<wgpu::TextureFormat> {
    let capturable = |f: &&wgpu::TextureFormat| capture_layout(**f).is_some();
    let linear = |f: &&wgpu::TextureFormat| !f.is_srgb();

    let preferred = if recording {
        formats
            .iter()
            .filter(capturable)
            .find(linear)
            .or_else(|| formats.iter().find(capturable))
    } else {
        None
    };
    preferred
        .or_else(|| formats.iter().find(linear))
        .or_else(|| formats.first())
        .copied()
}

/// Byte order of a capturable surface format: `Some(true)` for BGRA, `Some(false)` for RGBA,
/// `None` when it is not 8 bits per channel.
fn capture_layout(format: wgpu::TextureFormat) -> Option<bool> {
    use wgpu::TextureFormat as F;
    match format {
        F::Bgra8Unorm | F::Bgra8UnormSrgb => Some(true),
        F::Rgba8Unorm | F::Rgba8UnormSrgb => Some(false),
        _ => None,
    }
}

fn create_depth_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Compositor;
    use crate::params::{LayerOverrides, WaterPreset, WaveDescriptor, WaveSet};
    use glam::Vec2;

    fn hero_layers() -> Compositor {
        let preset = WaterPreset::hero().unwrap();
        let grid = Arc::new(SurfaceGrid::new(8, 8, 20.0, 12.0, 1));
        Compositor::from_preset(&preset, grid).unwrap()
    }

    #[test]
    fn test_uniform_size_is_16_byte_multiple() {
        assert_eq!(std::mem::size_of::<LayerUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<DisplacedVertex>(), 28);
    }

    #[test]
    fn test_layer_uniforms_pack_style() {
        let compositor = hero_layers();
        let foggy = compositor.layer("foggy").unwrap();
        let uniforms = LayerUniforms::new(
            foggy,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            &ShadingConstants::default(),
            (20.0, 12.0),
            2.5,
            true,
        )
        .unwrap();

        assert_eq!(uniforms.color_low[3], 0.35);
        assert_eq!(uniforms.fog_color[3], 0.65);
        assert_eq!(uniforms.shaping[3], 2.5);
        assert_eq!(uniforms.plane[3], 3.0);
        assert_eq!(uniforms.waves[0].wavelength, 6.8);
    }

    #[test]
    fn test_gpu_backend_rejects_oversized_wave_set() {
        let preset = WaterPreset::hero().unwrap();
        let mut compositor = hero_layers();
        let wave = WaveDescriptor::new(Vec2::X, 1.0, 0.01, 1.0).unwrap();
        let overrides = LayerOverrides {
            waves: Some(WaveSet::new(vec![wave; MAX_GPU_WAVES + 2])),
            ..Default::default()
        };
        compositor.add_layer("busy", &preset, &overrides).unwrap();
        let busy = compositor.layer("busy").unwrap();
        let build = |with_waves| {
            LayerUniforms::new(
                busy,
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                &ShadingConstants::default(),
                (20.0, 12.0),
                0.0,
                with_waves,
            )
        };

        assert!(matches!(
            build(true),
            Err(RenderError::TooManyWaves { count: 10, .. })
        ));
        // CPU backend evaluates on the host and never reads the wave block
        assert_eq!(build(false).unwrap().plane[3], 0.0);
    }

    #[test]
    fn test_fogless_layer_packs_identity_mix() {
        let preset = WaterPreset::hero().unwrap();
        let mut compositor = hero_layers();
        let overrides = LayerOverrides {
            fog: Some(None),
            ..Default::default()
        };
        compositor.add_layer("bare", &preset, &overrides).unwrap();
        let uniforms = LayerUniforms::new(
            compositor.layer("bare").unwrap(),
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            &ShadingConstants::default(),
            (20.0, 12.0),
            0.0,
            true,
        )
        .unwrap();
        assert_eq!(uniforms.fog_color[3], 1.0);
    }

    fn parse_shader() -> naga::Module {
        naga::front::wgsl::parse_str(include_str!("water.wgsl")).unwrap()
    }

    fn wgsl_size(module: &naga::Module, layouter: &naga::proc::Layouter, name: &str) -> u32 {
        let handle = module
            .types
            .iter()
            .find_map(|(handle, ty)| (ty.name.as_deref() == Some(name)).then_some(handle))
            .unwrap();
        layouter[handle].size
    }

    #[test]
    fn test_shader_validates() {
        let module = parse_shader();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap();

        let entry_points: Vec<_> = module
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage))
            .collect();
        for expected in [
            ("vs_gpu", naga::ShaderStage::Vertex),
            ("vs_cpu", naga::ShaderStage::Vertex),
            ("fs_main", naga::ShaderStage::Fragment),
        ] {
            assert!(entry_points.contains(&expected), "missing {:?}", expected);
        }
    }

    #[test]
    fn test_shader_layout_matches_uniforms() {
        let module = parse_shader();
        let mut layouter = naga::proc::Layouter::default();
        layouter.update(module.to_ctx()).unwrap();

        assert_eq!(
            wgsl_size(&module, &layouter, "Layer") as usize,
            std::mem::size_of::<LayerUniforms>()
        );
        assert_eq!(
            wgsl_size(&module, &layouter, "Wave") as usize,
            std::mem::size_of::<WaveUniform>()
        );
    }

    #[test]
    fn test_surface_format_preference() {
        use wgpu::TextureFormat as F;

        let wide_first = [F::Rgb10a2Unorm, F::Bgra8UnormSrgb, F::Bgra8Unorm];
        assert_eq!(pick_surface_format(&wide_first, false), Some(F::Rgb10a2Unorm));
        assert_eq!(pick_surface_format(&wide_first, true), Some(F::Bgra8Unorm));

        // Only an sRGB 8-bit format is capturable: take it over the linear wide one
        let srgb_only = [F::Rgba16Float, F::Rgba8UnormSrgb];
        assert_eq!(pick_surface_format(&srgb_only, true), Some(F::Rgba8UnormSrgb));

        assert_eq!(pick_surface_format(&[F::Rgba16Float], true), Some(F::Rgba16Float));
        assert_eq!(pick_surface_format(&[], false), None);
    }

    #[test]
    fn test_capture_layout() {
        use wgpu::TextureFormat as F;

        assert_eq!(capture_layout(F::Bgra8Unorm), Some(true));
        assert_eq!(capture_layout(F::Rgba8UnormSrgb), Some(false));
        assert_eq!(capture_layout(F::Rgb10a2Unorm), None);
        assert_eq!(capture_layout(F::Rgba16Float), None);
    }
}
