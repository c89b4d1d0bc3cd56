//! Wavebed - layered Gerstner water behind a window
//!
//! Two translucent sheets of water drift on a tilted plane: a clear layer over a lower,
//! foggier one. The loop pauses whenever motion should stop or nobody can see it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use wavebed::cli::Args;
use wavebed::lifecycle::{Controller, FrameScheduler, FrameToken, HostSignals, Viewport};
use wavebed::params::{CameraRig, RecordingConfig, RenderConfig, ShadingConstants, WaterPreset};
use wavebed::rendering::RenderSystem;

/// Next-frame requests mapped onto winit redraw requests
struct WinitScheduler {
    window: Arc<Window>,
    next_token: FrameToken,
}

impl FrameScheduler for WinitScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_token += 1;
        self.window.request_redraw();
        self.next_token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        // winit cannot retract a redraw; the controller drops it when it fires
        log::trace!("Canceled frame {}", token);
    }
}

/// Fixed-step clock for recording mode
struct Recording {
    config: RecordingConfig,
    start: Instant,
    frames: usize,
}

impl Recording {
    fn next_instant(&mut self) -> Instant {
        let at = self.start + Duration::from_secs_f32(self.frames as f32 * self.config.frame_step());
        self.frames += 1;
        at
    }

    fn is_done(&self) -> bool {
        self.frames >= self.config.total_frames()
    }
}

/// Main application state
struct App {
    preset: Option<WaterPreset>,
    render_config: RenderConfig,
    recording: Option<Recording>,

    // Window and lifecycle
    window: Option<Arc<Window>>,
    controller: Option<Controller<RenderSystem, WinitScheduler>>,

    // Host signals
    reduced_motion: bool,
    occluded: bool,
    minimized: bool,
    suspended: bool,
}

impl App {
    fn new(
        preset: WaterPreset,
        render_config: RenderConfig,
        recording: Option<RecordingConfig>,
        reduced_motion: bool,
    ) -> Self {
        Self {
            preset: Some(preset),
            render_config,
            recording: recording.map(|config| Recording {
                config,
                start: Instant::now(),
                frames: 0,
            }),
            window: None,
            controller: None,
            reduced_motion,
            occluded: false,
            minimized: false,
            suspended: false,
        }
    }

    fn visible(&self) -> bool {
        !(self.occluded || self.minimized || self.suspended)
    }

    fn viewport(window: &Window) -> Viewport {
        let scale_factor = window.scale_factor();
        let logical = window.inner_size().to_logical::<f32>(scale_factor);
        Viewport::new(logical.width, logical.height, scale_factor)
    }

    fn push_visibility(&mut self) {
        let visible = self.visible();
        if let Some(controller) = self.controller.as_mut() {
            controller.set_visible(visible);
        }
    }

    /// Create the window, renderer and controller on first resume
    fn initialize(&mut self, event_loop: &ActiveEventLoop) {
        let Some(preset) = self.preset.take() else {
            return;
        };

        let window_attributes = Window::default_attributes()
            .with_title("Wavebed")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let extent = preset.mesh.extent();
        let scheduler = WinitScheduler {
            window: Arc::clone(&window),
            next_token: 0,
        };
        let mut controller = match Controller::new(preset, &self.render_config, scheduler) {
            Ok(controller) => controller,
            Err(e) => {
                log::error!("Invalid water configuration: {}", e);
                event_loop.exit();
                return;
            }
        };

        // No GPU surface means no background, never a crash
        let renderer = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.render_config,
            CameraRig::default(),
            ShadingConstants::default(),
            extent,
            self.recording.as_ref().map(|r| r.config.clone()),
        )) {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                log::warn!("Water background disabled: {}", e);
                None
            }
        };

        let signals = HostSignals {
            reduced_motion: self.reduced_motion,
            visible: self.visible(),
        };
        if let Err(e) = controller.attach(renderer, Self::viewport(&window), signals) {
            log::error!("Failed to start water background: {}", e);
        }

        log::info!("Wavebed is running (M toggles reduced motion, ESC quits)");
        self.window = Some(window);
        self.controller = Some(controller);
    }

    fn on_redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };

        let Some(recording) = self.recording.as_mut() else {
            controller.on_frame(Instant::now());
            return;
        };

        if !controller.has_pending_frame() {
            return;
        }
        controller.on_frame(recording.next_instant());
        if recording.frames % recording.config.fps as usize == 0 {
            log::info!(
                "Recorded {}/{} frames",
                recording.frames,
                recording.config.total_frames()
            );
        }
        if recording.is_done() {
            log::info!("Recording complete: {}", recording.config.frames_dir());
            self.shutdown(event_loop);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(controller) = self.controller.as_mut() {
            controller.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            self.initialize(event_loop);
            return;
        }
        self.suspended = false;
        self.push_visibility();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.suspended = true;
        self.push_visibility();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => self.shutdown(event_loop),
                // A static frame would stall the fixed-step capture
                KeyCode::KeyM if self.recording.is_some() => {
                    log::warn!("Reduced motion is unavailable while recording");
                }
                KeyCode::KeyM => {
                    self.reduced_motion = !self.reduced_motion;
                    log::info!("Reduced motion: {}", self.reduced_motion);
                    if let Some(controller) = self.controller.as_mut() {
                        controller.set_reduced_motion(self.reduced_motion);
                    }
                }
                _ => {}
            },
            WindowEvent::Resized(size) => {
                self.minimized = size.width == 0 || size.height == 0;
                self.push_visibility();
                if let (Some(window), Some(controller)) = (&self.window, self.controller.as_mut()) {
                    controller.resize(Self::viewport(window));
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(window), Some(controller)) = (&self.window, self.controller.as_mut()) {
                    controller.resize(Self::viewport(window));
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.occluded = occluded;
                self.push_visibility();
            }
            WindowEvent::RedrawRequested => self.on_redraw(event_loop),
            _ => {}
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let preset = match args.build_preset() {
        Ok(preset) => preset,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };
    let recording = match args.create_recording_config() {
        Ok(recording) => recording,
        Err(e) => {
            log::error!("Failed to create recording directory: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(config) = &recording {
        log::info!(
            "Recording {}s at {} fps to {}",
            config.duration_secs,
            config.fps,
            config.frames_dir()
        );
    }

    let mut app = App::new(preset, args.render_config(), recording, args.reduced_motion);
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}
