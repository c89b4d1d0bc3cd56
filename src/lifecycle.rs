//! Lifecycle controller: render loop, resize reactivity, reduced-motion and visibility pausing.
//!
//! Everything runs on the host's single event loop. The host tells the controller about
//! size, accessibility and visibility changes and calls `on_frame` when a requested frame
//! fires; the controller decides when to draw and when to ask for the next frame.

use std::time::Instant;

use crate::compositor::{Compositor, FrameRenderer};
use crate::error::{ConfigError, RenderError};
use crate::params::{RenderConfig, WaterPreset};
use crate::surface::MeshBuilder;

/// Host display size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical (device-independent) width
    pub width: f32,

    /// Logical (device-independent) height
    pub height: f32,

    /// Device pixels per logical pixel
    pub scale_factor: f64,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Pixel ratio used for the render target, capped at `max_ratio`
    pub fn pixel_ratio(&self, max_ratio: f64) -> f64 {
        if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            self.scale_factor.min(max_ratio)
        } else {
            1.0
        }
    }

    /// Render target size in physical pixels (at least 1×1)
    pub fn target_size(&self, max_ratio: f64) -> (u32, u32) {
        let ratio = self.pixel_ratio(max_ratio);
        let scale = |logical: f32| ((logical as f64 * ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

/// Accessibility and visibility flags reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSignals {
    /// "Prefers reduced motion"
    pub reduced_motion: bool,

    /// Host surface is shown
    pub visible: bool,
}

impl HostSignals {
    /// Animation only runs when motion is allowed and the surface is visible.
    pub fn should_pause(&self) -> bool {
        self.reduced_motion || !self.visible
    }
}

impl Default for HostSignals {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            visible: true,
        }
    }
}

/// Seconds since the first frame, never rewound
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    start: Option<Instant>,
    elapsed_s: f32,
}

impl AnimationClock {
    /// Advance to `now` and return the snapshot for this frame.
    ///
    /// The first call starts the clock; a `now` earlier than a previous one keeps the
    /// previous value.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let start = *self.start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start).as_secs_f32();
        self.elapsed_s = self.elapsed_s.max(elapsed);
        self.elapsed_s
    }

    /// Last snapshot (0 before the first tick)
    pub fn elapsed(&self) -> f32 {
        self.elapsed_s
    }
}

/// Handle for a requested next-frame callback
pub type FrameToken = u64;

/// Host "next frame" abstraction (e.g. a redraw request at display refresh).
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a previously requested frame. Must tolerate already-fired tokens.
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Running,
    Paused,
    TornDown,
}

/// Explicit context owning the renderer, clock, grid builder and compositor.
pub struct Controller<R: FrameRenderer, S: FrameScheduler> {
    state: LifecycleState,
    preset: WaterPreset,
    max_pixel_ratio: f64,
    builder: MeshBuilder,
    compositor: Option<Compositor>,
    renderer: Option<R>,
    scheduler: S,
    clock: AnimationClock,
    signals: HostSignals,
    viewport: Option<Viewport>,
    pending: Option<FrameToken>,
}

impl<R: FrameRenderer, S: FrameScheduler> Controller<R, S> {
    pub fn new(
        preset: WaterPreset,
        render_config: &RenderConfig,
        scheduler: S,
    ) -> Result<Self, ConfigError> {
        let builder = MeshBuilder::new(preset.mesh.clone())?;
        Ok(Self {
            state: LifecycleState::Uninitialized,
            preset,
            max_pixel_ratio: render_config.max_pixel_ratio,
            builder,
            compositor: None,
            renderer: None,
            scheduler,
            clock: AnimationClock::default(),
            signals: HostSignals::default(),
            viewport: None,
            pending: None,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn signals(&self) -> HostSignals {
        self.signals
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn compositor(&self) -> Option<&Compositor> {
        self.compositor.as_ref()
    }

    pub fn mesh_builder(&self) -> &MeshBuilder {
        &self.builder
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Whether a requested frame is outstanding
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// Bind to the host's display surface and start.
    ///
    /// A missing surface (`None`) is a silent no-op: the controller stays
    /// `Uninitialized` and never draws.
    pub fn attach(
        &mut self,
        renderer: Option<R>,
        viewport: Viewport,
        signals: HostSignals,
    ) -> Result<(), ConfigError> {
        if self.state != LifecycleState::Uninitialized {
            log::debug!("attach ignored in state {:?}", self.state);
            return Ok(());
        }
        let Some(mut renderer) = renderer else {
            log::debug!("No display surface, water background stays off");
            return Ok(());
        };

        // An empty host still gets a grid at the minimum segment counts
        let viewport = self.viewport.unwrap_or(viewport);
        let Some(grid) = self
            .builder
            .resize(viewport.width.max(1.0), viewport.height.max(1.0))
        else {
            return Ok(());
        };
        let compositor = Compositor::from_preset(&self.preset, grid.clone())?;

        let (width, height) = viewport.target_size(self.max_pixel_ratio);
        renderer.resize_target(width, height);
        renderer.bind_grid(&grid);

        self.renderer = Some(renderer);
        self.compositor = Some(compositor);
        self.viewport = Some(viewport);
        self.signals = signals;
        self.state = LifecycleState::Running;
        log::info!(
            "Water background running: preset '{}', {} layers",
            self.preset.name,
            self.preset.layers.len()
        );

        if self.signals.should_pause() {
            self.pause();
        } else {
            self.schedule();
        }
        Ok(())
    }

    /// Host changed its reduced-motion preference.
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.signals.reduced_motion = reduced;
        self.apply_signals();
    }

    /// Host surface was shown or hidden.
    pub fn set_visible(&mut self, visible: bool) {
        self.signals.visible = visible;
        self.apply_signals();
    }

    fn apply_signals(&mut self) {
        match self.state {
            LifecycleState::Running if self.signals.should_pause() => self.pause(),
            LifecycleState::Paused if !self.signals.should_pause() => self.resume(),
            _ => {}
        }
    }

    /// Stop the loop after one final frame at the last clock value.
    fn pause(&mut self) {
        self.cancel_pending();
        self.state = LifecycleState::Paused;
        log::debug!("Paused ({:?})", self.signals);
        self.render(self.clock.elapsed());
    }

    fn resume(&mut self) {
        self.state = LifecycleState::Running;
        log::debug!("Resumed");
        self.schedule();
    }

    fn schedule(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.scheduler.request_frame());
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
        }
    }

    /// A requested frame fired.
    ///
    /// Frames that were canceled (or arrive while paused) are dropped.
    pub fn on_frame(&mut self, now: Instant) {
        if self.state != LifecycleState::Running || self.pending.take().is_none() {
            return;
        }
        let time_s = self.clock.tick(now);
        self.render(time_s);
        if self.state == LifecycleState::Running {
            self.schedule();
        }
    }

    /// Host surface changed size. Allowed in every state but `TornDown`.
    pub fn resize(&mut self, viewport: Viewport) {
        match self.state {
            LifecycleState::TornDown => return,
            LifecycleState::Uninitialized => {
                self.viewport = Some(viewport);
                return;
            }
            LifecycleState::Running | LifecycleState::Paused => {}
        }
        if viewport.is_empty() {
            return;
        }
        self.viewport = Some(viewport);

        let (width, height) = viewport.target_size(self.max_pixel_ratio);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize_target(width, height);
        }

        // Release, install and rebind all happen before control returns to the loop
        if let Some(grid) = self.builder.resize(viewport.width, viewport.height) {
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.bind_grid(&grid);
            }
            if let Some(compositor) = self.compositor.as_mut() {
                compositor.rebind(grid);
            }
        }

        if self.state == LifecycleState::Paused {
            self.render(self.clock.elapsed());
        }
    }

    fn render(&mut self, time_s: f32) {
        let (Some(compositor), Some(renderer)) = (self.compositor.as_ref(), self.renderer.as_mut())
        else {
            return;
        };

        match compositor.render_frame(time_s, renderer) {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                // Reconfigure; the next frame draws again
                if let Some(viewport) = self.viewport {
                    let (width, height) = viewport.target_size(self.max_pixel_ratio);
                    renderer.resize_target(width, height);
                }
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("GPU out of memory, tearing the water background down");
                self.shutdown();
            }
            Err(e) => log::error!("Render error: {}", e),
        }
    }

    /// Stop for good: cancel the pending frame and free the grid and GPU resources.
    ///
    /// Safe to call any number of times.
    pub fn shutdown(&mut self) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        self.cancel_pending();
        if let Some(mut renderer) = self.renderer.take() {
            renderer.release();
        }
        self.compositor = None;
        self.builder.release();
        self.state = LifecycleState::TornDown;
        log::info!("Water background torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Frame;
    use crate::surface::SurfaceGrid;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Log {
        frames: Vec<f32>,
        frame_grids: Vec<u64>,
        binds: Vec<u64>,
        targets: Vec<(u32, u32)>,
        releases: u32,
        requested: u64,
        canceled: Vec<FrameToken>,
        /// Returned by the next draw instead of presenting
        fail_next: Option<wgpu::SurfaceError>,
    }

    type Shared = Rc<RefCell<Log>>;

    struct FakeRenderer(Shared);

    impl FrameRenderer for FakeRenderer {
        fn bind_grid(&mut self, grid: &Arc<SurfaceGrid>) {
            self.0.borrow_mut().binds.push(grid.generation());
        }
        fn resize_target(&mut self, width: u32, height: u32) {
            self.0.borrow_mut().targets.push((width, height));
        }
        fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
            let mut log = self.0.borrow_mut();
            if let Some(err) = log.fail_next.take() {
                return Err(RenderError::Surface(err));
            }
            log.frames.push(frame.time_s);
            log.frame_grids.push(frame.grid.generation());
            Ok(())
        }
        fn release(&mut self) {
            self.0.borrow_mut().releases += 1;
        }
    }

    struct FakeScheduler(Shared);

    impl FrameScheduler for FakeScheduler {
        fn request_frame(&mut self) -> FrameToken {
            let mut log = self.0.borrow_mut();
            log.requested += 1;
            log.requested
        }
        fn cancel_frame(&mut self, token: FrameToken) {
            self.0.borrow_mut().canceled.push(token);
        }
    }

    fn controller() -> (Controller<FakeRenderer, FakeScheduler>, Shared) {
        let log = Shared::default();
        let controller = Controller::new(
            WaterPreset::hero().unwrap(),
            &RenderConfig::default(),
            FakeScheduler(log.clone()),
        )
        .unwrap();
        (controller, log)
    }

    fn viewport() -> Viewport {
        Viewport::new(1280.0, 720.0, 1.0)
    }

    fn started() -> (Controller<FakeRenderer, FakeScheduler>, Shared) {
        let (mut controller, log) = controller();
        controller
            .attach(
                Some(FakeRenderer(log.clone())),
                viewport(),
                HostSignals::default(),
            )
            .unwrap();
        (controller, log)
    }

    #[test]
    fn test_missing_surface_is_noop() {
        let (mut controller, log) = controller();
        controller
            .attach(None, viewport(), HostSignals::default())
            .unwrap();

        assert_eq!(controller.state(), LifecycleState::Uninitialized);
        controller.on_frame(Instant::now());
        assert!(log.borrow().frames.is_empty());
        assert_eq!(log.borrow().requested, 0);
    }

    #[test]
    fn test_attach_starts_loop() {
        let (controller, log) = started();
        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(controller.has_pending_frame());
        assert_eq!(log.borrow().binds, vec![1]);
        assert_eq!(log.borrow().targets, vec![(1280, 720)]);
        assert!(log.borrow().frames.is_empty());
    }

    #[test]
    fn test_frames_advance_clock_monotonically() {
        let (mut controller, log) = started();
        let t0 = Instant::now();
        controller.on_frame(t0);
        controller.on_frame(t0 + Duration::from_millis(16));
        // Host clock hiccup: an earlier timestamp must not rewind
        controller.on_frame(t0 + Duration::from_millis(8));

        let frames = log.borrow().frames.clone();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], 0.0);
        assert!(frames.windows(2).all(|pair| pair[1] >= pair[0]));
        assert!((frames[2] - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_unrequested_frame_is_ignored() {
        let (mut controller, log) = started();
        let now = Instant::now();
        controller.on_frame(now);
        assert!(controller.has_pending_frame());
        controller.pending = None;
        controller.on_frame(now);
        assert_eq!(log.borrow().frames.len(), 1);
    }

    #[test]
    fn test_reduced_motion_then_hidden_then_clear() {
        let (mut controller, log) = started();
        let t0 = Instant::now();
        controller.on_frame(t0);
        controller.on_frame(t0 + Duration::from_millis(500));
        assert_eq!(log.borrow().frames.len(), 2);

        // Reduced motion: exactly one static frame at the last clock value
        controller.set_reduced_motion(true);
        assert_eq!(controller.state(), LifecycleState::Paused);
        assert_eq!(log.borrow().frames.len(), 3);
        assert_eq!(log.borrow().frames[2], log.borrow().frames[1]);
        assert_eq!(log.borrow().canceled, vec![3]);
        assert!(!controller.has_pending_frame());

        // Stray host callbacks while paused draw nothing
        controller.on_frame(t0 + Duration::from_secs(1));

        // Hidden on top of reduced motion: still paused, nothing new
        controller.set_visible(false);
        assert_eq!(log.borrow().frames.len(), 3);

        // One flag clears: still paused
        controller.set_reduced_motion(false);
        assert_eq!(controller.state(), LifecycleState::Paused);
        assert!(!controller.has_pending_frame());
        controller.on_frame(t0 + Duration::from_secs(2));
        assert_eq!(log.borrow().frames.len(), 3);

        // Both clear: loop resumes
        controller.set_visible(true);
        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(controller.has_pending_frame());
        controller.on_frame(t0 + Duration::from_secs(3));
        assert_eq!(log.borrow().frames.len(), 4);
        assert!((log.borrow().frames[3] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_hidden_pauses_and_reduced_motion_blocks_resume() {
        let (mut controller, log) = started();
        controller.set_visible(false);
        assert_eq!(controller.state(), LifecycleState::Paused);
        assert_eq!(log.borrow().frames.len(), 1);

        controller.set_reduced_motion(true);
        controller.set_visible(true);
        assert_eq!(controller.state(), LifecycleState::Paused);
        assert_eq!(log.borrow().frames.len(), 1);
    }

    #[test]
    fn test_start_with_reduced_motion_renders_one_static_frame() {
        let (mut controller, log) = controller();
        let signals = HostSignals {
            reduced_motion: true,
            visible: true,
        };
        controller
            .attach(Some(FakeRenderer(log.clone())), viewport(), signals)
            .unwrap();

        assert_eq!(controller.state(), LifecycleState::Paused);
        assert_eq!(log.borrow().frames, vec![0.0]);
        assert_eq!(log.borrow().requested, 0);
    }

    #[test]
    fn test_resize_rebuilds_and_rebinds_before_next_frame() {
        let (mut controller, log) = started();
        controller.resize(Viewport::new(4000.0, 2500.0, 1.0));

        assert_eq!(log.borrow().binds, vec![1, 2]);
        let compositor = controller.compositor().unwrap();
        assert_eq!(compositor.grid().segments(), (320, 200));
        assert!(compositor
            .layers()
            .iter()
            .all(|layer| layer.grid().generation() == 2));

        controller.on_frame(Instant::now());
        assert_eq!(log.borrow().frame_grids, vec![2]);
    }

    #[test]
    fn test_resize_with_same_segments_keeps_grid() {
        let (mut controller, log) = started();
        controller.resize(Viewport::new(1281.0, 721.0, 1.0));
        controller.resize(Viewport::new(1281.0, 721.0, 1.0));

        assert_eq!(log.borrow().binds, vec![1]);
        assert_eq!(controller.mesh_builder().builds(), 1);
        assert_eq!(log.borrow().targets.len(), 3);
    }

    #[test]
    fn test_resize_while_paused_redraws_without_resuming() {
        let (mut controller, log) = started();
        controller.set_reduced_motion(true);
        assert_eq!(log.borrow().frames.len(), 1);

        controller.resize(Viewport::new(3000.0, 2000.0, 1.0));
        assert_eq!(controller.state(), LifecycleState::Paused);
        assert_eq!(log.borrow().frames.len(), 2);
        assert_eq!(log.borrow().frame_grids, vec![1, 2]);
        assert!(!controller.has_pending_frame());
    }

    #[test]
    fn test_empty_resize_ignored() {
        let (mut controller, log) = started();
        controller.resize(Viewport::new(0.0, 720.0, 1.0));
        assert_eq!(log.borrow().targets.len(), 1);
        assert_eq!(log.borrow().binds.len(), 1);
    }

    #[test]
    fn test_pixel_ratio_capped() {
        let (mut controller, log) = started();
        controller.resize(Viewport::new(1280.0, 720.0, 3.0));
        assert_eq!(log.borrow().targets.last(), Some(&(2560, 1440)));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (mut controller, log) = started();
        controller.shutdown();
        controller.shutdown();

        assert_eq!(controller.state(), LifecycleState::TornDown);
        assert_eq!(log.borrow().releases, 1);
        assert_eq!(log.borrow().canceled, vec![1]);
        assert!(controller.mesh_builder().current().is_none());
        assert!(controller.compositor().is_none());

        // Nothing reacts after teardown
        controller.on_frame(Instant::now());
        controller.resize(Viewport::new(3000.0, 2000.0, 1.0));
        controller.set_visible(false);
        assert!(log.borrow().frames.is_empty());
        assert_eq!(log.borrow().binds.len(), 1);
    }

    #[test]
    fn test_lost_surface_reconfigures_and_keeps_running() {
        let (mut controller, log) = started();
        log.borrow_mut().fail_next = Some(wgpu::SurfaceError::Lost);
        let t0 = Instant::now();
        controller.on_frame(t0);

        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(controller.has_pending_frame());
        assert_eq!(log.borrow().targets, vec![(1280, 720), (1280, 720)]);
        assert!(log.borrow().frames.is_empty());

        controller.on_frame(t0 + Duration::from_millis(16));
        assert_eq!(log.borrow().frames.len(), 1);
    }

    #[test]
    fn test_outdated_surface_reconfigures() {
        let (mut controller, log) = started();
        log.borrow_mut().fail_next = Some(wgpu::SurfaceError::Outdated);
        controller.on_frame(Instant::now());

        assert_eq!(controller.state(), LifecycleState::Running);
        assert_eq!(log.borrow().targets.len(), 2);
        assert_eq!(log.borrow().releases, 0);
    }

    #[test]
    fn test_out_of_memory_tears_down() {
        let (mut controller, log) = started();
        log.borrow_mut().fail_next = Some(wgpu::SurfaceError::OutOfMemory);
        controller.on_frame(Instant::now());

        assert_eq!(controller.state(), LifecycleState::TornDown);
        assert!(!controller.has_pending_frame());
        assert_eq!(log.borrow().releases, 1);

        controller.shutdown();
        controller.on_frame(Instant::now());
        assert_eq!(log.borrow().releases, 1);
        assert!(log.borrow().frames.is_empty());
    }

    #[test]
    fn test_out_of_memory_on_static_frame_stays_down() {
        let (mut controller, log) = controller();
        log.borrow_mut().fail_next = Some(wgpu::SurfaceError::OutOfMemory);
        let signals = HostSignals {
            reduced_motion: true,
            visible: true,
        };
        controller
            .attach(Some(FakeRenderer(log.clone())), viewport(), signals)
            .unwrap();
        assert_eq!(controller.state(), LifecycleState::TornDown);

        // Clearing the pause signal must not bring a torn-down controller back
        controller.set_reduced_motion(false);
        assert_eq!(controller.state(), LifecycleState::TornDown);
        assert!(!controller.has_pending_frame());
        assert_eq!(log.borrow().requested, 0);
        assert_eq!(log.borrow().releases, 1);
    }

    #[test]
    fn test_resize_before_attach_is_remembered() {
        let (mut controller, log) = controller();
        controller.resize(Viewport::new(3000.0, 2000.0, 1.0));
        controller
            .attach(
                Some(FakeRenderer(log.clone())),
                viewport(),
                HostSignals::default(),
            )
            .unwrap();
        assert_eq!(
            controller.compositor().unwrap().grid().segments(),
            (240, 160)
        );
    }

    #[test]
    fn test_clock_starts_on_first_tick() {
        let mut clock = AnimationClock::default();
        assert_eq!(clock.elapsed(), 0.0);
        let t0 = Instant::now();
        assert_eq!(clock.tick(t0 + Duration::from_secs(5)), 0.0);
        assert!((clock.tick(t0 + Duration::from_secs(6)) - 1.0).abs() < 1e-6);
    }
}
