//! Renderer lifecycle
//!
//! `start()` validates the config, populates the scene, registers a resize
//! listener and schedules the first frame. Each frame advances the scene,
//! draws it and schedules the next one. The returned handle owns all of it:
//! `stop()` (or dropping the handle) cancels the pending frame and releases
//! the listener.
//!
//! Scheduled callbacks only hold a `Weak` reference to the running state,
//! so a frame that fires after the handle is gone does nothing.

mod starfield;
mod wave;

pub use starfield::Starfield;
pub use wave::WaveScene;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info, trace};

use crate::core::{ConfigError, FieldConfig, Size, StartError, SurfaceError, WaveConfig};
use crate::host::{FrameHost, FrameId, ListenerId};
use crate::surface::Surface;
use crate::time::FpsCounter;

/// Something that can be advanced one frame and drawn
pub trait Scene: 'static {
    fn advance(&mut self);

    /// Draw the current state onto a surface of logical `size`
    fn draw(&self, surface: &mut dyn Surface, size: Size) -> Result<(), SurfaceError>;

    fn resize(&mut self, size: Size);
}

struct Running<Sc> {
    scene: Sc,
    surface: Box<dyn Surface>,
    pending: Option<FrameId>,
    listener: Option<ListenerId>,
    stopped: bool,
    frames: u64,
    skipped: u64,
    fps: FpsCounter,
}

impl<Sc: Scene> Running<Sc> {
    /// One full frame: advance, then draw. Drawing failures end the frame
    /// early and are never propagated.
    fn step(&mut self) {
        self.scene.advance();
        self.frames += 1;
        self.fps.tick();

        let result = match self.surface.size() {
            Some(size) => self.scene.draw(self.surface.as_mut(), size),
            None => Err(SurfaceError::Unavailable),
        };
        match result {
            Ok(()) => trace!(frame = self.frames, "Frame drawn"),
            Err(e) => {
                self.skipped += 1;
                debug!(frame = self.frames, error = %e, "Frame draw skipped");
            }
        }
    }

    fn resize(&mut self, size: Size) {
        if let Err(e) = self.surface.resize(size) {
            debug!(error = %e, "Surface resize failed");
        }
        self.scene.resize(size);
        debug!(width = size.width, height = size.height, "Renderer resized");
    }
}

/// Owner of a running renderer
pub struct RendererHandle<Sc: Scene> {
    state: Rc<RefCell<Running<Sc>>>,
    host: Rc<dyn FrameHost>,
}

impl<Sc: Scene> RendererHandle<Sc> {
    /// Cancel the pending frame and release the resize listener.
    /// A frame already in progress always completes. Calling again is a no-op.
    pub fn stop(&self) {
        let (pending, listener, frames) = {
            let mut running = self.state.borrow_mut();
            if running.stopped {
                return;
            }
            running.stopped = true;
            (running.pending.take(), running.listener.take(), running.frames)
        };
        if let Some(id) = pending {
            self.host.cancel_frame(id);
        }
        if let Some(id) = listener {
            self.host.remove_resize_listener(id);
        }
        info!(frames, "Renderer stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.state.borrow().stopped
    }

    /// Frames run so far
    pub fn frames(&self) -> u64 {
        self.state.borrow().frames
    }

    /// Frames whose drawing was abandoned
    pub fn skipped_frames(&self) -> u64 {
        self.state.borrow().skipped
    }

    pub fn fps(&self) -> f64 {
        self.state.borrow().fps.fps()
    }

    pub fn with_scene<R>(&self, f: impl FnOnce(&Sc) -> R) -> R {
        f(&self.state.borrow().scene)
    }

    pub fn with_scene_mut<R>(&self, f: impl FnOnce(&mut Sc) -> R) -> R {
        f(&mut self.state.borrow_mut().scene)
    }
}

impl<Sc: Scene> Drop for RendererHandle<Sc> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the particle field renderer
pub fn start<S, H>(surface: S, config: &FieldConfig, host: H) -> Result<RendererHandle<Starfield>, StartError>
where
    S: Surface + 'static,
    H: FrameHost + 'static,
{
    let params = config.validate()?;
    let bounds = drawable_size(&surface)?;
    info!(
        particles = params.particle_count,
        width = bounds.width,
        height = bounds.height,
        "Starting particle field"
    );
    Ok(launch(Starfield::new(params, bounds), surface, host, bounds))
}

/// Start the wave scene renderer
pub fn start_wave<S, H>(surface: S, config: &WaveConfig, host: H) -> Result<RendererHandle<WaveScene>, StartError>
where
    S: Surface + 'static,
    H: FrameHost + 'static,
{
    config.validate()?;
    let bounds = drawable_size(&surface)?;
    info!(
        particles = config.particle_count,
        width = bounds.width,
        height = bounds.height,
        "Starting wave scene"
    );
    Ok(launch(WaveScene::new(config.clone(), bounds), surface, host, bounds))
}

/// Either scene with its config, chosen at run time
#[derive(Clone, Debug, PartialEq)]
pub enum SceneConfig {
    Starfield(FieldConfig),
    Wave(WaveConfig),
}

impl SceneConfig {
    /// Scene by name (`starfield` or `wave`) with an optional camelCase JSON
    /// config; missing fields take their defaults
    pub fn from_json(scene: &str, json: Option<&str>) -> Result<Self, ConfigError> {
        let json = json.map(str::trim).filter(|j| !j.is_empty()).unwrap_or("{}");
        let parse_error = |e: serde_json::Error| ConfigError::Invalid {
            field: "config",
            reason: e.to_string(),
        };
        match scene.trim() {
            "starfield" => Ok(Self::Starfield(serde_json::from_str(json).map_err(parse_error)?)),
            "wave" => Ok(Self::Wave(serde_json::from_str(json).map_err(parse_error)?)),
            other => Err(ConfigError::Invalid {
                field: "scene",
                reason: format!("unknown scene '{}', expected starfield or wave", other),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Starfield(_) => "starfield",
            Self::Wave(_) => "wave",
        }
    }
}

/// A running renderer of either scene
pub enum AnyRenderer {
    Starfield(RendererHandle<Starfield>),
    Wave(RendererHandle<WaveScene>),
}

impl AnyRenderer {
    pub fn start<S, H>(surface: S, config: &SceneConfig, host: H) -> Result<Self, StartError>
    where
        S: Surface + 'static,
        H: FrameHost + 'static,
    {
        match config {
            SceneConfig::Starfield(c) => start(surface, c, host).map(Self::Starfield),
            SceneConfig::Wave(c) => start_wave(surface, c, host).map(Self::Wave),
        }
    }

    pub fn stop(&self) {
        match self {
            Self::Starfield(h) => h.stop(),
            Self::Wave(h) => h.stop(),
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            Self::Starfield(h) => h.is_running(),
            Self::Wave(h) => h.is_running(),
        }
    }

    pub fn frames(&self) -> u64 {
        match self {
            Self::Starfield(h) => h.frames(),
            Self::Wave(h) => h.frames(),
        }
    }

    pub fn skipped_frames(&self) -> u64 {
        match self {
            Self::Starfield(h) => h.skipped_frames(),
            Self::Wave(h) => h.skipped_frames(),
        }
    }

    pub fn fps(&self) -> f64 {
        match self {
            Self::Starfield(h) => h.fps(),
            Self::Wave(h) => h.fps(),
        }
    }

    /// Pointer position in surface pixels. Only the wave scene reacts.
    pub fn set_pointer(&self, x: f64, y: f64) {
        if let Self::Wave(h) = self {
            h.with_scene_mut(|s| s.set_pointer(x, y));
        }
    }

    /// One-line summary of the scene state for logs and headers
    pub fn summary(&self) -> String {
        match self {
            Self::Starfield(h) => h.with_scene(|s| {
                format!(
                    "{} particles / {} links",
                    s.field().particles().len(),
                    s.field().links().len()
                )
            }),
            Self::Wave(h) => h.with_scene(|s| {
                format!(
                    "{} points / {} visible",
                    s.field().points().len(),
                    s.field().project_cloud().len()
                )
            }),
        }
    }
}

fn drawable_size<S: Surface>(surface: &S) -> Result<Size, StartError> {
    surface
        .size()
        .filter(Size::is_drawable)
        .ok_or(StartError::EmptySurface)
}

/// Wire a ready scene to its surface and host
pub fn launch<Sc, S, H>(scene: Sc, mut surface: S, host: H, bounds: Size) -> RendererHandle<Sc>
where
    Sc: Scene,
    S: Surface + 'static,
    H: FrameHost + 'static,
{
    if let Err(e) = surface.resize(bounds) {
        debug!(error = %e, "Initial surface resize failed");
    }

    let host: Rc<dyn FrameHost> = Rc::new(host);
    let state = Rc::new(RefCell::new(Running {
        scene,
        surface: Box::new(surface),
        pending: None,
        listener: None,
        stopped: false,
        frames: 0,
        skipped: 0,
        fps: FpsCounter::new(),
    }));

    let weak = Rc::downgrade(&state);
    let listener = host.add_resize_listener(Box::new(move |size| {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let mut running = state.borrow_mut();
        if !running.stopped {
            running.resize(size);
        }
    }));

    let first = schedule(&Rc::downgrade(&state), &host);
    {
        let mut running = state.borrow_mut();
        running.listener = Some(listener);
        running.pending = Some(first);
    }

    RendererHandle { state, host }
}

fn schedule<Sc: Scene>(state: &Weak<RefCell<Running<Sc>>>, host: &Rc<dyn FrameHost>) -> FrameId {
    let weak = state.clone();
    let next_host = host.clone();
    host.request_frame(Box::new(move || run_frame(weak, next_host)))
}

fn run_frame<Sc: Scene>(weak: Weak<RefCell<Running<Sc>>>, host: Rc<dyn FrameHost>) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    {
        let mut running = state.borrow_mut();
        if running.stopped {
            return;
        }
        running.pending = None;
        running.step();
    }
    let next = schedule(&weak, &host);
    state.borrow_mut().pending = Some(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ManualHost;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn seeded(count: usize) -> FieldConfig {
        FieldConfig {
            particle_count: count,
            seed: Some(99),
            ..Default::default()
        }
    }

    fn assert_in_bounds(handle: &RendererHandle<Starfield>) {
        handle.with_scene(|s| {
            let Size { width, height } = s.field().bounds();
            let range = s.field().params().depth_range;
            for p in s.field().particles() {
                assert!(p.x >= 0.0 && p.x < width);
                assert!(p.y >= 0.0 && p.y < height);
                assert!(p.depth >= 0.0 && p.depth <= range);
            }
        });
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let result = start(surface, &seeded(0), host.clone());
        assert!(matches!(result, Err(StartError::Config(ConfigError::NoParticles))));
        // Nothing was scheduled
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_start_with_single_color_palette() {
        let config = FieldConfig {
            particle_count: 80,
            depth_range: 1000.0,
            max_connection_distance: 120.0,
            palette: vec!["#1e40af".into()],
            ..Default::default()
        };
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start(surface, &config, host.clone()).unwrap();
        assert_eq!(handle.with_scene(|s| s.field().particles().len()), 80);
        assert!(handle.is_running());
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn test_start_rejects_empty_surface() {
        let surface = RecordingSurface::new(Size::new(0.0, 600.0));
        let result = start(surface, &seeded(10), ManualHost::new());
        assert!(matches!(result, Err(StartError::EmptySurface)));

        let gone = RecordingSurface::new(Size::new(800.0, 600.0));
        gone.set_available(None);
        assert!(matches!(
            start(gone, &seeded(10), ManualHost::new()),
            Err(StartError::EmptySurface)
        ));
    }

    #[test]
    fn test_frames_are_sequential() {
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start(surface.clone(), &seeded(30), host.clone()).unwrap();

        for n in 1..=5 {
            assert_eq!(host.run_frame(), 1);
            assert_eq!(handle.frames(), n);
            assert_eq!(host.pending_frames(), 1);
        }
        assert_eq!(surface.commands().first(), Some(&DrawCommand::Clear));
        assert_in_bounds(&handle);
    }

    #[test]
    fn test_frame_draws_particles_and_links() {
        let surface = RecordingSurface::new(Size::new(300.0, 200.0));
        let host = ManualHost::new();
        let handle = start(surface.clone(), &seeded(60), host.clone()).unwrap();
        host.run_frame();

        let expected_links = handle.with_scene(|s| s.field().links().len());
        let lines = surface.count(|c| matches!(c, DrawCommand::Line { .. }));
        let glows = surface.count(|c| matches!(c, DrawCommand::Glow(_)));
        let radials = surface.count(|c| matches!(c, DrawCommand::Radial(_)));
        assert!(expected_links > 0);
        assert_eq!(lines, expected_links);
        assert!(glows <= 60 && glows > 0);
        assert_eq!(radials, 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start(surface, &seeded(20), host.clone()).unwrap();
        host.run_frame();

        handle.stop();
        handle.stop();
        assert!(!handle.is_running());
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);

        assert_eq!(host.run_frame(), 0);
        assert_eq!(handle.frames(), 1);
    }

    #[test]
    fn test_drop_releases_host() {
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start(surface, &seeded(20), host.clone()).unwrap();
        drop(handle);
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_resize_mid_animation() {
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start(surface.clone(), &seeded(80), host.clone()).unwrap();
        for _ in 0..20 {
            host.run_frame();
        }

        let before: Vec<_> = handle.with_scene(|s| s.field().particles().to_vec());
        host.resize(Size::new(400.0, 300.0));
        // Particle state is untouched by the resize itself
        assert_eq!(handle.with_scene(|s| s.field().particles().to_vec()), before);
        assert_eq!(surface.size(), Some(Size::new(400.0, 300.0)));
        assert_eq!(handle.with_scene(|s| s.field().bounds()), Size::new(400.0, 300.0));

        host.run_frame();
        assert_in_bounds(&handle);
        assert_eq!(handle.skipped_frames(), 0);
    }

    #[test]
    fn test_unavailable_surface_skips_draws() {
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start(surface.clone(), &seeded(10), host.clone()).unwrap();
        host.run_frame();

        surface.set_available(None);
        host.run_frame();
        host.run_frame();
        assert_eq!(handle.skipped_frames(), 2);
        assert_eq!(handle.frames(), 3);
        assert!(handle.is_running());
        assert_eq!(host.pending_frames(), 1);

        surface.set_available(Some(Size::new(800.0, 600.0)));
        host.run_frame();
        assert_eq!(handle.skipped_frames(), 2);
        assert!(surface.count(|c| matches!(c, DrawCommand::Glow(_))) > 0);
    }

    #[test]
    fn test_wave_scene_lifecycle() {
        let config = WaveConfig {
            particle_count: 200,
            plane_segments: 6,
            seed: Some(1),
            ..Default::default()
        };
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start_wave(surface.clone(), &config, host.clone()).unwrap();
        host.run_frame();

        assert_eq!(surface.commands()[0], DrawCommand::Clear);
        assert!(matches!(surface.commands()[1], DrawCommand::Fill(_)));
        assert!(surface.count(|c| matches!(c, DrawCommand::Glow(_))) > 0);
        assert!(surface.count(|c| matches!(c, DrawCommand::Line { .. })) > 0);

        handle.with_scene_mut(|s| s.set_pointer(0.0, 0.0));
        host.run_frame();
        assert!(handle.with_scene(|s| s.field().rotation().0) < 0.0);

        handle.stop();
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_wave_scene_resize() {
        let config = WaveConfig {
            particle_count: 300,
            plane_segments: 6,
            seed: Some(2),
            ..Default::default()
        };
        let surface = RecordingSurface::new(Size::new(800.0, 600.0));
        let host = ManualHost::new();
        let handle = start_wave(surface.clone(), &config, host.clone()).unwrap();
        host.run_frame();

        host.resize(Size::new(300.0, 500.0));
        assert_eq!(surface.size(), Some(Size::new(300.0, 500.0)));
        assert_eq!(handle.with_scene(|s| s.field().bounds()), Size::new(300.0, 500.0));

        host.run_frame();
        assert_eq!(handle.skipped_frames(), 0);
        for command in surface.commands() {
            if let DrawCommand::Glow(g) = command {
                assert!(g.center[0] >= -15.0 && g.center[0] <= 315.0);
                assert!(g.center[1] >= -25.0 && g.center[1] <= 525.0);
            }
        }
    }

    #[test]
    fn test_scene_config_from_json() {
        let config = SceneConfig::from_json("starfield", Some(r#"{"particleCount": 12}"#)).unwrap();
        match &config {
            SceneConfig::Starfield(c) => {
                assert_eq!(c.particle_count, 12);
                assert_eq!(c.max_connection_distance, 120.0);
            }
            other => panic!("expected starfield, got {:?}", other),
        }
        assert_eq!(config.name(), "starfield");

        assert!(matches!(
            SceneConfig::from_json("wave", None),
            Ok(SceneConfig::Wave(c)) if c == WaveConfig::default()
        ));
        assert!(matches!(
            SceneConfig::from_json("spiral", None),
            Err(ConfigError::Invalid { field: "scene", .. })
        ));
        assert!(matches!(
            SceneConfig::from_json("wave", Some("{not json")),
            Err(ConfigError::Invalid { field: "config", .. })
        ));
    }

    #[test]
    fn test_any_renderer() {
        let host = ManualHost::new();
        let surface = RecordingSurface::new(Size::new(320.0, 240.0));
        let config = SceneConfig::Starfield(seeded(25));
        let renderer = AnyRenderer::start(surface, &config, host.clone()).unwrap();
        host.run_frame();
        host.run_frame();
        assert_eq!(renderer.frames(), 2);
        assert!(renderer.summary().starts_with("25 particles"));
        // No-op for the particle field
        renderer.set_pointer(10.0, 10.0);

        drop(renderer);
        assert_eq!(host.pending_frames(), 0);
    }
}
