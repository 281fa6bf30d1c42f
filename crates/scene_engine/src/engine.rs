//! Core engine implementation

use log::{info, warn};
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::entity::EntityManager;
use crate::events::FrameSignals;
use crate::foundation::logging;
use crate::foundation::math::Vec4;
use crate::foundation::time::FrameClock;
use crate::render::backend::{GraphicsDevice, ProgramHandle};
use crate::render::context::{ActiveBindings, OverrideLocks, RenderContext};
use crate::render::effect::Effect;
use crate::render::frame::{FrameOrchestrator, FrameStats};
use crate::render::framebuffer::Framebuffer;
use crate::render::material::Material;
use crate::render::render_pass::RenderPass;
use crate::render::render_state_manager::RenderStateManager;
use crate::render::resources::ResourceManager;
use crate::render::uniforms::BuiltinUniforms;
use crate::scene::{SceneError, SceneGraph};

/// Main engine struct
///
/// Owns the scene graph, the resource registries, the pipeline state cache
/// and the device, and sequences them through the update and render steps.
/// Several engines can coexist; nothing here is global.
///
/// # Frame sequence
/// 1. [`frame_move`](Engine::frame_move): frame-moved signal, entity updates,
///    time uniforms, world-transform refresh.
/// 2. [`render`](Engine::render): the multi-pass frame.
pub struct Engine<D: GraphicsDevice> {
    config: EngineConfig,
    scene: SceneGraph,
    resources: ResourceManager,
    states: RenderStateManager,
    entities: EntityManager,
    orchestrator: FrameOrchestrator,
    bindings: ActiveBindings,
    uniforms: BuiltinUniforms,
    signals: FrameSignals,
    clock: FrameClock,
    device: D,
    frame_time: f64,
    initialized: bool,
    terminated: bool,
}

impl<D: GraphicsDevice> Engine<D> {
    /// Create a new engine instance
    ///
    /// Nothing touches the device until [`init`](Engine::init).
    pub fn new(config: EngineConfig, device: D) -> Result<Self, EngineError> {
        config.validate()?;
        let orchestrator = FrameOrchestrator::new(config.render_passes.clone());
        let bindings = ActiveBindings::new(config.resource_names.clone());

        Ok(Self {
            config,
            scene: SceneGraph::new(),
            resources: ResourceManager::new(),
            states: RenderStateManager::new(),
            entities: EntityManager::new(),
            orchestrator,
            bindings,
            uniforms: BuiltinUniforms::default(),
            signals: FrameSignals::new(),
            clock: FrameClock::new(),
            device,
            frame_time: 0.0,
            initialized: false,
            terminated: false,
        })
    }

    /// Register builtin resources and synchronize the device with the state cache
    pub fn init(&mut self) -> Result<(), EngineError> {
        if self.config.init_logging {
            logging::init_with_level(self.config.level_filter()?);
        }
        info!("Initializing engine...");

        let names = self.config.resource_names.clone();
        self.resources.framebuffers.add(names.screen_framebuffer.as_str(), Framebuffer::screen());
        if !self.resources.effects.contains(&names.fallback_effect) {
            self.resources.effects.add(names.fallback_effect.as_str(), Effect::new(ProgramHandle(0)));
        }
        if !self.resources.materials.contains(&names.fallback_material) {
            self.resources.materials.add(names.fallback_material.as_str(), Material::new());
        }

        self.states.apply_current_state(&mut self.device);
        let clear_color = Vec4::from(self.config.clear_color);
        self.states.set_clear_color(&mut self.device, clear_color, false);

        self.context().set_framebuffer(&names.screen_framebuffer, true, 0);
        self.initialized = true;
        info!("Engine initialized");
        Ok(())
    }

    /// Run every entity's start hook
    pub fn start(&mut self) {
        self.entities.start_all(&mut self.scene);
    }

    /// Update step using the wall clock
    pub fn frame_move(&mut self) -> Result<(), EngineError> {
        let (now, _) = self.clock.tick();
        self.advance(now)
    }

    /// Update step at an explicit time in seconds
    pub fn frame_move_at(&mut self, now: f64) -> Result<(), EngineError> {
        self.clock.tick_at(now);
        self.advance(now)
    }

    fn advance(&mut self, now: f64) -> Result<(), EngineError> {
        let delta = f64::from(self.clock.delta_time());
        self.signals.frame_moved.emit((now, delta));
        self.entities.frame_move_all(&mut self.scene, now, delta);

        self.frame_time = delta;
        self.uniforms.time = now as f32;
        self.uniforms.delta_time = delta as f32;

        let root = self.scene.root();
        self.scene.update_subtree_world_transforms(root, &mut self.resources)?;
        Ok(())
    }

    /// Render one frame
    pub fn render(&mut self) -> Result<FrameStats, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let mut ctx = RenderContext::new(
            &mut self.device,
            &mut self.states,
            &mut self.resources,
            &mut self.bindings,
            &mut self.uniforms,
        );
        Ok(self.orchestrator.render(
            self.frame_time,
            &self.scene,
            &mut self.entities,
            &mut self.signals,
            &mut ctx,
        ))
    }

    /// Handle a resize of the window surface
    ///
    /// Resizes the screen framebuffer's viewports, re-applies the current
    /// viewport if the screen is bound, then fires the size-changed signal.
    pub fn on_size(&mut self, width: u32, height: u32) {
        let screen = self.resources.framebuffers.find(&self.config.resource_names.screen_framebuffer);
        if let Some(handle) = screen {
            if let Some(framebuffer) = self.resources.framebuffers.get_mut(handle) {
                framebuffer.on_size(width, height);
            }
            if self.bindings.framebuffer().handle() == Some(handle) {
                let viewport = self.bindings.viewport();
                self.context().set_viewport(viewport);
            }
        }
        self.signals.size_changed.emit((width, height));
    }

    /// Point the screen framebuffer at a host-owned framebuffer object and bind it
    pub fn set_default_framebuffer(&mut self, fbo: u32, width: u32, height: u32) -> Result<(), EngineError> {
        let name = self.config.resource_names.screen_framebuffer.clone();
        let framebuffer = self
            .resources
            .framebuffers
            .get_by_name_mut(&name)
            .ok_or_else(|| EngineError::MissingResource { kind: "framebuffer", name: name.clone() })?;
        framebuffer.set_external_params(fbo, width, height);
        self.context().set_framebuffer(&name, true, 0);
        Ok(())
    }

    /// Make an effect current; see [`RenderContext::change_effect`]
    pub fn change_effect(&mut self, name: &str, force: bool) -> bool {
        self.context().change_effect(name, force)
    }

    /// Make a camera current; see [`RenderContext::change_camera`]
    pub fn change_camera(&mut self, name: &str, force: bool) -> bool {
        self.context().change_camera(name, force)
    }

    /// Make a framebuffer current; see [`RenderContext::set_framebuffer`]
    pub fn set_framebuffer(&mut self, name: &str, force: bool, viewport: usize) -> bool {
        self.context().set_framebuffer(name, force, viewport)
    }

    /// Select a viewport of the current framebuffer
    pub fn set_viewport(&mut self, index: usize) -> Result<(), EngineError> {
        let framebuffer = self
            .bindings
            .framebuffer()
            .handle()
            .and_then(|handle| self.resources.framebuffers.get(handle))
            .ok_or_else(|| EngineError::MissingResource {
                kind: "framebuffer",
                name: self.bindings.framebuffer().name().to_string(),
            })?;
        let count = framebuffer.viewport_count();
        if index >= count {
            warn!("Viewport {} out of range, framebuffer has {}", index, count);
            return Err(EngineError::OutOfRangeViewport { index, count });
        }
        self.context().set_viewport(index);
        Ok(())
    }

    /// Tear down the scene, entities, resources and bindings
    ///
    /// The engine must be initialized again before rendering.
    pub fn release(&mut self) {
        info!("Releasing engine resources");
        self.scene.reset();
        self.entities.destroy_all();
        self.resources.release();
        self.bindings.reset();
        self.initialized = false;
    }

    /// Ask the host loop to stop
    pub fn signal_termination(&mut self) {
        info!("Engine termination requested");
        self.terminated = true;
    }

    /// Whether termination was requested
    pub fn termination_signaled(&self) -> bool {
        self.terminated
    }

    /// Whether [`init`](Engine::init) has run since creation or the last release
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Borrow the parts needed to change bindings outside of a frame
    pub fn context(&mut self) -> RenderContext<'_> {
        RenderContext::new(
            &mut self.device,
            &mut self.states,
            &mut self.resources,
            &mut self.bindings,
            &mut self.uniforms,
        )
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the scene graph
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Get mutable access to the scene graph
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Get the resource registries
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Get mutable access to the resource registries
    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Get the pipeline state manager
    pub fn states(&self) -> &RenderStateManager {
        &self.states
    }

    /// Get mutable access to the entities
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    /// Get mutable access to the frame signals
    pub fn signals_mut(&mut self) -> &mut FrameSignals {
        &mut self.signals
    }

    /// Configured render passes
    pub fn render_passes(&self) -> &[RenderPass] {
        self.orchestrator.passes()
    }

    /// Mutable render pass list
    pub fn render_passes_mut(&mut self) -> &mut Vec<RenderPass> {
        self.orchestrator.passes_mut()
    }

    /// Number of frames rendered
    pub fn frames_rendered(&self) -> u64 {
        self.orchestrator.frames_rendered()
    }

    /// Current bindings and override locks
    pub fn bindings(&self) -> &ActiveBindings {
        &self.bindings
    }

    /// Override lock state; all free outside of a frame
    pub fn override_locks(&self) -> OverrideLocks {
        self.bindings.locks()
    }

    /// Builtin uniform block
    pub fn uniforms(&self) -> &BuiltinUniforms {
        &self.uniforms
    }

    /// Seconds between the last two update steps
    pub fn last_frame_time(&self) -> f64 {
        self.frame_time
    }

    /// Get the device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Get mutable access to the device
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Structural scene graph error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A named resource is not registered
    #[error("Missing {kind} '{name}'")]
    MissingResource {
        /// Resource kind
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// Viewport index beyond the framebuffer's viewports
    #[error("Viewport {index} out of range ({count} viewports)")]
    OutOfRangeViewport {
        /// Requested index
        index: usize,
        /// Number of viewports
        count: usize,
    },

    /// The engine has not been initialized
    #[error("Engine not initialized")]
    NotInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::{DeviceCommand, FramebufferTarget, RecordingDevice};
    use crate::render::camera::Camera;
    use crate::render::framebuffer::Viewport;
    use crate::foundation::math::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> Engine<RecordingDevice> {
        let mut engine = Engine::new(EngineConfig::default(), RecordingDevice::new()).unwrap();
        engine.init().unwrap();
        engine
    }

    #[test]
    fn test_render_requires_init() {
        let mut engine = Engine::new(EngineConfig::default(), RecordingDevice::new()).unwrap();
        assert!(matches!(engine.render(), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig::default().with_log_level("chatty");
        assert!(matches!(
            Engine::new(config, RecordingDevice::new()),
            Err(EngineError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_init_syncs_device_and_binds_screen() {
        let config = EngineConfig::default().with_clear_color([0.5, 0.5, 0.5, 1.0]);
        let mut engine = Engine::new(config, RecordingDevice::new()).unwrap();
        engine.init().unwrap();

        let commands = engine.device().commands();
        assert_eq!(commands.iter().filter(|c| c.is_state_change()).count(), 15);
        assert!(commands.contains(&DeviceCommand::SetClearColor(Vec4::new(0.5, 0.5, 0.5, 1.0))));
        assert!(commands.contains(&DeviceCommand::BindFramebuffer(FramebufferTarget::Screen { fbo: 0 })));
        assert_eq!(engine.bindings().framebuffer().name(), "engine:framebuffer:screen");
    }

    #[test]
    fn test_frame_move_refreshes_world_and_time() {
        let mut engine = engine();
        let root = engine.scene().root();
        let node = engine.scene_mut().add_child(root, "moved").unwrap();
        engine.scene_mut().node_mut(node).unwrap().set_position(Vec3::new(3.0, 0.0, 0.0));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.signals_mut().frame_moved.connect(move |args| sink.borrow_mut().push(args));

        engine.frame_move_at(1.0).unwrap();
        engine.frame_move_at(1.5).unwrap();

        assert_eq!(engine.scene().world_position(node), Some(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(*seen.borrow(), vec![(1.0, 0.0), (1.5, 0.5)]);
        assert_eq!(engine.uniforms().time, 1.5);
        assert_eq!(engine.last_frame_time(), 0.5);
    }

    #[test]
    fn test_on_size_resizes_screen_and_camera() {
        let mut engine = engine();
        engine.resources_mut().cameras.add("main", Camera::default());
        assert!(engine.change_camera("main", false));

        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&sizes);
        engine.signals_mut().size_changed.connect(move |size| sink.borrow_mut().push(size));
        engine.device_mut().clear_commands();

        engine.on_size(800, 400);

        assert!(engine.device().commands().contains(&DeviceCommand::SetViewport {
            left: 0,
            bottom: 0,
            width: 800,
            height: 400
        }));
        let camera = engine.resources().cameras.get_by_name("main").unwrap();
        assert_eq!(camera.aspect(), 2.0);
        assert_eq!(*sizes.borrow(), vec![(800, 400)]);
    }

    #[test]
    fn test_set_viewport_out_of_range() {
        let mut engine = engine();
        engine.on_size(640, 480);

        assert!(matches!(
            engine.set_viewport(3),
            Err(EngineError::OutOfRangeViewport { index: 3, count: 1 })
        ));
        assert_eq!(engine.bindings().viewport(), 0);

        let screen = engine.bindings().framebuffer().handle().unwrap();
        engine
            .resources_mut()
            .framebuffers
            .get_mut(screen)
            .unwrap()
            .add_viewport(Viewport::from_ratios(0.0, 0.0, 0.5, 0.5));
        assert!(engine.set_viewport(1).is_ok());
        assert_eq!(engine.bindings().viewport(), 1);
    }

    #[test]
    fn test_set_default_framebuffer() {
        let mut engine = engine();
        engine.set_default_framebuffer(42, 320, 200).unwrap();

        assert!(engine
            .device()
            .commands()
            .contains(&DeviceCommand::BindFramebuffer(FramebufferTarget::Screen { fbo: 42 })));
        assert!(engine.device().commands().contains(&DeviceCommand::SetViewport {
            left: 0,
            bottom: 0,
            width: 320,
            height: 200
        }));
    }

    #[test]
    fn test_release_and_termination() {
        let mut engine = engine();
        let root = engine.scene().root();
        engine.scene_mut().add_child(root, "doomed").unwrap();
        engine.release();

        assert_eq!(engine.scene().len(), 1);
        assert!(engine.resources().framebuffers.is_empty());
        assert!(engine.bindings().framebuffer().handle().is_none());
        assert!(matches!(engine.render(), Err(EngineError::NotInitialized)));

        assert!(!engine.termination_signaled());
        engine.signal_termination();
        assert!(engine.termination_signaled());
    }
}
