//! Frame-level tests driving the engine against a recording device

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::entity::Entity;
use crate::render::backend::{DeviceCommand, FramebufferTarget, GeometryHandle, ProgramHandle, RecordingDevice};
use crate::render::camera::Camera;
use crate::render::context::RenderContext;
use crate::render::effect::Effect;
use crate::render::frame::FrameStats;
use crate::render::framebuffer::Framebuffer;
use crate::render::material::Material;
use crate::render::render_pass::{ClearFlags, LayerMask, RenderPass, SfxPass};
use crate::render::render_state::{CullFace, RenderState};
use crate::render::resources::{CameraId, EffectId, FramebufferId};
use crate::foundation::math::Vec4;
use crate::scene::{MeshRenderable, Renderable, QUEUE_TRANSPARENT};

/// What a probe saw when it was drawn
#[derive(Debug, Clone, PartialEq)]
struct DrawRecord {
    pass: u32,
    camera: Option<CameraId>,
    effect: Option<EffectId>,
    framebuffer: Option<FramebufferId>,
}

/// Renderable that asks for an effect and records the bindings at draw time
struct Probe {
    effect: String,
    layers: LayerMask,
    queue_id: i16,
    draws: RefCell<Vec<DrawRecord>>,
}

impl Probe {
    fn new(effect: &str) -> Rc<Self> {
        Self::with(effect, LayerMask::LAYER_0, 0)
    }

    fn with(effect: &str, layers: LayerMask, queue_id: i16) -> Rc<Self> {
        Rc::new(Self {
            effect: effect.to_string(),
            layers,
            queue_id,
            draws: RefCell::new(Vec::new()),
        })
    }

    fn passes(&self) -> Vec<u32> {
        self.draws.borrow().iter().map(|record| record.pass).collect()
    }
}

impl Renderable for Probe {
    fn queue_id(&self) -> i16 {
        self.queue_id
    }

    fn layer_mask(&self) -> LayerMask {
        self.layers
    }

    fn pre_render(&self, _frame_time: f64, _pass_index: u32, ctx: &mut RenderContext<'_>) {
        ctx.change_effect(&self.effect, false);
    }

    fn draw(&self, _frame_time: f64, pass_index: u32, ctx: &mut RenderContext<'_>) {
        let bindings = ctx.bindings();
        self.draws.borrow_mut().push(DrawRecord {
            pass: pass_index,
            camera: bindings.camera().handle(),
            effect: bindings.effect().handle(),
            framebuffer: bindings.framebuffer().handle(),
        });
    }
}

/// Engine with a 640x480 screen, two cameras, two effects and a shadow target
fn engine_with(passes: Vec<RenderPass>) -> Engine<RecordingDevice> {
    let config = EngineConfig::default().with_render_passes(passes);
    let mut engine = Engine::new(config, RecordingDevice::new()).unwrap();
    engine.init().unwrap();
    engine.on_size(640, 480);

    let resources = engine.resources_mut();
    resources.cameras.add("c0", Camera::default());
    resources.cameras.add("x", Camera::default());
    resources.cameras.add("y", Camera::default());
    resources.effects.add("lit", Effect::new(ProgramHandle(1)));
    resources
        .effects
        .add("depth", Effect::new(ProgramHandle(2)).with_state(RenderState::CullFace(CullFace::Front)));
    resources.effects.add("caster", Effect::new(ProgramHandle(3)));
    resources.materials.add("red", Material::new().with_param("color", Vec4::new(1.0, 0.0, 0.0, 1.0)));
    resources.framebuffers.add("shadow", Framebuffer::offscreen(1, 256, 256));

    assert!(engine.change_camera("c0", false));
    engine
}

fn attach(engine: &mut Engine<RecordingDevice>, renderable: Rc<dyn Renderable>) {
    let root = engine.scene().root();
    let node = engine.scene_mut().add_child(root, "probe").unwrap();
    engine.scene_mut().node_mut(node).unwrap().add_renderable(renderable);
}

fn framebuffer_binds(device: &RecordingDevice) -> Vec<FramebufferTarget> {
    device
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::BindFramebuffer(target) => Some(*target),
            _ => None,
        })
        .collect()
}

fn uploaded_materials(device: &RecordingDevice) -> Vec<String> {
    device
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::UploadMaterial(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_camera_override_run_restores_previous_camera() {
    let passes = vec![
        RenderPass::new().with_camera("x"),
        RenderPass::new().with_camera("x"),
        RenderPass::new(),
    ];
    let mut engine = engine_with(passes);
    let probe = Probe::new("lit");
    attach(&mut engine, probe.clone());

    engine.render().unwrap();

    let c0 = engine.resources().cameras.find("c0");
    let x = engine.resources().cameras.find("x");
    let cameras: Vec<_> = probe.draws.borrow().iter().map(|record| record.camera).collect();
    assert_eq!(cameras, vec![x, x, c0]);
    assert_eq!(engine.bindings().camera().handle(), c0);
}

#[test]
fn test_camera_restored_at_end_of_frame() {
    let mut engine = engine_with(vec![RenderPass::new(), RenderPass::new().with_camera("x")]);
    attach(&mut engine, Probe::new("lit"));

    engine.render().unwrap();

    assert_eq!(engine.bindings().camera().handle(), engine.resources().cameras.find("c0"));
    assert_eq!(engine.bindings().camera().name(), "c0");
}

#[test]
fn test_restore_uses_camera_from_before_the_run() {
    let passes = vec![
        RenderPass::new().with_camera("x"),
        RenderPass::new().with_camera("y"),
        RenderPass::new(),
    ];
    let mut engine = engine_with(passes);
    let probe = Probe::new("lit");
    attach(&mut engine, probe.clone());

    engine.render().unwrap();

    let cameras = &engine.resources().cameras;
    let expected = vec![cameras.find("x"), cameras.find("y"), cameras.find("c0")];
    let seen: Vec<_> = probe.draws.borrow().iter().map(|record| record.camera).collect();
    assert_eq!(seen, expected);
    assert_eq!(engine.bindings().camera().handle(), cameras.find("c0"));
}

/// Renderable that asks for a camera of its own before drawing
struct CameraSwitcher {
    camera: &'static str,
    seen: RefCell<Vec<Option<CameraId>>>,
}

impl Renderable for CameraSwitcher {
    fn pre_render(&self, _frame_time: f64, _pass_index: u32, ctx: &mut RenderContext<'_>) {
        ctx.change_camera(self.camera, false);
    }

    fn draw(&self, _frame_time: f64, _pass_index: u32, ctx: &mut RenderContext<'_>) {
        self.seen.borrow_mut().push(ctx.bindings().camera().handle());
    }
}

#[test]
fn test_camera_lock_ignores_renderable_requests() {
    let mut engine = engine_with(vec![RenderPass::new().with_camera("x"), RenderPass::new()]);
    let switcher = Rc::new(CameraSwitcher { camera: "y", seen: RefCell::new(Vec::new()) });
    attach(&mut engine, switcher.clone());

    engine.render().unwrap();

    let cameras = &engine.resources().cameras;
    assert_eq!(*switcher.seen.borrow(), vec![cameras.find("x"), cameras.find("y")]);
    // The request in the free pass sticks; nothing was pending at the end
    assert_eq!(engine.bindings().camera().handle(), cameras.find("y"));
}

#[test]
fn test_unknown_pass_overrides_fall_back() {
    let pass = RenderPass::new().with_effect("no-such-effect").with_camera("no-such-camera");
    let mut engine = engine_with(vec![pass]);
    let probe = Probe::new("lit");
    attach(&mut engine, probe.clone());

    engine.render().unwrap();

    let record = probe.draws.borrow()[0].clone();
    assert_eq!(record.effect, engine.resources().effects.find("engine:effect:fallback"));
    assert_eq!(record.camera, engine.resources().cameras.find("c0"));
    assert_eq!(engine.bindings().camera().handle(), engine.resources().cameras.find("c0"));
    assert!(engine.override_locks().all_free());
}

#[test]
fn test_empty_pass_list() {
    let mut engine = engine_with(Vec::new());
    let probe = Probe::new("lit");
    attach(&mut engine, probe.clone());
    engine.device_mut().clear_commands();

    let stats = engine.render().unwrap();

    assert_eq!(stats, FrameStats { passes: 0, queued: 1, drawn: 0 });
    assert!(probe.draws.borrow().is_empty());
    assert_eq!(engine.device().draw_count(), 0);
    assert!(engine.override_locks().all_free());
    assert_eq!(engine.bindings().camera().handle(), engine.resources().cameras.find("c0"));
}

#[test]
fn test_reregistered_name_rebinds() {
    let mut engine = engine_with(vec![RenderPass::new()]);
    let old_camera = engine.bindings().camera().handle();

    let new_camera = engine.resources_mut().cameras.add("c0", Camera::default());
    assert!(engine.change_camera("c0", false));
    assert_ne!(Some(new_camera), old_camera);
    assert_eq!(engine.bindings().camera().handle(), Some(new_camera));
    assert!(!engine.change_camera("c0", false));

    assert!(engine.set_framebuffer("shadow", false, 0));
    engine.resources_mut().framebuffers.add("shadow", Framebuffer::offscreen(2, 128, 128));
    engine.device_mut().clear_commands();
    assert!(engine.set_framebuffer("shadow", false, 0));
    assert_eq!(framebuffer_binds(engine.device()), vec![FramebufferTarget::Offscreen(2)]);
}

#[test]
fn test_locks_free_after_frame() {
    let pass = RenderPass::new()
        .with_effect("depth")
        .with_camera("x")
        .with_render_target("shadow")
        .with_material("red");
    let mut engine = engine_with(vec![pass]);
    attach(&mut engine, Probe::new("lit"));

    engine.render().unwrap();

    assert!(engine.override_locks().all_free());
    assert!(engine.change_effect("lit", false));
    assert!(engine.change_camera("x", false));
}

#[test]
fn test_render_target_override_run_restores_screen() {
    let passes = vec![
        RenderPass::new().with_render_target("shadow"),
        RenderPass::new().with_render_target("shadow"),
        RenderPass::new(),
    ];
    let mut engine = engine_with(passes);
    let probe = Probe::new("lit");
    attach(&mut engine, probe.clone());
    engine.device_mut().clear_commands();

    engine.render().unwrap();

    assert_eq!(
        framebuffer_binds(engine.device()),
        vec![FramebufferTarget::Offscreen(1), FramebufferTarget::Screen { fbo: 0 }]
    );
    let shadow = engine.resources().framebuffers.find("shadow");
    let screen = engine.resources().framebuffers.find("engine:framebuffer:screen");
    let targets: Vec<_> = probe.draws.borrow().iter().map(|record| record.framebuffer).collect();
    assert_eq!(targets, vec![shadow, shadow, screen]);
}

#[test]
fn test_render_target_restored_at_end_of_frame() {
    let mut engine = engine_with(vec![RenderPass::new().with_render_target("shadow")]);
    attach(&mut engine, Probe::new("lit"));
    engine.device_mut().clear_commands();

    engine.render().unwrap();

    assert_eq!(
        framebuffer_binds(engine.device()),
        vec![FramebufferTarget::Offscreen(1), FramebufferTarget::Screen { fbo: 0 }]
    );
    // Screen viewport re-applied after the restore
    assert!(engine.device().commands().contains(&DeviceCommand::SetViewport {
        left: 0,
        bottom: 0,
        width: 640,
        height: 480
    }));
}

#[test]
fn test_effect_lock_ignores_renderable_requests() {
    let mut engine = engine_with(vec![RenderPass::new().with_effect("depth"), RenderPass::new()]);
    let probe = Probe::new("lit");
    attach(&mut engine, probe.clone());

    engine.render().unwrap();

    let depth = engine.resources().effects.find("depth");
    let lit = engine.resources().effects.find("lit");
    let effects: Vec<_> = probe.draws.borrow().iter().map(|record| record.effect).collect();
    assert_eq!(effects, vec![depth, lit]);
    assert_eq!(engine.states().current().cull_face, CullFace::Front);
}

#[test]
fn test_unknown_effect_falls_back() {
    let mut engine = engine_with(vec![RenderPass::new()]);
    let probe = Probe::new("does-not-exist");
    attach(&mut engine, probe.clone());
    engine.device_mut().clear_commands();

    engine.render().unwrap();

    let fallback = engine.resources().effects.find("engine:effect:fallback");
    assert_eq!(probe.draws.borrow()[0].effect, fallback);
    assert!(engine.device().commands().contains(&DeviceCommand::BindProgram(ProgramHandle(0))));
}

#[test]
fn test_material_override_is_per_pass() {
    let mut engine = engine_with(vec![RenderPass::new().with_material("red"), RenderPass::new()]);
    let mesh = MeshRenderable::new("lit").with_chunk(GeometryHandle(7), "blue");
    attach(&mut engine, Rc::new(mesh));
    engine.device_mut().clear_commands();

    engine.render().unwrap();

    assert_eq!(
        uploaded_materials(engine.device()),
        vec!["red".to_string(), "engine:material:fallback".to_string()]
    );
    assert_eq!(engine.device().draw_count(), 2);
    assert_eq!(engine.bindings().override_material(), None);
}

#[test]
fn test_layer_mask_filters_draws() {
    let passes = vec![
        RenderPass::new().with_layers(LayerMask::LAYER_1),
        RenderPass::new().with_layers(LayerMask::ALL),
    ];
    let mut engine = engine_with(passes);
    let layer0 = Probe::with("lit", LayerMask::LAYER_0, 0);
    let layer1 = Probe::with("lit", LayerMask::LAYER_1, 0);
    attach(&mut engine, layer0.clone());
    attach(&mut engine, layer1.clone());

    let stats = engine.render().unwrap();

    assert_eq!(layer0.passes(), vec![1]);
    assert_eq!(layer1.passes(), vec![0, 1]);
    assert_eq!(stats.passes, 2);
    assert_eq!(stats.queued, 2);
    assert_eq!(stats.drawn, 3);
}

#[test]
fn test_queue_order_within_pass() {
    let mut engine = engine_with(vec![RenderPass::new()]);
    let order = Rc::new(RefCell::new(Vec::new()));

    struct Tagged {
        tag: &'static str,
        queue_id: i16,
        order: Rc<RefCell<Vec<&'static str>>>,
    }
    impl Renderable for Tagged {
        fn queue_id(&self) -> i16 {
            self.queue_id
        }
        fn draw(&self, _frame_time: f64, _pass_index: u32, _ctx: &mut RenderContext<'_>) {
            self.order.borrow_mut().push(self.tag);
        }
    }

    for (tag, queue_id) in [("glass", QUEUE_TRANSPARENT), ("wall", 0), ("floor", 0)] {
        let tagged = Tagged { tag, queue_id, order: Rc::clone(&order) };
        attach(&mut engine, Rc::new(tagged));
    }

    engine.render().unwrap();

    assert_eq!(*order.borrow(), vec!["wall", "floor", "glass"]);
}

#[test]
fn test_shadowmap_pass_selects_caster_effect() {
    let caster_pass = RenderPass::new()
        .with_layers(LayerMask::CAST_SHADOW | LayerMask::LAYER_0)
        .with_render_target("shadow");
    let mut engine = engine_with(vec![
        RenderPass { sfx: SfxPass::ShadowMap, ..caster_pass },
        RenderPass::new(),
    ]);
    let mesh = MeshRenderable::new("lit")
        .with_shadowmap_effect("caster")
        .with_chunk(GeometryHandle(1), "red");
    attach(&mut engine, Rc::new(mesh));
    engine.device_mut().clear_commands();

    engine.render().unwrap();

    let programs: Vec<_> = engine
        .device()
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::BindProgram(program) => Some(*program),
            _ => None,
        })
        .collect();
    assert_eq!(programs, vec![ProgramHandle(3), ProgramHandle(1)]);
}

#[test]
fn test_clear_follows_pass_flags() {
    let passes = vec![
        RenderPass::new().with_clear(ClearFlags::empty()),
        RenderPass::new().with_clear(ClearFlags::DEPTH),
    ];
    let mut engine = engine_with(passes);
    engine.device_mut().clear_commands();

    engine.render().unwrap();

    let clears: Vec<_> = engine
        .device()
        .commands()
        .iter()
        .filter(|command| matches!(command, DeviceCommand::Clear(_)))
        .cloned()
        .collect();
    assert_eq!(clears, vec![DeviceCommand::Clear(ClearFlags::DEPTH)]);
}

#[test]
fn test_pass_signals_bracket_each_pass() {
    let mut engine = engine_with(vec![RenderPass::new(), RenderPass::new()]);
    let events = Rc::new(RefCell::new(Vec::new()));

    let begin = Rc::clone(&events);
    engine.signals_mut().pass_begin.connect(move |pass| begin.borrow_mut().push(("begin", pass)));
    let end = Rc::clone(&events);
    engine.signals_mut().pass_end.connect(move |pass| end.borrow_mut().push(("end", pass)));

    engine.render().unwrap();

    assert_eq!(
        *events.borrow(),
        vec![("begin", 0), ("end", 0), ("begin", 1), ("end", 1)]
    );
}

#[test]
fn test_entity_render_hooks_run_once_per_frame() {
    #[derive(Default)]
    struct Counter {
        calls: Rc<RefCell<Vec<&'static str>>>,
    }
    impl Entity for Counter {
        fn pre_render(&mut self) {
            self.calls.borrow_mut().push("pre");
        }
        fn post_render(&mut self) {
            self.calls.borrow_mut().push("post");
        }
    }

    let mut engine = engine_with(vec![RenderPass::new(), RenderPass::new()]);
    let counter = Counter::default();
    let calls = Rc::clone(&counter.calls);
    engine.entities_mut().add("counter", Box::new(counter));

    engine.render().unwrap();
    engine.render().unwrap();

    assert_eq!(*calls.borrow(), vec!["pre", "post", "pre", "post"]);
    assert_eq!(engine.frames_rendered(), 2);
}
