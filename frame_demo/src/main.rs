//! Headless frame demo
//!
//! Builds a small scene (a ring of orbiting ships, a shadow-casting light and
//! a camera rig), renders a few frames with a shadow-map pass in front of the
//! main pass, and logs what reached the device.
//!
//! Pass a `.toml` or `.ron` path to load the engine configuration from a file.

use std::rc::Rc;

use log::{error, info};
use nalgebra::UnitQuaternion;

use scene_engine::config::Config;
use scene_engine::prelude::*;
use scene_engine::render::backend::DeviceCommand;
use scene_engine::render::render_state::{CompareFunc, CullFace};

const SHIP_COUNT: usize = 6;
const FRAME_COUNT: usize = 4;
const FRAME_STEP: f64 = 1.0 / 60.0;

/// Spins its node around the parent's Y axis
struct Orbiter {
    node: NodeId,
    radius: f32,
    speed: f32,
    phase: f32,
}

impl Entity for Orbiter {
    fn frame_move(&mut self, scene: &mut SceneGraph, time: f64, _delta_time: f64) {
        let angle = self.phase + self.speed * time as f32;
        if let Some(node) = scene.node_mut(self.node) {
            node.set_position(Vec3::new(self.radius * angle.cos(), 0.0, self.radius * angle.sin()));
            node.set_rotation(UnitQuaternion::from_axis_angle(&Vec3::y_axis(), -angle));
        }
    }
}

fn load_config() -> EngineConfig {
    let Some(path) = std::env::args().nth(1) else {
        return EngineConfig::default().with_clear_color([0.02, 0.02, 0.05, 1.0]);
    };
    match EngineConfig::load_from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load '{}': {}, using defaults", path, e);
            EngineConfig::default()
        }
    }
}

fn register_resources(engine: &mut Engine<RecordingDevice>) {
    let names = engine.config().resource_names.clone();
    let resources = engine.resources_mut();
    resources.effects.add(
        "lit",
        Effect::new(ProgramHandle(1))
            .with_state(RenderState::DepthTest(true))
            .with_state(RenderState::CullEnabled(true)),
    );
    resources.effects.add(
        names.shadowmap_effect.as_str(),
        Effect::new(ProgramHandle(2))
            .with_state(RenderState::CullFace(CullFace::Front))
            .with_state(RenderState::DepthFunc(CompareFunc::LessEqual)),
    );
    resources.framebuffers.add(names.shadowmap_target.as_str(), Framebuffer::offscreen(1, 1024, 1024));
    resources.materials.add("hull", Material::new().with_param("albedo", Vec4::new(0.6, 0.6, 0.7, 1.0)));
    resources.materials.add("ground", Material::new().with_param("albedo", Vec4::new(0.2, 0.4, 0.2, 1.0)));

    let camera = resources.cameras.add("main", Camera::default());
    resources.cameras.alias("player", camera);
}

fn build_scene(engine: &mut Engine<RecordingDevice>) -> Result<(), EngineError> {
    let root = engine.scene().root();
    let Some(camera) = engine.resources().cameras.find("main") else {
        return Err(EngineError::MissingResource { kind: "camera", name: "main".to_string() });
    };

    let rig = engine.scene_mut().add_child(root, "camera_rig")?;
    if let Some(node) = engine.scene_mut().node_mut(rig) {
        node.set_position(Vec3::new(0.0, 4.0, 12.0));
        node.attach_camera(camera);
    }

    let sun = engine.scene_mut().add_child(root, "sun")?;
    if let Some(node) = engine.scene_mut().node_mut(sun) {
        node.set_position(Vec3::new(0.0, 10.0, 0.0));
        node.set_rotation(UnitQuaternion::from_axis_angle(&Vec3::x_axis(), -std::f32::consts::FRAC_PI_2));
        node.add_light(Box::new(
            PointDirLight::new(0, Vec3::new(1.0, 0.95, 0.9)).with_orthographic(20.0, 20.0, 0.1, 30.0),
        ));
    }

    let ground = engine.scene_mut().add_child(root, "ground")?;
    if let Some(node) = engine.scene_mut().node_mut(ground) {
        node.set_scale(Vec3::new(20.0, 1.0, 20.0));
        node.add_renderable(Rc::new(MeshRenderable::new("lit").with_chunk(GeometryHandle(1), "ground")));
    }

    let hub = engine.scene_mut().add_child(root, "fleet")?;
    let ship = Rc::new(
        MeshRenderable::new("lit")
            .with_layers(LayerMask::LAYER_0 | LayerMask::CAST_SHADOW)
            .with_chunk(GeometryHandle(2), "hull"),
    );
    for index in 0..SHIP_COUNT {
        let node = engine.scene_mut().add_child(hub, format!("ship_{}", index))?;
        if let Some(ship_node) = engine.scene_mut().node_mut(node) {
            ship_node.add_renderable(ship.clone());
        }
        engine.entities_mut().add(
            format!("orbiter_{}", index),
            Box::new(Orbiter {
                node,
                radius: 5.0,
                speed: 0.5,
                phase: index as f32 * std::f32::consts::TAU / SHIP_COUNT as f32,
            }),
        );
    }
    Ok(())
}

fn run() -> Result<(), EngineError> {
    let mut config = load_config();
    config.init_logging = false;

    let mut engine = Engine::new(config, RecordingDevice::new())?;
    engine.init()?;
    engine.set_default_framebuffer(0, 1280, 720)?;

    register_resources(&mut engine);
    engine.change_camera("player", false);
    let shadow_pass = RenderPass::shadowmap_pass(&engine.config().resource_names);
    engine.render_passes_mut().insert(0, shadow_pass);
    build_scene(&mut engine)?;

    engine.signals_mut().pass_begin.connect(|pass| log::debug!("pass {} begins", pass));
    engine.start();

    for frame in 0..FRAME_COUNT {
        engine.frame_move_at(frame as f64 * FRAME_STEP)?;
        engine.device_mut().clear_commands();

        let stats = engine.render()?;
        let device = engine.device();
        let state_changes = device.count(DeviceCommand::is_state_change);
        let binds = device.count(|command| matches!(command, DeviceCommand::BindFramebuffer(_)));
        info!(
            "frame {}: {} passes, {} queued, {} drawn, {} device calls ({} state changes, {} framebuffer binds)",
            frame,
            stats.passes,
            stats.queued,
            stats.drawn,
            device.commands().len(),
            state_changes,
            binds
        );
    }

    if let Some(light) = engine.scene().find_node_by_name("sun", engine.scene().root()) {
        info!("sun at {:?}", engine.scene().world_position(light));
    }

    engine.signal_termination();
    engine.release();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting frame demo");

    if let Err(e) = run() {
        error!("Frame demo failed: {}", e);
        std::process::exit(1);
    }
}
