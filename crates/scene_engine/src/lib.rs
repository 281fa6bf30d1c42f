//! # Scene Engine
//!
//! The scene and frame core of a small real-time 3D engine.
//!
//! ## Features
//!
//! - **Scene Graph**: transform hierarchy with cached world transforms
//! - **Multi-Pass Frames**: per-pass overrides of effect, camera, render
//!   target and material with automatic restore
//! - **Render State Cache**: diffing pipeline-state setters with a push/pop stack
//! - **Render Queue**: stable ordering by queue id
//! - **Headless Backend**: a recording device for tests and tools
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//! use std::rc::Rc;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default(), RecordingDevice::new())?;
//!     engine.init()?;
//!     engine.on_size(1280, 720);
//!
//!     engine.resources_mut().cameras.add("main", Camera::default());
//!     engine.change_camera("main", false);
//!
//!     let root = engine.scene().root();
//!     let ship = engine.scene_mut().add_child(root, "ship")?;
//!     if let Some(node) = engine.scene_mut().node_mut(ship) {
//!         node.add_renderable(Rc::new(MeshRenderable::new("lit").with_chunk(GeometryHandle(1), "hull")));
//!     }
//!
//!     engine.start();
//!     engine.frame_move()?;
//!     let stats = engine.render()?;
//!     println!("drew {} renderables", stats.drawn);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod entity;
pub mod events;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig, ResourceNames},
        entity::{Entity, EntityId, EntityManager},
        events::{FrameSignals, Signal},
        foundation::math::{Mat4, Quat, Rbt, Vec3, Vec4},
        render::{
            Camera, ClearFlags, Effect, FrameStats, Framebuffer, GeometryHandle, GraphicsDevice,
            LayerMask, Material, ProgramHandle, RecordingDevice, RenderContext, RenderPass,
            RenderState, SfxPass, Viewport,
        },
        scene::{Light, MeshRenderable, NodeId, PointDirLight, Renderable, SceneGraph},
        Engine, EngineError,
    };
}
