//! Scene management system
//!
//! A hierarchical transform tree whose nodes carry renderables, lights and
//! cameras. Once per frame the engine refreshes the cached world transforms
//! top-down and flattens the tree into a sorted [`RenderQueue`].
//!
//! ```text
//! SceneGraph (local transforms)
//!      ↓  update_subtree_world_transforms
//! Cached world transforms → lights / cameras
//!      ↓  RenderQueue::build
//! Sorted draw list → frame orchestrator
//! ```

mod scene_node;
mod scene_graph;
mod render_queue;
pub mod renderable;
pub mod light;

pub use scene_node::{NodeId, SceneNode};
pub use scene_graph::{CameraSink, SceneError, SceneGraph};
pub use render_queue::{QueueEntry, RenderQueue};
pub use renderable::{MeshRenderable, Renderable, QUEUE_OPAQUE, QUEUE_TRANSPARENT};
pub use light::{Light, PointDirLight};
