//! # Rendering System
//!
//! Frame orchestration over an abstract graphics device.
//!
//! ## Architecture
//!
//! - **Backend**: the [`GraphicsDevice`](backend::GraphicsDevice) seam, plus a
//!   headless [`RecordingDevice`](backend::RecordingDevice)
//! - **Render state**: a cached pipeline state with diffing setters and a
//!   push/pop stack ([`RenderStateManager`](render_state_manager::RenderStateManager))
//! - **Resources**: named effects, cameras, framebuffers and materials
//! - **Context**: the active bindings and the override locks, exposed to
//!   renderables through [`RenderContext`](context::RenderContext)
//! - **Frame**: the multi-pass loop ([`FrameOrchestrator`](frame::FrameOrchestrator))

// Device seam
pub mod backend;

// Pipeline state
pub mod render_state;
pub mod render_state_manager;

// Resources
pub mod camera;
pub mod effect;
pub mod framebuffer;
pub mod material;
pub mod resources;
pub mod uniforms;

// Frame
pub mod context;
pub mod frame;
pub mod render_pass;

#[cfg(test)]
mod frame_tests;

pub use backend::{GeometryHandle, GraphicsDevice, ProgramHandle, RecordingDevice, StateDevice};
pub use camera::{Camera, Projection};
pub use context::{ActiveBindings, RenderContext};
pub use effect::Effect;
pub use frame::{FrameOrchestrator, FrameStats};
pub use framebuffer::{Framebuffer, Viewport};
pub use material::Material;
pub use render_pass::{ClearFlags, LayerMask, RenderPass, SfxPass};
pub use render_state::{RenderState, StateCache};
pub use render_state_manager::RenderStateManager;
pub use resources::{CameraId, EffectId, FramebufferId, MaterialId, ResourceManager};
pub use uniforms::BuiltinUniforms;
