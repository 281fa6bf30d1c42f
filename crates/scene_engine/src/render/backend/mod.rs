//! Graphics device abstraction
//!
//! The engine never talks to a graphics API directly. Every state change,
//! clear, bind, upload and draw goes through the traits in this module so the
//! orchestration logic can run against a real backend or against the
//! headless [`RecordingDevice`] used by tests and the demo.

pub mod recording;

pub use recording::{DeviceCommand, RecordingDevice};

use crate::foundation::math::{Mat4, Vec4};
use crate::render::material::Material;
use crate::render::render_pass::ClearFlags;
use crate::render::render_state::{
    BlendEquation, BlendFuncState, ColorMask, CompareFunc, CullFace, FrontFace,
    StencilFuncState, StencilOpState,
};
use crate::render::uniforms::BuiltinUniforms;

/// Handle to a compiled shader program owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Handle to vertex/index data owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

/// Framebuffer object a draw lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// The window surface, or an externally owned framebuffer object
    Screen {
        /// Framebuffer object id supplied by the host; 0 is the default surface
        fbo: u32,
    },
    /// An offscreen render target created by the engine
    Offscreen(u32),
}

/// Pipeline state setters, one per axis
///
/// Implementations apply the change unconditionally; diffing is the job of
/// [`RenderStateManager`](crate::render::RenderStateManager).
pub trait StateDevice {
    /// Set the color used by color clears
    fn set_clear_color(&mut self, color: Vec4);

    /// Set the front-face winding
    fn set_front_face(&mut self, order: FrontFace);

    /// Set which faces are culled
    fn set_cull_face(&mut self, face: CullFace);

    /// Enable or disable face culling
    fn set_cull_enabled(&mut self, enabled: bool);

    /// Set the stencil test function
    fn set_stencil_func(&mut self, func: StencilFuncState);

    /// Set the stencil update operations
    fn set_stencil_op(&mut self, op: StencilOpState);

    /// Enable or disable the stencil test
    fn set_stencil_enabled(&mut self, enabled: bool);

    /// Set the depth comparison
    fn set_depth_func(&mut self, func: CompareFunc);

    /// Enable or disable the depth test
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable depth writes
    fn set_depth_write(&mut self, enabled: bool);

    /// Set the color write mask
    fn set_color_mask(&mut self, mask: ColorMask);

    /// Set the blend factors
    fn set_blend_func(&mut self, func: BlendFuncState);

    /// Set the blend equation
    fn set_blend_equation(&mut self, equation: BlendEquation);

    /// Enable or disable blending
    fn set_blend_enabled(&mut self, enabled: bool);
}

/// Full device contract used by the frame orchestrator
pub trait GraphicsDevice: StateDevice {
    /// Clear the selected buffers of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Bind a shader program
    fn bind_program(&mut self, program: ProgramHandle);

    /// Bind a framebuffer for subsequent clears and draws
    fn bind_framebuffer(&mut self, target: FramebufferTarget);

    /// Set the device viewport rectangle in pixels
    fn set_viewport(&mut self, left: u32, bottom: u32, width: u32, height: u32);

    /// Upload the builtin uniform block to the bound program
    fn upload_builtin_uniforms(&mut self, uniforms: &BuiltinUniforms);

    /// Upload the model matrix of the next draw
    fn upload_model_matrix(&mut self, model: &Mat4);

    /// Upload material parameters to the bound program
    fn upload_material(&mut self, name: &str, material: &Material);

    /// Issue a draw call
    fn draw_geometry(&mut self, geometry: GeometryHandle);
}
