//! Headless device that records every command it receives

use log::trace;

use super::{FramebufferTarget, GeometryHandle, GraphicsDevice, ProgramHandle, StateDevice};
use crate::foundation::math::{Mat4, Vec4};
use crate::render::material::Material;
use crate::render::render_pass::ClearFlags;
use crate::render::render_state::{
    BlendEquation, BlendFuncState, ColorMask, CompareFunc, CullFace, FrontFace,
    StencilFuncState, StencilOpState,
};
use crate::render::uniforms::BuiltinUniforms;

/// A single recorded device call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DeviceCommand {
    SetClearColor(Vec4),
    SetFrontFace(FrontFace),
    SetCullFace(CullFace),
    SetCullEnabled(bool),
    SetStencilFunc(StencilFuncState),
    SetStencilOp(StencilOpState),
    SetStencilEnabled(bool),
    SetDepthFunc(CompareFunc),
    SetDepthTest(bool),
    SetDepthWrite(bool),
    SetColorMask(ColorMask),
    SetBlendFunc(BlendFuncState),
    SetBlendEquation(BlendEquation),
    SetBlendEnabled(bool),
    Clear(ClearFlags),
    BindProgram(ProgramHandle),
    BindFramebuffer(FramebufferTarget),
    SetViewport { left: u32, bottom: u32, width: u32, height: u32 },
    UploadBuiltinUniforms(Box<BuiltinUniforms>),
    UploadModelMatrix(Mat4),
    UploadMaterial(String),
    DrawGeometry(GeometryHandle),
}

impl DeviceCommand {
    /// Whether this command changes pipeline state
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            Self::SetClearColor(_)
                | Self::SetFrontFace(_)
                | Self::SetCullFace(_)
                | Self::SetCullEnabled(_)
                | Self::SetStencilFunc(_)
                | Self::SetStencilOp(_)
                | Self::SetStencilEnabled(_)
                | Self::SetDepthFunc(_)
                | Self::SetDepthTest(_)
                | Self::SetDepthWrite(_)
                | Self::SetColorMask(_)
                | Self::SetBlendFunc(_)
                | Self::SetBlendEquation(_)
                | Self::SetBlendEnabled(_)
        )
    }
}

/// Device that performs no rendering and keeps a log of calls
#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
}

impl RecordingDevice {
    /// Create an empty recording device
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands recorded so far
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Forget all recorded commands
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Count the commands matching a predicate
    pub fn count(&self, predicate: impl Fn(&DeviceCommand) -> bool) -> usize {
        self.commands.iter().filter(|command| predicate(command)).count()
    }

    /// Number of draw calls recorded
    pub fn draw_count(&self) -> usize {
        self.count(|command| matches!(command, DeviceCommand::DrawGeometry(_)))
    }

    fn record(&mut self, command: DeviceCommand) {
        trace!("device: {:?}", command);
        self.commands.push(command);
    }
}

impl StateDevice for RecordingDevice {
    fn set_clear_color(&mut self, color: Vec4) {
        self.record(DeviceCommand::SetClearColor(color));
    }

    fn set_front_face(&mut self, order: FrontFace) {
        self.record(DeviceCommand::SetFrontFace(order));
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.record(DeviceCommand::SetCullFace(face));
    }

    fn set_cull_enabled(&mut self, enabled: bool) {
        self.record(DeviceCommand::SetCullEnabled(enabled));
    }

    fn set_stencil_func(&mut self, func: StencilFuncState) {
        self.record(DeviceCommand::SetStencilFunc(func));
    }

    fn set_stencil_op(&mut self, op: StencilOpState) {
        self.record(DeviceCommand::SetStencilOp(op));
    }

    fn set_stencil_enabled(&mut self, enabled: bool) {
        self.record(DeviceCommand::SetStencilEnabled(enabled));
    }

    fn set_depth_func(&mut self, func: CompareFunc) {
        self.record(DeviceCommand::SetDepthFunc(func));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(DeviceCommand::SetDepthTest(enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.record(DeviceCommand::SetDepthWrite(enabled));
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.record(DeviceCommand::SetColorMask(mask));
    }

    fn set_blend_func(&mut self, func: BlendFuncState) {
        self.record(DeviceCommand::SetBlendFunc(func));
    }

    fn set_blend_equation(&mut self, equation: BlendEquation) {
        self.record(DeviceCommand::SetBlendEquation(equation));
    }

    fn set_blend_enabled(&mut self, enabled: bool) {
        self.record(DeviceCommand::SetBlendEnabled(enabled));
    }
}

impl GraphicsDevice for RecordingDevice {
    fn clear(&mut self, flags: ClearFlags) {
        self.record(DeviceCommand::Clear(flags));
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        self.record(DeviceCommand::BindProgram(program));
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget) {
        self.record(DeviceCommand::BindFramebuffer(target));
    }

    fn set_viewport(&mut self, left: u32, bottom: u32, width: u32, height: u32) {
        self.record(DeviceCommand::SetViewport { left, bottom, width, height });
    }

    fn upload_builtin_uniforms(&mut self, uniforms: &BuiltinUniforms) {
        self.record(DeviceCommand::UploadBuiltinUniforms(Box::new(uniforms.clone())));
    }

    fn upload_model_matrix(&mut self, model: &Mat4) {
        self.record(DeviceCommand::UploadModelMatrix(*model));
    }

    fn upload_material(&mut self, name: &str, _material: &Material) {
        self.record(DeviceCommand::UploadMaterial(name.to_string()));
    }

    fn draw_geometry(&mut self, geometry: GeometryHandle) {
        self.record(DeviceCommand::DrawGeometry(geometry));
    }
}
