//! Pipeline state values
//!
//! One value type per orthogonal pipeline axis, the [`StateCache`] snapshot
//! that mirrors what the device currently has applied, and the
//! [`RenderState`] sum type effects use to describe the states they need.

use crate::foundation::math::Vec4;
use crate::render::backend::StateDevice;
use crate::render::render_state_manager::RenderStateManager;

/// Winding order of front-facing triangles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FrontFace {
    /// Counter-clockwise
    #[default]
    CounterClockwise,
    /// Clockwise
    Clockwise,
}

/// Faces discarded when culling is enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CullFace {
    /// Front faces
    Front,
    /// Back faces
    #[default]
    Back,
    /// Both faces
    FrontAndBack,
}

/// Comparison used by depth and stencil tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    /// Never passes
    Never,
    /// Passes if the incoming value is less
    #[default]
    Less,
    /// Passes if equal
    Equal,
    /// Passes if less or equal
    LessEqual,
    /// Passes if greater
    Greater,
    /// Passes if not equal
    NotEqual,
    /// Passes if greater or equal
    GreaterEqual,
    /// Always passes
    Always,
}

/// Stencil buffer update action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StencilOp {
    /// Keep the current value
    #[default]
    Keep,
    /// Set to zero
    Zero,
    /// Replace with the reference value
    Replace,
    /// Increment, clamping at the maximum
    Increment,
    /// Increment, wrapping to zero
    IncrementWrap,
    /// Decrement, clamping at zero
    Decrement,
    /// Decrement, wrapping to the maximum
    DecrementWrap,
    /// Bitwise invert
    Invert,
}

/// Blend factor applied to source or destination color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Equation combining the weighted source and destination colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    /// `src + dst`
    #[default]
    Add,
    /// `src - dst`
    Subtract,
    /// `dst - src`
    ReverseSubtract,
    /// Component-wise minimum
    Min,
    /// Component-wise maximum
    Max,
}

/// Stencil test function, reference value and read mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFuncState {
    /// Comparison function
    pub func: CompareFunc,
    /// Reference value
    pub reference: i32,
    /// Mask applied to both reference and stored value
    pub mask: u32,
}

impl Default for StencilFuncState {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            reference: 1,
            mask: 0xff,
        }
    }
}

/// Stencil actions for the three test outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilOpState {
    /// Stencil test fails
    pub stencil_fail: StencilOp,
    /// Stencil passes, depth fails
    pub depth_fail: StencilOp,
    /// Both tests pass
    pub depth_pass: StencilOp,
}

/// Source and destination blend factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFuncState {
    /// Source factor
    pub src: BlendFactor,
    /// Destination factor
    pub dst: BlendFactor,
}

impl Default for BlendFuncState {
    fn default() -> Self {
        Self {
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
        }
    }
}

/// Per-channel color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl ColorMask {
    /// All channels writable
    pub const ALL: Self = Self { red: true, green: true, blue: true, alpha: true };
    /// No channel writable
    pub const NONE: Self = Self { red: false, green: false, blue: false, alpha: false };
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Snapshot of every pipeline axis
///
/// The default value matches the state a freshly created device context
/// reports, except that [`RenderStateManager::apply_current_state`] is still
/// required once at startup to make the two agree for certain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateCache {
    /// Clear color (RGBA)
    pub clear_color: Vec4,
    /// Front-face winding
    pub front_face: FrontFace,
    /// Culled faces
    pub cull_face: CullFace,
    /// Face culling enabled
    pub cull_enabled: bool,
    /// Stencil function
    pub stencil_func: StencilFuncState,
    /// Stencil operations
    pub stencil_op: StencilOpState,
    /// Stencil test enabled
    pub stencil_enabled: bool,
    /// Depth comparison
    pub depth_func: CompareFunc,
    /// Depth test enabled
    pub depth_test: bool,
    /// Depth writes enabled
    pub depth_write: bool,
    /// Color write mask
    pub color_mask: ColorMask,
    /// Blend factors
    pub blend_func: BlendFuncState,
    /// Blend equation
    pub blend_equation: BlendEquation,
    /// Blending enabled
    pub blend_enabled: bool,
}

impl Default for StateCache {
    fn default() -> Self {
        Self {
            clear_color: Vec4::zeros(),
            front_face: FrontFace::CounterClockwise,
            cull_face: CullFace::Back,
            cull_enabled: false,
            stencil_func: StencilFuncState::default(),
            stencil_op: StencilOpState::default(),
            stencil_enabled: false,
            depth_func: CompareFunc::Less,
            depth_test: false,
            depth_write: true,
            color_mask: ColorMask::ALL,
            blend_func: BlendFuncState::default(),
            blend_equation: BlendEquation::Add,
            blend_enabled: false,
        }
    }
}

/// A single pipeline state requirement
///
/// Effects carry a list of these and apply them through the state manager
/// when bound, so only real transitions reach the device.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub enum RenderState {
    ClearColor(Vec4),
    FrontFace(FrontFace),
    CullFace(CullFace),
    CullEnabled(bool),
    StencilFunc(StencilFuncState),
    StencilOp(StencilOpState),
    StencilEnabled(bool),
    DepthFunc(CompareFunc),
    DepthTest(bool),
    DepthWrite(bool),
    ColorMask(ColorMask),
    BlendFunc(BlendFuncState),
    BlendEquation(BlendEquation),
    BlendEnabled(bool),
}

impl RenderState {
    /// Apply this state through the manager's diffing setter
    pub fn apply<D: StateDevice + ?Sized>(
        &self,
        manager: &mut RenderStateManager,
        device: &mut D,
        force: bool,
    ) {
        match *self {
            Self::ClearColor(color) => manager.set_clear_color(device, color, force),
            Self::FrontFace(order) => manager.set_front_face(device, order, force),
            Self::CullFace(face) => manager.set_cull_face(device, face, force),
            Self::CullEnabled(enabled) => manager.set_cull_enabled(device, enabled, force),
            Self::StencilFunc(func) => manager.set_stencil_func(device, func, force),
            Self::StencilOp(op) => manager.set_stencil_op(device, op, force),
            Self::StencilEnabled(enabled) => manager.set_stencil_enabled(device, enabled, force),
            Self::DepthFunc(func) => manager.set_depth_func(device, func, force),
            Self::DepthTest(enabled) => manager.set_depth_test(device, enabled, force),
            Self::DepthWrite(enabled) => manager.set_depth_write(device, enabled, force),
            Self::ColorMask(mask) => manager.set_color_mask(device, mask, force),
            Self::BlendFunc(func) => manager.set_blend_func(device, func, force),
            Self::BlendEquation(equation) => manager.set_blend_equation(device, equation, force),
            Self::BlendEnabled(enabled) => manager.set_blend_enabled(device, enabled, force),
        }
    }

    /// Whether this state already holds in `cache`
    pub fn is_satisfied_by(&self, cache: &StateCache) -> bool {
        match *self {
            Self::ClearColor(color) => cache.clear_color == color,
            Self::FrontFace(order) => cache.front_face == order,
            Self::CullFace(face) => cache.cull_face == face,
            Self::CullEnabled(enabled) => cache.cull_enabled == enabled,
            Self::StencilFunc(func) => cache.stencil_func == func,
            Self::StencilOp(op) => cache.stencil_op == op,
            Self::StencilEnabled(enabled) => cache.stencil_enabled == enabled,
            Self::DepthFunc(func) => cache.depth_func == func,
            Self::DepthTest(enabled) => cache.depth_test == enabled,
            Self::DepthWrite(enabled) => cache.depth_write == enabled,
            Self::ColorMask(mask) => cache.color_mask == mask,
            Self::BlendFunc(func) => cache.blend_func == func,
            Self::BlendEquation(equation) => cache.blend_equation == equation,
            Self::BlendEnabled(enabled) => cache.blend_enabled == enabled,
        }
    }
}
