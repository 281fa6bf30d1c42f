//! Diffing front-end for pipeline state
//!
//! [`RenderStateManager`] keeps a write-through mirror of the device state.
//! Each setter compares the requested value with the mirror and only reaches
//! the device on an actual transition (or when forced). A snapshot stack
//! supports scoped changes via [`push_state`](RenderStateManager::push_state)
//! and [`pop_state`](RenderStateManager::pop_state).
//!
//! The mirror must always equal what the device has applied. Changing device
//! state behind the manager's back leaves the two out of sync until the next
//! forced apply.

use log::{trace, warn};

use crate::foundation::math::Vec4;
use crate::render::backend::StateDevice;
use crate::render::render_state::{
    BlendEquation, BlendFuncState, ColorMask, CompareFunc, CullFace, FrontFace,
    StateCache, StencilFuncState, StencilOpState,
};

/// Tracks applied pipeline state and filters redundant changes
#[derive(Debug, Default)]
pub struct RenderStateManager {
    current: StateCache,
    stack: Vec<StateCache>,
}

impl RenderStateManager {
    /// Create a manager whose mirror holds the default device state
    pub fn new() -> Self {
        Self::default()
    }

    /// The state the device currently has applied
    pub fn current(&self) -> &StateCache {
        &self.current
    }

    /// Number of saved snapshots
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Set the clear color
    pub fn set_clear_color<D: StateDevice + ?Sized>(&mut self, device: &mut D, color: Vec4, force: bool) {
        if force || self.current.clear_color != color {
            device.set_clear_color(color);
            self.current.clear_color = color;
        }
    }

    /// Set the front-face winding
    pub fn set_front_face<D: StateDevice + ?Sized>(&mut self, device: &mut D, order: FrontFace, force: bool) {
        if force || self.current.front_face != order {
            device.set_front_face(order);
            self.current.front_face = order;
        }
    }

    /// Set which faces are culled
    pub fn set_cull_face<D: StateDevice + ?Sized>(&mut self, device: &mut D, face: CullFace, force: bool) {
        if force || self.current.cull_face != face {
            device.set_cull_face(face);
            self.current.cull_face = face;
        }
    }

    /// Enable or disable face culling
    pub fn set_cull_enabled<D: StateDevice + ?Sized>(&mut self, device: &mut D, enabled: bool, force: bool) {
        if force || self.current.cull_enabled != enabled {
            device.set_cull_enabled(enabled);
            self.current.cull_enabled = enabled;
        }
    }

    /// Set the stencil function, reference and mask
    pub fn set_stencil_func<D: StateDevice + ?Sized>(&mut self, device: &mut D, func: StencilFuncState, force: bool) {
        if force || self.current.stencil_func != func {
            device.set_stencil_func(func);
            self.current.stencil_func = func;
        }
    }

    /// Set the stencil operations
    ///
    /// A difference in any of the three outcomes counts as a transition.
    pub fn set_stencil_op<D: StateDevice + ?Sized>(&mut self, device: &mut D, op: StencilOpState, force: bool) {
        if force || self.current.stencil_op != op {
            device.set_stencil_op(op);
            self.current.stencil_op = op;
        }
    }

    /// Enable or disable the stencil test
    pub fn set_stencil_enabled<D: StateDevice + ?Sized>(&mut self, device: &mut D, enabled: bool, force: bool) {
        if force || self.current.stencil_enabled != enabled {
            device.set_stencil_enabled(enabled);
            self.current.stencil_enabled = enabled;
        }
    }

    /// Set the depth comparison
    pub fn set_depth_func<D: StateDevice + ?Sized>(&mut self, device: &mut D, func: CompareFunc, force: bool) {
        if force || self.current.depth_func != func {
            device.set_depth_func(func);
            self.current.depth_func = func;
        }
    }

    /// Enable or disable the depth test
    pub fn set_depth_test<D: StateDevice + ?Sized>(&mut self, device: &mut D, enabled: bool, force: bool) {
        if force || self.current.depth_test != enabled {
            device.set_depth_test(enabled);
            self.current.depth_test = enabled;
        }
    }

    /// Enable or disable depth writes
    pub fn set_depth_write<D: StateDevice + ?Sized>(&mut self, device: &mut D, enabled: bool, force: bool) {
        if force || self.current.depth_write != enabled {
            device.set_depth_write(enabled);
            self.current.depth_write = enabled;
        }
    }

    /// Set the color write mask
    pub fn set_color_mask<D: StateDevice + ?Sized>(&mut self, device: &mut D, mask: ColorMask, force: bool) {
        if force || self.current.color_mask != mask {
            device.set_color_mask(mask);
            self.current.color_mask = mask;
        }
    }

    /// Set the blend factors
    pub fn set_blend_func<D: StateDevice + ?Sized>(&mut self, device: &mut D, func: BlendFuncState, force: bool) {
        if force || self.current.blend_func != func {
            device.set_blend_func(func);
            self.current.blend_func = func;
        }
    }

    /// Set the blend equation
    pub fn set_blend_equation<D: StateDevice + ?Sized>(&mut self, device: &mut D, equation: BlendEquation, force: bool) {
        if force || self.current.blend_equation != equation {
            device.set_blend_equation(equation);
            self.current.blend_equation = equation;
        }
    }

    /// Enable or disable blending
    pub fn set_blend_enabled<D: StateDevice + ?Sized>(&mut self, device: &mut D, enabled: bool, force: bool) {
        if force || self.current.blend_enabled != enabled {
            device.set_blend_enabled(enabled);
            self.current.blend_enabled = enabled;
        }
    }

    /// Save the current state; no device effect
    pub fn push_state(&mut self) {
        self.stack.push(self.current);
    }

    /// Restore the most recently pushed state
    ///
    /// Every axis is re-applied with `force`, so the device matches the
    /// snapshot even if something changed it out of band. Returns false when
    /// the stack is empty.
    pub fn pop_state<D: StateDevice + ?Sized>(&mut self, device: &mut D) -> bool {
        let Some(saved) = self.stack.pop() else {
            warn!("pop_state called with an empty state stack");
            return false;
        };
        self.apply(device, &saved, true);
        true
    }

    /// Force every axis of the current mirror onto the device
    pub fn apply_current_state<D: StateDevice + ?Sized>(&mut self, device: &mut D) {
        trace!("Forcing full pipeline state onto device");
        let current = self.current;
        self.apply(device, &current, true);
    }

    /// Apply a whole snapshot through the diffing setters
    pub fn apply<D: StateDevice + ?Sized>(&mut self, device: &mut D, state: &StateCache, force: bool) {
        self.set_clear_color(device, state.clear_color, force);
        self.set_front_face(device, state.front_face, force);
        self.set_cull_face(device, state.cull_face, force);
        self.set_cull_enabled(device, state.cull_enabled, force);
        self.set_stencil_func(device, state.stencil_func, force);
        self.set_stencil_op(device, state.stencil_op, force);
        self.set_stencil_enabled(device, state.stencil_enabled, force);
        self.set_depth_func(device, state.depth_func, force);
        self.set_depth_test(device, state.depth_test, force);
        self.set_depth_write(device, state.depth_write, force);
        self.set_color_mask(device, state.color_mask, force);
        self.set_blend_func(device, state.blend_func, force);
        self.set_blend_equation(device, state.blend_equation, force);
        self.set_blend_enabled(device, state.blend_enabled, force);
    }
}
