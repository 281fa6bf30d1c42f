//! Shading effects

use crate::render::backend::ProgramHandle;
use crate::render::render_state::RenderState;

/// A shader program together with the pipeline states it requires
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    /// Program bound when the effect becomes active
    pub program: ProgramHandle,
    /// States applied, diffed, before binding the program
    pub render_states: Vec<RenderState>,
}

impl Effect {
    /// Create an effect with no state requirements
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            render_states: Vec::new(),
        }
    }

    /// Add a state requirement (builder pattern)
    pub fn with_state(mut self, state: RenderState) -> Self {
        self.render_states.push(state);
        self
    }
}
