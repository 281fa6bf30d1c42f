//! Lights attached to scene nodes

use crate::foundation::math::{rbt_translation, utils, Mat4, Rbt, Vec3};
use crate::render::uniforms::BuiltinUniforms;

/// A light source driven by its scene node
pub trait Light {
    /// Receive the owning node's new world transform
    fn update_light_transform(&mut self, world: &Rbt);

    /// Write this light's values into the builtin uniform block
    fn update_uniforms(&self, uniforms: &mut BuiltinUniforms);
}

/// Point or directional light occupying one builtin uniform slot
///
/// Its view matrix looks along the node's -Z axis, which is what shadow-map
/// passes render from.
#[derive(Debug, Clone, PartialEq)]
pub struct PointDirLight {
    slot: usize,
    intensity: Vec3,
    position: Vec3,
    view: Mat4,
    proj: Mat4,
}

impl PointDirLight {
    /// Create a light writing to `slot`
    pub fn new(slot: usize, intensity: Vec3) -> Self {
        Self {
            slot,
            intensity,
            position: Vec3::zeros(),
            view: Mat4::identity(),
            proj: Mat4::identity(),
        }
    }

    /// Use a perspective shadow projection (builder pattern)
    pub fn with_perspective(mut self, fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        self.proj = Mat4::new_perspective(aspect, utils::deg_to_rad(fovy_degrees), near, far);
        self
    }

    /// Use an orthographic shadow projection (builder pattern)
    pub fn with_orthographic(mut self, width: f32, height: f32, near: f32, far: f32) -> Self {
        self.proj = Mat4::new_orthographic(-width * 0.5, width * 0.5, -height * 0.5, height * 0.5, near, far);
        self
    }

    /// Uniform slot
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// World position from the last transform update
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World-to-light matrix from the last transform update
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// Light intensity
    pub fn intensity(&self) -> Vec3 {
        self.intensity
    }

    /// Set the light intensity
    pub fn set_intensity(&mut self, intensity: Vec3) {
        self.intensity = intensity;
    }
}

impl Light for PointDirLight {
    fn update_light_transform(&mut self, world: &Rbt) {
        self.view = world.inverse().to_homogeneous();
        self.position = rbt_translation(world);
    }

    fn update_uniforms(&self, uniforms: &mut BuiltinUniforms) {
        uniforms.set_light(self.slot, self.position, self.intensity, &self.view, &self.proj);
    }
}
