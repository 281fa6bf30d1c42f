//! Named render resources

use log::warn;

use crate::foundation::collections::{new_key_type, Registry};
use crate::foundation::math::Mat4;
use crate::render::camera::Camera;
use crate::render::effect::Effect;
use crate::render::framebuffer::Framebuffer;
use crate::render::material::Material;
use crate::scene::CameraSink;

new_key_type! {
    /// Handle to a registered [`Effect`]
    pub struct EffectId;
    /// Handle to a registered [`Camera`]
    pub struct CameraId;
    /// Handle to a registered [`Framebuffer`]
    pub struct FramebufferId;
    /// Handle to a registered [`Material`]
    pub struct MaterialId;
}

/// Registries for every resource kind the orchestrator resolves by name
#[derive(Default)]
pub struct ResourceManager {
    /// Shading effects
    pub effects: Registry<EffectId, Effect>,
    /// Cameras
    pub cameras: Registry<CameraId, Camera>,
    /// Framebuffers, including the screen
    pub framebuffers: Registry<FramebufferId, Framebuffer>,
    /// Materials
    pub materials: Registry<MaterialId, Material>,
}

impl ResourceManager {
    /// Create empty registries
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every registered resource
    pub fn release(&mut self) {
        self.effects.clear();
        self.cameras.clear();
        self.framebuffers.clear();
        self.materials.clear();
    }
}

impl CameraSink for ResourceManager {
    fn set_view_matrix(&mut self, camera: CameraId, view: Mat4) {
        match self.cameras.get_mut(camera) {
            Some(target) => target.set_view_matrix(view),
            None => warn!("Scene node references a released camera {:?}", camera),
        }
    }
}
