//! CPU mirror of the builtin uniform block

use log::warn;

use crate::foundation::math::{Mat4, Vec2, Vec3};

/// Number of light slots in the builtin block
pub const MAX_LIGHTS: usize = 4;

/// Values every program can read without declaring them per material
///
/// Cameras write the view and projection entries when activated, lights
/// write their slot during the per-frame light refresh and the engine writes
/// the timing entries in its update step.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinUniforms {
    /// World to view
    pub view: Mat4,
    /// View to world
    pub view_inv: Mat4,
    /// View to clip
    pub proj: Mat4,
    /// Clip to view
    pub proj_inv: Mat4,
    /// World to clip
    pub proj_view: Mat4,
    /// Per-slot light view matrices
    pub light_view: [Mat4; MAX_LIGHTS],
    /// Per-slot light projection matrices
    pub light_proj: [Mat4; MAX_LIGHTS],
    /// Per-slot light world positions
    pub light_pos: [Vec3; MAX_LIGHTS],
    /// Per-slot light intensities
    pub light_intensity: [Vec3; MAX_LIGHTS],
    /// Active viewport size in pixels
    pub viewport_size: Vec2,
    /// Seconds since start
    pub time: f32,
    /// Seconds since the previous frame
    pub delta_time: f32,
}

impl Default for BuiltinUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::identity(),
            view_inv: Mat4::identity(),
            proj: Mat4::identity(),
            proj_inv: Mat4::identity(),
            proj_view: Mat4::identity(),
            light_view: [Mat4::identity(); MAX_LIGHTS],
            light_proj: [Mat4::identity(); MAX_LIGHTS],
            light_pos: [Vec3::zeros(); MAX_LIGHTS],
            light_intensity: [Vec3::zeros(); MAX_LIGHTS],
            viewport_size: Vec2::zeros(),
            time: 0.0,
            delta_time: 0.0,
        }
    }
}

impl BuiltinUniforms {
    /// Write the camera matrices, deriving the inverses and the product
    pub fn set_camera(&mut self, view: &Mat4, proj: &Mat4) {
        self.view = *view;
        self.view_inv = view.try_inverse().unwrap_or_else(Mat4::identity);
        self.proj = *proj;
        self.proj_inv = proj.try_inverse().unwrap_or_else(Mat4::identity);
        self.proj_view = proj * view;
    }

    /// Write one light slot
    ///
    /// Returns false, leaving the block untouched, when `slot` is out of range.
    pub fn set_light(&mut self, slot: usize, position: Vec3, intensity: Vec3, view: &Mat4, proj: &Mat4) -> bool {
        if slot >= MAX_LIGHTS {
            warn!("Light slot {} exceeds the {} builtin slots", slot, MAX_LIGHTS);
            return false;
        }
        self.light_pos[slot] = position;
        self.light_intensity[slot] = intensity;
        self.light_view[slot] = *view;
        self.light_proj[slot] = *proj;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_set_camera_derives_inverse_and_product() {
        let mut uniforms = BuiltinUniforms::default();
        let view = Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0));
        let proj = Mat4::new_scaling(2.0);

        uniforms.set_camera(&view, &proj);

        assert_relative_eq!(uniforms.view_inv, Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0)));
        assert_relative_eq!(uniforms.proj_view, proj * view);
    }

    #[test]
    fn test_set_light_rejects_out_of_range_slot() {
        let mut uniforms = BuiltinUniforms::default();
        let identity = Mat4::identity();

        assert!(!uniforms.set_light(MAX_LIGHTS, Vec3::x(), Vec3::x(), &identity, &identity));
        assert!(uniforms.set_light(1, Vec3::x(), Vec3::y(), &identity, &identity));
        assert_eq!(uniforms.light_pos[1], Vec3::x());
    }
}
