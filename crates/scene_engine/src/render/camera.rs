//! # Scene Camera
//!
//! Cameras hold a view matrix and a projection. The view matrix is pushed in
//! by the scene graph during the world-transform refresh (the inverse of the
//! owning node's world transform), and the projection is recomputed whenever
//! the active viewport changes size.
//!
//! ## Coordinate System
//! Right-handed, Y-up view space looking down -Z, matching nalgebra's
//! `new_perspective` and `new_orthographic` conventions.

use log::trace;

use crate::foundation::math::{utils, Mat4};
use crate::render::backend::GraphicsDevice;
use crate::render::uniforms::BuiltinUniforms;

/// Default vertical field of view in degrees
pub const DEFAULT_FOVY_DEGREES: f32 = 60.0;

/// Default near clipping distance
pub const DEFAULT_NEAR: f32 = 0.001;

/// Default far clipping distance
pub const DEFAULT_FAR: f32 = 100.0;

/// How a camera's projection matrix is produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective frustum
    Perspective {
        /// Vertical field of view in degrees
        fovy_degrees: f32,
        /// Near clipping distance
        near: f32,
        /// Far clipping distance
        far: f32,
    },
    /// Orthographic box centered on the view axis
    Orthographic {
        /// Visible height in view units; width follows from the aspect ratio
        height: f32,
        /// Near clipping distance
        near: f32,
        /// Far clipping distance
        far: f32,
    },
    /// Caller-supplied matrix, left untouched on resize
    Custom(Mat4),
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective {
            fovy_degrees: DEFAULT_FOVY_DEGREES,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

/// A camera resource
///
/// # Lifecycle
/// 1. Registered in the [`ResourceManager`](crate::render::ResourceManager)
///    and optionally attached to a scene node.
/// 2. The scene refresh sets its view matrix each frame.
/// 3. When it becomes active, [`on_size`](Camera::on_size) adapts the
///    projection to the current viewport and [`activate`](Camera::activate)
///    publishes the matrices into the builtin uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection: Projection,
    aspect: f32,
    view: Mat4,
    proj: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Projection::default())
    }
}

impl Camera {
    /// Create a camera with the given projection and an aspect ratio of 1
    pub fn new(projection: Projection) -> Self {
        let mut camera = Self {
            projection,
            aspect: 1.0,
            view: Mat4::identity(),
            proj: Mat4::identity(),
        };
        camera.update_projection();
        camera
    }

    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `fovy_degrees` - Vertical field of view in degrees
    /// * `near` - Near clipping distance (must be > 0)
    /// * `far` - Far clipping distance (must be > near)
    pub fn perspective(fovy_degrees: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Perspective { fovy_degrees, near, far })
    }

    /// Create an orthographic camera showing `height` view units vertically
    pub fn orthographic(height: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Orthographic { height, near, far })
    }

    /// Current projection description
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Replace the projection description and recompute the matrix
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.update_projection();
    }

    /// Current aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// Set the world-to-view matrix
    ///
    /// Normally called by the scene graph with the inverse of the owning
    /// node's world transform.
    pub fn set_view_matrix(&mut self, view: Mat4) {
        self.view = view;
    }

    /// View-to-clip matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.proj
    }

    /// Adapt the projection to a viewport size in pixels
    ///
    /// A zero-sized viewport (minimized window) leaves the camera unchanged.
    pub fn on_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection();
        trace!("Camera aspect updated to {}", self.aspect);
    }

    /// Publish the camera matrices to the builtin uniform block and upload it
    pub fn activate<D: GraphicsDevice + ?Sized>(&self, uniforms: &mut BuiltinUniforms, device: &mut D) {
        uniforms.set_camera(&self.view, &self.proj);
        device.upload_builtin_uniforms(uniforms);
    }

    fn update_projection(&mut self) {
        self.proj = match self.projection {
            Projection::Perspective { fovy_degrees, near, far } => {
                Mat4::new_perspective(self.aspect, utils::deg_to_rad(fovy_degrees), near, far)
            }
            Projection::Orthographic { height, near, far } => {
                let half_height = height * 0.5;
                let half_width = half_height * self.aspect;
                Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, near, far)
            }
            Projection::Custom(matrix) => matrix,
        };
    }
}
