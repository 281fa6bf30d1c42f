//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph and the
//! frame orchestrator. Everything is a thin alias over nalgebra so callers
//! can use the full nalgebra API directly.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Isometry3, Translation3,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Rigid-body transform: a translation plus a rotation, no scale or shear
///
/// Composes with `*` (`a * b` applies `b` first, then `a`) and inverts with
/// [`Isometry3::inverse`].
pub type Rbt = Isometry3<f32>;

/// Build a rigid-body transform from a translation and a rotation
pub fn rbt_from_parts(translation: Vec3, rotation: Quat) -> Rbt {
    Rbt::from_parts(Translation3::from(translation), rotation)
}

/// Translation component of a rigid-body transform
pub fn rbt_translation(rbt: &Rbt) -> Vec3 {
    rbt.translation.vector
}

/// Model matrix for a world transform with a trailing non-uniform scale
///
/// Equivalent to `T * R * S`: the scale is applied in the node's local frame
/// before the rigid-body transform.
pub fn model_matrix(rbt: &Rbt, scale: &Vec3) -> Mat4 {
    rbt.to_homogeneous() * Mat4::new_nonuniform_scaling(scale)
}

/// Divide a vector component-wise by a scale vector
///
/// Components whose divisor is zero are passed through unchanged, since a
/// collapsed axis carries no information to recover.
pub fn divide_by_scale(value: &Vec3, scale: &Vec3) -> Vec3 {
    let mut result = *value;
    for axis in 0..3 {
        if scale[axis] == 0.0 {
            log::warn!("Zero scale on axis {} while back-solving a local transform", axis);
        } else {
            result[axis] /= scale[axis];
        }
    }
    result
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}
