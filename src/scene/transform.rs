//! TRS transforms

use glam::{Mat4, Quat, Vec3};

/// Local transform of a node relative to its parent, kept as separate
/// translation / rotation / scale components so animation channels can
/// overwrite one property without touching the others.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Compose into a matrix, translate * rotate * scale order.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(Transform::IDENTITY.to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn test_trs_composition_order() {
        // Scale must apply before rotation, rotation before translation
        let t = Transform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let m = t.to_mat4();
        // Point (1, 0, 0): scaled to (2, 0, 0), rotated to (0, 2, 0),
        // translated to (1, 2, 0)
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_translation_component() {
        let t = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            ..Transform::IDENTITY
        };
        let translation = t.to_mat4().w_axis.truncate();
        assert!((translation - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }
}
