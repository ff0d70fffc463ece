//! Rigid pose (translation, rotation, scale) used for parts and anchors

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Pose in 3D space, relative to a parent frame
///
/// Serialized as `translation = [x, y, z]`, `rotation = [x, y, z, w]`
/// (unit quaternion) and `scale = [x, y, z]`. Missing fields default to
/// the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default = "default_translation")]
    pub translation: Vec3,
    #[serde(default = "default_rotation")]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

fn default_translation() -> Vec3 {
    Vec3::ZERO
}

fn default_rotation() -> Quat {
    Quat::IDENTITY
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Compose a child pose expressed in this frame into this frame's parent
    pub fn mul_pose(&self, child: &Pose) -> Pose {
        Pose {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Express this pose relative to `parent` (inverse of [`Pose::mul_pose`])
    ///
    /// Exact for uniform parent scale; non-uniform scale combined with
    /// rotation has no exact inverse in TRS form.
    pub fn relative_to(&self, parent: &Pose) -> Pose {
        let inv_rotation = parent.rotation.inverse();
        Pose {
            translation: (inv_rotation * (self.translation - parent.translation)) / parent.scale,
            rotation: inv_rotation * self.rotation,
            scale: self.scale / parent.scale,
        }
    }

    /// True when translation, rotation and scale agree within `epsilon`
    pub fn abs_diff_eq(&self, other: &Pose, epsilon: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, epsilon)
            && self.rotation.abs_diff_eq(other.rotation, epsilon)
            && self.scale.abs_diff_eq(other.scale, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_and_relative_round_trip() {
        let parent = Pose::from_translation(Vec3::new(1.0, 2.0, 0.0))
            .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2))
            .with_scale(Vec3::splat(2.0));
        let child = Pose::from_translation(Vec3::new(0.5, 0.0, 0.0));

        let world = parent.mul_pose(&child);
        assert!(world.translation.abs_diff_eq(Vec3::new(1.0, 3.0, 0.0), 1e-5));

        let local = world.relative_to(&parent);
        assert!(local.abs_diff_eq(&child, 1e-5));
    }

    #[test]
    fn test_missing_fields_default_to_identity() {
        let pose: Pose = serde_json::from_str(r#"{"translation": [1.0, 0.0, 0.0]}"#).unwrap();
        assert_eq!(pose.translation, Vec3::X);
        assert_eq!(pose.rotation, Quat::IDENTITY);
        assert_eq!(pose.scale, Vec3::ONE);
    }
}
