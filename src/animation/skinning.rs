//! Bone matrix computation for skinned meshes

use glam::Mat4;

use crate::document::{Document, Skin};
use crate::scene::{Pose, global_transform};

/// Fixed joint-matrix capacity of the renderer. Skins larger than this
/// are rejected at load time rather than silently truncated.
pub const MAX_JOINTS: usize = 128;

/// Compute one skinning matrix per joint:
/// `global_transform(joint) * inverse_bind_matrix`.
///
/// The order is mandatory: the inverse bind matrix takes a vertex from
/// model space into the joint's bind-pose space, then the joint's global
/// transform places it in the currently animated pose. Recomputed for
/// every referencing mesh every frame; no cross-mesh caching.
pub fn compute_bone_matrices(doc: &Document, pose: &Pose, skin: &Skin) -> Vec<Mat4> {
    skin.joints
        .iter()
        .zip(skin.inverse_bind.iter())
        .map(|(&joint, inverse_bind)| global_transform(doc, pose, joint) * *inverse_bind)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationChannel, AnimationClip, ChannelPath};
    use crate::document::test_support::{document_with_chain, two_joint_rig};
    use glam::{Quat, Vec3};

    #[test]
    fn test_identity_inverse_bind_yields_global_transforms() {
        let doc = document_with_chain(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)]);
        let skin = Skin {
            joints: vec![0, 1],
            inverse_bind: vec![Mat4::IDENTITY, Mat4::IDENTITY],
        };
        let pose = Pose::base(&doc);

        let bones = compute_bone_matrices(&doc, &pose, &skin);
        assert_eq!(bones.len(), 2);
        assert_eq!(bones[0], global_transform(&doc, &pose, 0));
        assert_eq!(bones[1], global_transform(&doc, &pose, 1));
    }

    #[test]
    fn test_inverse_bind_applied_before_global() {
        let doc = document_with_chain(&[Vec3::new(3.0, 0.0, 0.0)]);
        let inverse_bind = Mat4::from_translation(Vec3::new(-3.0, 0.0, 0.0));
        let skin = Skin {
            joints: vec![0],
            inverse_bind: vec![inverse_bind],
        };
        let pose = Pose::base(&doc);

        let bones = compute_bone_matrices(&doc, &pose, &skin);
        // In bind pose, global * inverse_bind cancels to identity
        let p = bones[0].transform_point3(Vec3::new(5.0, 1.0, 0.0));
        assert!((p - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_two_joint_rig_rotation_midpoint() {
        // Joint 0 rotates 0 to 90 degrees about Z over one second; joint 1
        // is an unanimated sibling root. Identity inverse binds.
        let (doc, skin) = two_joint_rig();

        let q_end = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let channel = AnimationChannel {
            node: 0,
            path: ChannelPath::Rotation,
            timestamps: vec![0.0, 1.0],
            values: vec![0.0, 0.0, 0.0, 1.0, q_end.x, q_end.y, q_end.z, q_end.w],
        };
        let clip = AnimationClip::new("spin", vec![channel]);

        let pose = clip.sample_pose(&doc, 0.5);
        let bones = compute_bone_matrices(&doc, &pose, &skin);

        let expected = Mat4::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));
        let diff = (bones[0] - expected).abs();
        assert!(diff.to_cols_array().iter().all(|&v| v < 1e-4));

        assert_eq!(bones[1], Mat4::IDENTITY);
    }
}
