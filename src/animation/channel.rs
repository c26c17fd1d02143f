//! Keyframe channels and interpolation

use glam::{Quat, Vec3};

use crate::scene::Transform;

/// Which transform property a channel drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelPath {
    Translation,
    Rotation,
    Scale,
}

impl ChannelPath {
    /// Parse a glTF target path. Unsupported paths (morph weights)
    /// return None and the channel is skipped at load.
    pub fn parse(path: &str) -> Option<Self> {
        match path {
            "translation" => Some(Self::Translation),
            "rotation" => Some(Self::Rotation),
            "scale" => Some(Self::Scale),
            _ => None,
        }
    }

    /// Floats per keyframe sample.
    pub fn components(self) -> usize {
        match self {
            Self::Rotation => 4,
            _ => 3,
        }
    }
}

/// Where a sample time falls relative to a channel's keyframes.
enum Bracket {
    /// Clamped to a single keyframe (before the first, at/after the last)
    Hold(usize),
    /// Between keyframe i and i+1 with blend factor f in [0, 1]
    Blend(usize, f32),
}

/// One animation channel: timestamped samples of a single property on a
/// single node. Timestamps are strictly increasing (validated at load)
/// and `values` holds `components()` floats per timestamp.
#[derive(Clone, Debug)]
pub struct AnimationChannel {
    pub node: usize,
    pub path: ChannelPath,
    pub timestamps: Vec<f32>,
    pub values: Vec<f32>,
}

impl AnimationChannel {
    /// Timestamp of the last keyframe, 0 when empty.
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    fn bracket(&self, t: f32) -> Bracket {
        let count = self.timestamps.len();
        // Smallest index whose timestamp exceeds t
        let idx = self.timestamps.partition_point(|&ts| ts <= t);
        if idx == 0 {
            return Bracket::Hold(0);
        }
        if idx == count {
            return Bracket::Hold(count - 1);
        }

        let i = idx - 1;
        let t0 = self.timestamps[i];
        let t1 = self.timestamps[idx];
        let span = t1 - t0;
        // Guard the divide for degenerate spans
        let f = if span > 0.0 {
            ((t - t0) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Bracket::Blend(i, f)
    }

    fn key_vec3(&self, key: usize) -> Vec3 {
        let base = key * 3;
        Vec3::new(self.values[base], self.values[base + 1], self.values[base + 2])
    }

    fn key_quat(&self, key: usize) -> Quat {
        let base = key * 4;
        Quat::from_xyzw(
            self.values[base],
            self.values[base + 1],
            self.values[base + 2],
            self.values[base + 3],
        )
        .normalize()
    }

    fn sample_vec3(&self, t: f32) -> Vec3 {
        match self.bracket(t) {
            Bracket::Hold(key) => self.key_vec3(key),
            Bracket::Blend(key, f) => self.key_vec3(key).lerp(self.key_vec3(key + 1), f),
        }
    }

    fn sample_quat(&self, t: f32) -> Quat {
        match self.bracket(t) {
            Bracket::Hold(key) => self.key_quat(key),
            // glam's slerp takes the shorter arc
            Bracket::Blend(key, f) => self.key_quat(key).slerp(self.key_quat(key + 1), f),
        }
    }

    /// Sample at time `t` and overwrite the targeted property. Other
    /// properties of the transform are left untouched.
    pub fn apply(&self, t: f32, out: &mut Transform) {
        if self.timestamps.is_empty() {
            return;
        }
        match self.path {
            ChannelPath::Translation => out.translation = self.sample_vec3(t),
            ChannelPath::Rotation => out.rotation = self.sample_quat(t),
            ChannelPath::Scale => out.scale = self.sample_vec3(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation_channel() -> AnimationChannel {
        AnimationChannel {
            node: 0,
            path: ChannelPath::Translation,
            timestamps: vec![0.0, 1.0, 2.0],
            values: vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 20.0, 0.0],
        }
    }

    fn rotation_channel() -> AnimationChannel {
        // 0 to 90 degrees about Z over one second
        let q0 = Quat::IDENTITY;
        let q1 = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        AnimationChannel {
            node: 0,
            path: ChannelPath::Rotation,
            timestamps: vec![0.0, 1.0],
            values: vec![q0.x, q0.y, q0.z, q0.w, q1.x, q1.y, q1.z, q1.w],
        }
    }

    #[test]
    fn test_path_parse() {
        assert_eq!(ChannelPath::parse("translation"), Some(ChannelPath::Translation));
        assert_eq!(ChannelPath::parse("rotation"), Some(ChannelPath::Rotation));
        assert_eq!(ChannelPath::parse("scale"), Some(ChannelPath::Scale));
        assert_eq!(ChannelPath::parse("weights"), None);
    }

    #[test]
    fn test_hold_before_first_keyframe() {
        let ch = translation_channel();
        let mut t = Transform::IDENTITY;
        ch.apply(-0.5, &mut t);
        assert_eq!(t.translation, Vec3::ZERO);
    }

    #[test]
    fn test_hold_after_last_keyframe() {
        let ch = translation_channel();
        let mut t = Transform::IDENTITY;
        ch.apply(5.0, &mut t);
        assert_eq!(t.translation, Vec3::new(10.0, 20.0, 0.0));
    }

    #[test]
    fn test_linear_blend_between_keyframes() {
        let ch = translation_channel();
        let mut t = Transform::IDENTITY;
        ch.apply(0.5, &mut t);
        assert!((t.translation - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);

        ch.apply(1.5, &mut t);
        assert!((t.translation - Vec3::new(10.0, 10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_exact_keyframe_time() {
        let ch = translation_channel();
        let mut t = Transform::IDENTITY;
        ch.apply(1.0, &mut t);
        assert!((t.translation - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_single_keyframe_holds_constant() {
        let ch = AnimationChannel {
            node: 0,
            path: ChannelPath::Scale,
            timestamps: vec![0.25],
            values: vec![2.0, 2.0, 2.0],
        };
        for t in [-1.0, 0.0, 0.25, 3.0] {
            let mut out = Transform::IDENTITY;
            ch.apply(t, &mut out);
            assert_eq!(out.scale, Vec3::splat(2.0));
        }
    }

    #[test]
    fn test_rotation_midpoint_is_45_degrees() {
        let ch = rotation_channel();
        let mut t = Transform::IDENTITY;
        ch.apply(0.5, &mut t);

        let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        assert!(t.rotation.angle_between(expected) < 1e-4);
    }

    #[test]
    fn test_slerp_result_is_unit_length() {
        let ch = rotation_channel();
        for i in 0..=10 {
            let mut t = Transform::IDENTITY;
            ch.apply(i as f32 / 10.0, &mut t);
            assert!((t.rotation.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_apply_only_touches_target_property() {
        let ch = translation_channel();
        let mut t = Transform {
            rotation: Quat::from_rotation_y(1.0),
            scale: Vec3::splat(3.0),
            ..Transform::IDENTITY
        };
        ch.apply(0.5, &mut t);
        assert_eq!(t.scale, Vec3::splat(3.0));
        assert!(t.rotation.angle_between(Quat::from_rotation_y(1.0)) < 1e-6);
    }

    #[test]
    fn test_channel_duration() {
        assert_eq!(translation_channel().duration(), 2.0);
    }
}
