//! Animation clips

use super::AnimationChannel;
use crate::document::Document;
use crate::scene::Pose;

/// A named animation clip: a set of channels over the document's nodes.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<AnimationChannel>,
    pub duration: f32,
}

impl AnimationClip {
    /// Build a clip; duration is the maximum timestamp across channels.
    pub fn new(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        let duration = channels
            .iter()
            .map(AnimationChannel::duration)
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            channels,
            duration,
        }
    }

    /// Sample the clip at `elapsed` seconds into a fresh pose.
    ///
    /// Starts from the base pose and lets each channel overwrite only
    /// the property it targets, so unanimated properties keep their
    /// authored values (reset-then-apply, never incremental).
    pub fn sample_pose(&self, doc: &Document, elapsed: f32) -> Pose {
        let mut pose = Pose::base(doc);
        for channel in &self.channels {
            if let Some(transform) = pose.get_mut(channel.node) {
                channel.apply(elapsed, transform);
            }
        }
        pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ChannelPath;
    use crate::document::test_support::document_with_chain;
    use glam::Vec3;

    fn chain_doc() -> Document {
        document_with_chain(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)])
    }

    fn move_channel(node: usize) -> AnimationChannel {
        AnimationChannel {
            node,
            path: ChannelPath::Translation,
            timestamps: vec![0.0, 2.0],
            values: vec![0.0, 0.0, 0.0, 8.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_duration_is_max_across_channels() {
        let short = AnimationChannel {
            timestamps: vec![0.0, 0.5],
            values: vec![0.0; 6],
            ..move_channel(0)
        };
        let clip = AnimationClip::new("walk", vec![short, move_channel(1)]);
        assert_eq!(clip.duration, 2.0);
    }

    #[test]
    fn test_sample_pose_overwrites_target_only() {
        let doc = chain_doc();
        let clip = AnimationClip::new("walk", vec![move_channel(0)]);

        let pose = clip.sample_pose(&doc, 1.0);
        // Node 0 is animated to the channel midpoint
        assert!((pose.get(0).unwrap().translation - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-5);
        // Node 1 keeps its base transform
        assert_eq!(pose.get(1).unwrap().translation, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_out_of_range_channel_node_ignored() {
        let doc = chain_doc();
        let clip = AnimationClip::new("bad", vec![move_channel(9)]);
        let pose = clip.sample_pose(&doc, 1.0);
        assert_eq!(pose.len(), 2);
        assert_eq!(pose.get(0).unwrap().translation, Vec3::new(1.0, 0.0, 0.0));
    }
}
