//! Keyframe animation and skeletal skinning

pub mod channel;
pub mod clip;
pub mod player;
pub mod skinning;

pub use channel::{AnimationChannel, ChannelPath};
pub use clip::AnimationClip;
pub use player::{PlaybackState, Player};
pub use skinning::{MAX_JOINTS, compute_bone_matrices};
