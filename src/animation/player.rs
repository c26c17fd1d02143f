//! Animation playback state machine

use crate::core::Error;
use crate::document::Document;
use crate::scene::Pose;

/// Playback state. Owned exclusively by the render thread; external
/// play/stop requests arrive through a command channel, never by
/// direct mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackState {
    Stopped,
    Playing {
        /// Index into the document's clip list
        clip: usize,
        /// Clock value (seconds) when playback started
        start: f32,
        looping: bool,
    },
}

/// Advances one active clip at a time and produces per-tick poses.
pub struct Player {
    state: PlaybackState,
}

impl Player {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// Start a clip by name. An unknown name reports the available clips
    /// and leaves the current state untouched.
    pub fn play(
        &mut self,
        doc: &Document,
        name: &str,
        looping: bool,
        now: f32,
    ) -> Result<(), Error> {
        let clip = doc
            .find_animation(name)
            .ok_or_else(|| Error::AnimationNotFound {
                name: name.to_string(),
                available: doc.animation_names(),
            })?;
        log::info!("playing animation: {name} (loop: {looping})");
        self.state = PlaybackState::Playing {
            clip,
            start: now,
            looping,
        };
        Ok(())
    }

    /// Stop playback; the next pose is the base pose.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Compute the pose for the current tick.
    ///
    /// Looping wraps elapsed time into [0, duration). A non-looping clip
    /// that has run past its duration transitions to `Stopped` and
    /// yields the base pose immediately, not a freeze on the final pose.
    pub fn current_pose(&mut self, doc: &Document, now: f32) -> Pose {
        match self.state {
            PlaybackState::Stopped => Pose::base(doc),
            PlaybackState::Playing {
                clip,
                start,
                looping,
            } => {
                let Some(clip) = doc.animations.get(clip) else {
                    self.state = PlaybackState::Stopped;
                    return Pose::base(doc);
                };

                let mut elapsed = now - start;
                if looping {
                    elapsed = if clip.duration > 0.0 {
                        elapsed.rem_euclid(clip.duration)
                    } else {
                        0.0
                    };
                } else if elapsed > clip.duration {
                    self.state = PlaybackState::Stopped;
                    return Pose::base(doc);
                }

                clip.sample_pose(doc, elapsed)
            }
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_support::document_with_clip;
    use glam::Vec3;

    // The shared fixture animates node 0 from x=0 to x=10 over 1 second;
    // node 0's base translation is (1, 0, 0).

    #[test]
    fn test_stopped_yields_base_pose() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        let pose = player.current_pose(&doc, 3.0);
        assert_eq!(pose.get(0).unwrap().translation, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_play_unknown_name_lists_available() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        let err = player.play(&doc, "run", false, 0.0).unwrap_err();
        match err {
            Error::AnimationNotFound { name, available } => {
                assert_eq!(name, "run");
                assert_eq!(available, vec!["walk".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!player.is_playing());
    }

    #[test]
    fn test_play_miss_leaves_state_unchanged() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        player.play(&doc, "walk", true, 0.0).unwrap();
        assert!(player.play(&doc, "sprint", false, 0.5).is_err());
        assert!(player.is_playing());
    }

    #[test]
    fn test_playing_samples_at_elapsed() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        player.play(&doc, "walk", false, 10.0).unwrap();

        let pose = player.current_pose(&doc, 10.5);
        assert!((pose.get(0).unwrap().translation.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_loop_wraps_elapsed_time() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        player.play(&doc, "walk", true, 0.0).unwrap();

        // Duration 1.0, sample at 2.25 -> wrapped to 0.25
        let pose = player.current_pose(&doc, 2.25);
        assert!(player.is_playing());
        assert!((pose.get(0).unwrap().translation.x - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_loop_just_past_duration_stays_playing() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        player.play(&doc, "walk", true, 0.0).unwrap();

        let pose = player.current_pose(&doc, 1.0 + 1e-3);
        assert!(player.is_playing());
        // Wrapped near zero, so close to the first keyframe
        assert!(pose.get(0).unwrap().translation.x < 0.5);
    }

    #[test]
    fn test_non_loop_past_duration_stops_and_resets() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        player.play(&doc, "walk", false, 0.0).unwrap();

        let pose = player.current_pose(&doc, 1.5);
        assert_eq!(player.state(), PlaybackState::Stopped);
        // Base pose restored, not frozen on the last keyframe
        assert_eq!(pose.get(0).unwrap().translation, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_stop_resets_to_base() {
        let doc = document_with_clip("walk");
        let mut player = Player::new();
        player.play(&doc, "walk", true, 0.0).unwrap();
        player.current_pose(&doc, 0.5);

        player.stop();
        let pose = player.current_pose(&doc, 0.6);
        assert!(!player.is_playing());
        assert_eq!(pose.get(0).unwrap().translation, Vec3::new(1.0, 0.0, 0.0));
    }
}
