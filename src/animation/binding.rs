use std::sync::Arc;

use glam::{Quat, Vec4};

use crate::animation::clip::Animation;
use crate::animation::keys::KeyCursor;
use crate::errors::{Result, try_filled_vec};
use crate::scene::pose::LocalPose;
use crate::scene::skeleton::Skeleton;

/// Playback state of one [`Animation`] against one skeleton.
///
/// Holds the track → bone mapping resolved at bind time and the per-track
/// key cursors. Cursors live here rather than on the key arrays because the
/// same animation may be playing on many instances at once.
///
/// There is no paused state; a speed of zero holds the current frame.
#[derive(Debug, Clone)]
pub struct AnimationBinding {
    animation: Arc<Animation>,

    track_to_bone: Vec<Option<usize>>,
    position_cursors: Vec<KeyCursor>,
    orientation_cursors: Vec<KeyCursor>,

    playback_time: f32,
    speed: f32,
}

impl AnimationBinding {
    pub fn new(skeleton: &Skeleton, animation: Arc<Animation>) -> Result<Self> {
        let mut binding = Self {
            animation: Arc::clone(&animation),
            track_to_bone: Vec::new(),
            position_cursors: Vec::new(),
            orientation_cursors: Vec::new(),
            playback_time: 0.0,
            speed: 1.0,
        };
        binding.initialize(skeleton, animation)?;
        Ok(binding)
    }

    /// Rebinds to `animation`.
    ///
    /// Playback restarts at time zero with speed 1. On error the binding is
    /// left unchanged.
    pub fn initialize(&mut self, skeleton: &Skeleton, animation: Arc<Animation>) -> Result<()> {
        let track_count = animation.track_count();

        let mut track_to_bone = try_filled_vec(track_count, None, "animation track map")?;
        let position_cursors = try_filled_vec(track_count, KeyCursor::default(), "position cursors")?;
        let orientation_cursors =
            try_filled_vec(track_count, KeyCursor::default(), "orientation cursors")?;

        for (slot, track) in track_to_bone.iter_mut().zip(&animation.tracks) {
            *slot = skeleton.find_bone(&track.bone_name);
            if slot.is_none() {
                log::trace!(
                    "Animation '{}': track '{}' has no matching bone, ignored",
                    animation.name,
                    track.bone_name
                );
            }
        }

        if animation.duration <= 0.0 {
            log::warn!(
                "Animation '{}' has non-positive duration {}, playback will hold at time 0",
                animation.name,
                animation.duration
            );
        }

        self.track_to_bone = track_to_bone;
        self.position_cursors = position_cursors;
        self.orientation_cursors = orientation_cursors;

        log::debug!(
            "Animation '{}' bound: {}/{} tracks mapped to bones",
            animation.name,
            self.bound_track_count(),
            track_count
        );

        self.animation = animation;
        self.playback_time = 0.0;
        self.speed = 1.0;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn animation(&self) -> &Arc<Animation> {
        &self.animation
    }

    #[inline]
    #[must_use]
    pub fn playback_time(&self) -> f32 {
        self.playback_time
    }

    /// Sets the playback position, wrapped into `[0, duration)`.
    pub fn set_playback_time(&mut self, time: f32) {
        self.playback_time = wrap_time(time, self.animation.duration);
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Negative speeds play backwards.
    #[inline]
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    #[inline]
    #[must_use]
    pub fn bone_for_track(&self, track_index: usize) -> Option<usize> {
        self.track_to_bone.get(track_index).copied().flatten()
    }

    #[must_use]
    pub fn bound_track_count(&self) -> usize {
        self.track_to_bone.iter().filter(|b| b.is_some()).count()
    }

    /// Advances the clock by `dt * speed`, wrapping into `[0, duration)`.
    pub fn tick(&mut self, dt: f32) {
        self.playback_time = wrap_time(self.playback_time + dt * self.speed, self.animation.duration);
    }

    /// Overwrites the position and orientation of every bound bone with the
    /// looping sample at the current playback time.
    ///
    /// Only channels that carry keys are written, so a rotation-only track
    /// leaves the bone's position as it was. Bones without a track are
    /// untouched.
    pub fn sample_to_local_pose(&mut self, pose: &mut LocalPose) -> Result<()> {
        let time = self.playback_time;
        let duration = self.animation.duration;
        let forward = self.speed >= 0.0;

        let cursors = self.position_cursors.iter_mut().zip(self.orientation_cursors.iter_mut());
        let tracks = self.animation.tracks.iter().zip(&self.track_to_bone).zip(cursors);

        for ((track, bone), (position_cursor, orientation_cursor)) in tracks {
            let Some(bone) = *bone else {
                continue;
            };
            let slot = pose.get_mut(bone)?;

            if !track.positions.is_empty() {
                slot.position =
                    track.sample_position_looping(time, duration, Some(position_cursor), forward)?;
            }
            if !track.orientations.is_empty() {
                let sampled =
                    track.sample_orientation_looping(time, duration, Some(orientation_cursor), forward)?;
                // Degenerate keys (zero or non-finite) leave the previous orientation in place
                match Vec4::from(sampled).try_normalize() {
                    Some(q) => slot.orientation = Quat::from_vec4(q),
                    None => log::trace!(
                        "Animation '{}': degenerate orientation on track '{}' at t={time}",
                        self.animation.name,
                        track.bone_name
                    ),
                }
            }
        }

        Ok(())
    }
}

fn wrap_time(time: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    let wrapped = time.rem_euclid(duration);
    // rem_euclid can round up to `duration` for tiny negative inputs
    if wrapped >= duration { 0.0 } else { wrapped }
}
