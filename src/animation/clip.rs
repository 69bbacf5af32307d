use glam::{Quat, Vec3};

use crate::animation::keys::{AnimationKeyArray, KeyCursor};
use crate::animation::values::{quat_from_key, vec3_from_key};
use crate::errors::Result;

/// Position, orientation and scale keys targeting one bone by name.
///
/// Any of the three arrays may be empty; sampling an empty array yields the
/// neutral value for that channel (zero, identity, one).
#[derive(Debug, Clone, Default)]
pub struct AnimationTransformTrack {
    pub bone_name: String,
    pub positions: AnimationKeyArray<3>,
    /// Quaternions stored as `[x, y, z, w]`.
    pub orientations: AnimationKeyArray<4>,
    pub scales: AnimationKeyArray<3>,
}

impl AnimationTransformTrack {
    #[must_use]
    pub fn new(bone_name: impl Into<String>) -> Self {
        Self {
            bone_name: bone_name.into(),
            ..Default::default()
        }
    }

    /// Sorts all three key arrays. Only required for out-of-order source data.
    pub fn sort_keys(&mut self) -> Result<()> {
        self.positions.sort_keys()?;
        self.orientations.sort_keys()?;
        self.scales.sort_keys()
    }

    /// Latest key time over all channels.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        [
            self.positions.times().last(),
            self.orientations.times().last(),
            self.scales.times().last(),
        ]
        .into_iter()
        .flatten()
        .copied()
        .fold(0.0_f32, f32::max)
    }

    // ========================================================================
    // Clamped sampling
    // ========================================================================

    pub fn sample_position(&self, time: f32, cursor: Option<&mut KeyCursor>, forward: bool) -> Result<Vec3> {
        if self.positions.is_empty() {
            return Ok(Vec3::ZERO);
        }
        self.positions.sample(time, cursor, forward).map(vec3_from_key)
    }

    /// Returns the raw shortest-arc blend; callers normalize as needed.
    pub fn sample_orientation(&self, time: f32, cursor: Option<&mut KeyCursor>, forward: bool) -> Result<Quat> {
        if self.orientations.is_empty() {
            return Ok(Quat::IDENTITY);
        }
        self.orientations.sample_rotation(time, cursor, forward).map(quat_from_key)
    }

    pub fn sample_scale(&self, time: f32, cursor: Option<&mut KeyCursor>, forward: bool) -> Result<Vec3> {
        if self.scales.is_empty() {
            return Ok(Vec3::ONE);
        }
        self.scales.sample(time, cursor, forward).map(vec3_from_key)
    }

    // ========================================================================
    // Looping sampling
    // ========================================================================

    pub fn sample_position_looping(
        &self,
        time: f32,
        duration: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<Vec3> {
        if self.positions.is_empty() {
            return Ok(Vec3::ZERO);
        }
        self.positions
            .sample_looping(time, duration, cursor, forward)
            .map(vec3_from_key)
    }

    pub fn sample_orientation_looping(
        &self,
        time: f32,
        duration: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<Quat> {
        if self.orientations.is_empty() {
            return Ok(Quat::IDENTITY);
        }
        self.orientations
            .sample_rotation_looping(time, duration, cursor, forward)
            .map(quat_from_key)
    }

    pub fn sample_scale_looping(
        &self,
        time: f32,
        duration: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<Vec3> {
        if self.scales.is_empty() {
            return Ok(Vec3::ONE);
        }
        self.scales
            .sample_looping(time, duration, cursor, forward)
            .map(vec3_from_key)
    }
}

/// A named, timed collection of transform tracks.
///
/// Immutable once loaded and meant to be shared (`Arc<Animation>`) by every
/// skeleton instance that plays it.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<AnimationTransformTrack>,
}

impl Animation {
    #[must_use]
    pub fn new(name: impl Into<String>, duration: f32, tracks: Vec<AnimationTransformTrack>) -> Self {
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// Creates an animation whose duration is the latest key time of any track.
    #[must_use]
    pub fn from_tracks(name: impl Into<String>, tracks: Vec<AnimationTransformTrack>) -> Self {
        let duration = tracks
            .iter()
            .map(AnimationTransformTrack::end_time)
            .fold(0.0_f32, f32::max);

        Self::new(name, duration, tracks)
    }

    #[inline]
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    #[must_use]
    pub fn track(&self, index: usize) -> Option<&AnimationTransformTrack> {
        self.tracks.get(index)
    }

    #[must_use]
    pub fn find_track(&self, bone_name: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.bone_name == bone_name)
    }
}
