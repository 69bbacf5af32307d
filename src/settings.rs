//! Animation Settings
//!
//! Per-character defaults applied when a [`SkeletonInstance`] is created
//! through [`SkeletonInstance::with_settings`].
//!
//! ```rust,ignore
//! use myth_skeletal::settings::{AnimationSettings, PalettePrecision};
//!
//! let settings = AnimationSettings::from_json_str(
//!     r#"{ "playback_speed": 0.5, "palette_precision": "half" }"#,
//! )?;
//! assert_eq!(settings.mesh_binding_count, 0);
//! ```
//!
//! [`SkeletonInstance`]: crate::scene::instance::SkeletonInstance
//! [`SkeletonInstance::with_settings`]: crate::scene::instance::SkeletonInstance::with_settings
//! [`SkeletonInstance::create_bone_palette_bytes`]: crate::scene::instance::SkeletonInstance::create_bone_palette_bytes

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::scene::skin::{BoneMatrix3x4, BoneMatrix3x4Half};

/// Storage format of bone palette entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PalettePrecision {
    /// Three rows of four `f32`.
    #[default]
    Full,
    /// Three rows of four IEEE half floats.
    Half,
}

impl PalettePrecision {
    /// Size in bytes of one palette entry.
    #[inline]
    #[must_use]
    pub fn entry_size(self) -> usize {
        match self {
            Self::Full => size_of::<BoneMatrix3x4>(),
            Self::Half => size_of::<BoneMatrix3x4Half>(),
        }
    }
}

/// Defaults for a [`SkeletonInstance`] built with
/// [`SkeletonInstance::with_settings`].
///
/// Every field is optional in JSON; missing fields take their [`Default`] value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Playback speed assigned to every new animation binding.
    pub playback_speed: f32,
    /// Number of skinned-mesh slots allocated per instance.
    pub mesh_binding_count: usize,
    /// Entry format written by
    /// [`SkeletonInstance::create_bone_palette_bytes`].
    pub palette_precision: PalettePrecision,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            playback_speed: 1.0,
            mesh_binding_count: 0,
            palette_precision: PalettePrecision::Full,
        }
    }
}

impl AnimationSettings {
    /// Parses settings from JSON. Malformed input is reported as
    /// [`AnimationError::InvalidSettings`](crate::errors::AnimationError::InvalidSettings).
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON, readable back with [`from_json_str`](Self::from_json_str).
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
