//! Error Types
//!
//! This module defines the error type used throughout the skeletal animation core.
//!
//! # Overview
//!
//! [`AnimationError`] covers three families of failure:
//! - **Precondition violations**: empty key arrays, negative key times,
//!   out-of-range hint / bone / mesh indices, undersized palette buffers
//! - **Configuration errors**: mesh influences that name no skeleton bone,
//!   malformed settings
//! - **Allocation failures**: pose, offset or binding buffers that could not be sized
//!
//! All of them are programmer or asset errors. They are reported eagerly instead
//! of being papered over with a default bone or a skipped track.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, AnimationError>`.
//!
//! ```rust,ignore
//! use myth_skeletal::errors::{AnimationError, ErrorKind, Result};
//!
//! fn bind(instance: &mut SkeletonInstance, mesh: &MyMesh) -> Result<()> {
//!     instance.bind_skinned_mesh(0, mesh)
//! }
//! ```

use thiserror::Error;

/// Broad classification of an [`AnimationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A caller broke an operation's documented precondition.
    PreconditionViolation,
    /// Asset data does not line up (e.g. mesh influences vs. skeleton bones).
    ConfigurationError,
    /// A runtime buffer could not be allocated.
    AllocationFailure,
}

/// The error type for keyframe sampling and pose composition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    // ========================================================================
    // Key Array Errors
    // ========================================================================
    /// A search or sample was requested on an array with no keys.
    #[error("Key array is empty")]
    EmptyKeyArray,

    /// Key times and sample times must be non-negative.
    #[error("Negative key time: {time}")]
    NegativeKeyTime {
        /// The offending time value
        time: f32,
    },

    /// A key accessor was given an index past the end of the array.
    #[error("Key index out of range: {index} (len: {len})")]
    KeyIndexOutOfRange {
        /// The invalid index
        index: usize,
        /// Number of keys in the array
        len: usize,
    },

    /// A search cursor points past the end of the array it is used with.
    #[error("Search hint out of range: {hint} (len: {len})")]
    HintOutOfRange {
        /// The cursor position
        hint: usize,
        /// Number of keys in the array
        len: usize,
    },

    // ========================================================================
    // Skeleton Errors
    // ========================================================================
    /// A bone index does not exist in the skeleton.
    #[error("Bone index out of range: {index} (bone count: {bone_count})")]
    BoneIndexOutOfRange {
        /// The invalid index
        index: usize,
        /// Number of bones in the skeleton
        bone_count: usize,
    },

    /// A skinned-mesh slot does not exist on the instance.
    #[error("Mesh binding index out of range: {index} (count: {count})")]
    MeshBindingIndexOutOfRange {
        /// The invalid slot
        index: usize,
        /// Number of allocated slots
        count: usize,
    },

    /// A mesh influence names a bone the skeleton does not have.
    #[error("Mesh binding {mesh_index}: influence '{name}' does not match any bone")]
    UnresolvedInfluence {
        /// Slot the mesh was being bound to
        mesh_index: usize,
        /// The unresolved influence name
        name: String,
    },

    /// Animation settings could not be parsed or serialized.
    #[error("Invalid animation settings: {0}")]
    InvalidSettings(String),

    // ========================================================================
    // Palette Errors
    // ========================================================================
    /// The destination palette has fewer entries than the mesh has influences.
    #[error("Bone palette too small: {provided} entries provided, {required} required")]
    PaletteTooSmall {
        /// Influence count of the bound mesh
        required: usize,
        /// Entries available in the destination
        provided: usize,
    },

    /// A raw byte buffer could not be viewed as palette entries.
    #[error("Bone palette buffer layout error: {0}")]
    PaletteBufferLayout(String),

    // ========================================================================
    // Allocation Errors
    // ========================================================================
    /// Reserving storage for a runtime buffer failed.
    #[error("Allocation failed for {context} ({requested} elements)")]
    AllocationFailed {
        /// What was being allocated
        context: &'static str,
        /// Requested element count
        requested: usize,
    },
}

impl AnimationError {
    /// Returns the taxonomy bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyKeyArray
            | Self::NegativeKeyTime { .. }
            | Self::KeyIndexOutOfRange { .. }
            | Self::HintOutOfRange { .. }
            | Self::BoneIndexOutOfRange { .. }
            | Self::MeshBindingIndexOutOfRange { .. }
            | Self::PaletteTooSmall { .. }
            | Self::PaletteBufferLayout(_) => ErrorKind::PreconditionViolation,
            Self::UnresolvedInfluence { .. } | Self::InvalidSettings(_) => {
                ErrorKind::ConfigurationError
            }
            Self::AllocationFailed { .. } => ErrorKind::AllocationFailure,
        }
    }
}

impl From<bytemuck::PodCastError> for AnimationError {
    fn from(err: bytemuck::PodCastError) -> Self {
        AnimationError::PaletteBufferLayout(format!("{err:?}"))
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        AnimationError::InvalidSettings(err.to_string())
    }
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;

/// Allocates a vector of `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_filled_vec<T: Clone>(
    len: usize,
    value: T,
    context: &'static str,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    try_resize(&mut out, len, value, context)?;
    Ok(out)
}

/// Resizes `vec` to `len`, reserving fallibly first. Existing elements are kept.
pub(crate) fn try_resize<T: Clone>(
    vec: &mut Vec<T>,
    len: usize,
    value: T,
    context: &'static str,
) -> Result<()> {
    if len > vec.len() {
        vec.try_reserve_exact(len - vec.len())
            .map_err(|_| AnimationError::AllocationFailed {
                context,
                requested: len,
            })?;
    }
    vec.resize(len, value);
    Ok(())
}
