#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod scene;
pub mod settings;
pub mod errors;

pub use animation::{Animation, AnimationBinding, AnimationKeyArray, AnimationTransformTrack, KeyCursor};
pub use scene::{
    BoneMatrix3x4, BoneMatrix3x4Half, BonePaletteMut, BoneTransform, FrameHierarchy, FrameId, FrameTree,
    Skeleton, SkeletonInstance, SkinnedMesh,
};
pub use settings::{AnimationSettings, PalettePrecision};
pub use errors::{AnimationError, ErrorKind, Result};
