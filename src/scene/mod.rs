//! Skeleton and pose composition
//!
//! - [`FrameHierarchy`]: read-only frame tree the skeleton is built from
//! - [`Skeleton`]: static DFS-ordered bone hierarchy with bind poses
//! - [`SkeletonInstance`]: per-character pose buffers, animation and mesh bindings
//! - [`SkinnedMeshBinding`]: influence → bone mapping and palette output

pub mod frame;
pub mod pose;
pub mod skeleton;
pub mod skin;
pub mod instance;

pub use frame::{FrameHierarchy, FrameId, FrameNode, FrameTree};
pub use pose::{BoneTransform, BoundingBox, LocalPose, WorldPose};
pub use skeleton::{Bone, Skeleton};
pub use skin::{
    BoneMatrix3x4, BoneMatrix3x4Half, BonePaletteMut, PaletteEntry, SkinnedMesh, SkinnedMeshBinding,
};
pub use instance::SkeletonInstance;
