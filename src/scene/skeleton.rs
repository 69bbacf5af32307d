use glam::Affine3A;
use smallvec::{SmallVec, smallvec};

use crate::errors::{AnimationError, Result};
use crate::scene::frame::{FrameHierarchy, FrameId};
use crate::scene::pose::BoneTransform;

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// Parent bone index; always lower than this bone's own index.
    pub parent: Option<usize>,
    /// Frame the bone was built from.
    pub frame: FrameId,
    pub local_bind_pose: Affine3A,
    /// Inverse of the frame's world transform at build time.
    /// Transforms vertices from mesh space to bone local space.
    pub inverse_bind_pose: Affine3A,
}

/// Static bone hierarchy flattened in depth-first pre-order.
///
/// Built once from a frame tree in its rest pose. Immutable afterwards and
/// shared (`Arc<Skeleton>`) between all instances of a character.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    // Decomposed copy of each `local_bind_pose`, used to reset local poses
    bind_pose: Vec<BoneTransform>,
}

impl Skeleton {
    pub fn new<H: FrameHierarchy + ?Sized>(frames: &H, root: FrameId) -> Result<Self> {
        let mut skeleton = Self::default();
        skeleton.initialize(frames, root)?;
        Ok(skeleton)
    }

    /// Rebuilds the bone list from the subtree rooted at `root`.
    ///
    /// Frames are visited node first, then the first-child subtree, then the
    /// next sibling. Siblings of `root` itself are not part of the skeleton.
    /// Bind poses are read from the tree's current transforms.
    pub fn initialize<H: FrameHierarchy + ?Sized>(&mut self, frames: &H, root: FrameId) -> Result<()> {
        self.bones.clear();
        self.bind_pose.clear();

        let mut stack: SmallVec<[(FrameId, Option<usize>); 32]> = smallvec![(root, None)];

        while let Some((frame, parent)) = stack.pop() {
            let index = self.bones.len();
            self.bones
                .try_reserve(1)
                .map_err(|_| AnimationError::AllocationFailed {
                    context: "skeleton bones",
                    requested: index + 1,
                })?;

            let local_bind_pose = frames.local_transform(frame);
            let inverse_bind_pose = frames.world_transform(frame).inverse();

            self.bones.push(Bone {
                name: frames.name(frame).to_string(),
                parent,
                frame,
                local_bind_pose,
                inverse_bind_pose,
            });

            // Sibling goes under the child so the whole child subtree is emitted first
            if parent.is_some()
                && let Some(sibling) = frames.next_sibling(frame)
            {
                stack.push((sibling, parent));
            }
            if let Some(child) = frames.first_child(frame) {
                stack.push((child, Some(index)));
            }
        }

        self.bind_pose
            .try_reserve_exact(self.bones.len())
            .map_err(|_| AnimationError::AllocationFailed {
                context: "skeleton bind pose",
                requested: self.bones.len(),
            })?;
        self.bind_pose
            .extend(self.bones.iter().map(|b| BoneTransform::from_affine(&b.local_bind_pose)));

        log::debug!(
            "Skeleton built from '{}': {} bones",
            frames.name(root),
            self.bones.len()
        );

        Ok(())
    }

    /// Linear search by bone name.
    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn parent_index(&self, index: usize) -> Result<Option<usize>> {
        self.bones
            .get(index)
            .map(|b| b.parent)
            .ok_or(AnimationError::BoneIndexOutOfRange {
                index,
                bone_count: self.bones.len(),
            })
    }

    #[inline]
    #[must_use]
    pub fn bone_name(&self, index: usize) -> Option<&str> {
        self.bones.get(index).map(|b| b.name.as_str())
    }

    #[inline]
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<FrameId> {
        self.bones.get(index).map(|b| b.frame)
    }

    /// Decomposed local bind pose of every bone.
    #[inline]
    #[must_use]
    pub fn bind_pose(&self) -> &[BoneTransform] {
        &self.bind_pose
    }
}
