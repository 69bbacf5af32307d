//! Pose representations
//!
//! A skeleton instance keeps two parallel per-bone buffers:
//! - [`LocalPose`]: decomposed TRS relative to the parent bone
//! - [`WorldPose`]: composed affine matrices in skeleton space

use glam::{Affine3A, Mat4, Quat, Vec3};

use crate::errors::{AnimationError, Result, try_resize};

/// Decomposed bone transform (translation, rotation, scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    #[must_use]
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Decomposes an affine matrix. Shear is lost.
    #[must_use]
    pub fn from_affine(matrix: &Affine3A) -> Self {
        let (scale, orientation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            orientation,
            scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-bone local transforms, indexed like the skeleton's bones.
#[derive(Debug, Clone, Default)]
pub struct LocalPose {
    bones: Vec<BoneTransform>,
}

impl LocalPose {
    pub fn new(bone_count: usize) -> Result<Self> {
        let mut pose = Self::default();
        pose.resize(bone_count)?;
        Ok(pose)
    }

    pub(crate) fn resize(&mut self, bone_count: usize) -> Result<()> {
        try_resize(&mut self.bones, bone_count, BoneTransform::IDENTITY, "local pose")
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[BoneTransform] {
        &self.bones
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [BoneTransform] {
        &mut self.bones
    }

    #[inline]
    #[must_use]
    pub fn get(&self, bone: usize) -> Option<&BoneTransform> {
        self.bones.get(bone)
    }

    pub fn get_mut(&mut self, bone: usize) -> Result<&mut BoneTransform> {
        let bone_count = self.bones.len();
        self.bones
            .get_mut(bone)
            .ok_or(AnimationError::BoneIndexOutOfRange {
                index: bone,
                bone_count,
            })
    }

    /// Overwrites every bone with `source`. Lengths must match.
    pub(crate) fn reset_to(&mut self, source: &[BoneTransform]) {
        debug_assert_eq!(self.bones.len(), source.len());
        self.bones.copy_from_slice(source);
    }
}

/// Per-bone skeleton-space matrices produced by forward kinematics.
#[derive(Debug, Clone, Default)]
pub struct WorldPose {
    pub(crate) matrices: Vec<Affine3A>,
}

impl WorldPose {
    pub fn new(bone_count: usize) -> Result<Self> {
        let mut pose = Self::default();
        pose.resize(bone_count)?;
        Ok(pose)
    }

    pub(crate) fn resize(&mut self, bone_count: usize) -> Result<()> {
        try_resize(&mut self.matrices, bone_count, Affine3A::IDENTITY, "world pose")
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Affine3A] {
        &self.matrices
    }

    #[inline]
    #[must_use]
    pub fn get(&self, bone: usize) -> Option<&Affine3A> {
        self.matrices.get(bone)
    }

    /// Matrix as `Mat4`, for upload or debugging.
    #[inline]
    #[must_use]
    pub fn to_mat4(&self, bone: usize) -> Option<Mat4> {
        self.matrices.get(bone).map(|m| Mat4::from(*m))
    }
}

/// Axis-aligned bounds in skeleton space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Tight bounds around a set of points, or `None` if empty.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut valid = false;

        for p in points {
            min = min.min(p);
            max = max.max(p);
            valid = true;
        }

        valid.then_some(Self { min, max })
    }
}
