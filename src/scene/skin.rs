//! Skinned mesh binding and bone palettes
//!
//! A [`SkinnedMeshBinding`] maps each influence slot of a mesh to a skeleton
//! bone. Palette entries are the affine 3×4 part of
//! `world_pose[bone] * inverse_bind_pose[bone]`, stored row by row, so a
//! shader can skin with three `dot` products per vertex position.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use half::f16;

use crate::errors::{AnimationError, Result, try_filled_vec};
use crate::scene::pose::WorldPose;
use crate::scene::skeleton::Skeleton;
use crate::settings::PalettePrecision;

/// A mesh whose vertices are weighted to named bone influences.
pub trait SkinnedMesh {
    fn influence_count(&self) -> usize;

    fn influence_name(&self, index: usize) -> &str;
}

impl<S: AsRef<str>> SkinnedMesh for [S] {
    fn influence_count(&self) -> usize {
        self.len()
    }

    fn influence_name(&self, index: usize) -> &str {
        self[index].as_ref()
    }
}

/// Full-precision palette entry: three rows of `[f32; 4]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BoneMatrix3x4 {
    pub rows: [[f32; 4]; 3],
}

/// Half-precision palette entry: three rows of `[f16; 4]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BoneMatrix3x4Half {
    pub rows: [[f16; 4]; 3],
}

/// A palette element type that can be built from the three affine rows.
pub trait PaletteEntry: Copy {
    fn from_rows(rows: &[Vec4; 3]) -> Self;

    /// Expands back to a 4×4 matrix with `(0, 0, 0, 1)` as the last row.
    fn to_mat4(&self) -> Mat4;
}

impl PaletteEntry for BoneMatrix3x4 {
    #[inline]
    fn from_rows(rows: &[Vec4; 3]) -> Self {
        Self {
            rows: [rows[0].to_array(), rows[1].to_array(), rows[2].to_array()],
        }
    }

    fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols(
            Vec4::from_array(self.rows[0]),
            Vec4::from_array(self.rows[1]),
            Vec4::from_array(self.rows[2]),
            Vec4::W,
        )
        .transpose()
    }
}

impl PaletteEntry for BoneMatrix3x4Half {
    #[inline]
    fn from_rows(rows: &[Vec4; 3]) -> Self {
        Self {
            rows: rows.map(|r| r.to_array().map(f16::from_f32)),
        }
    }

    fn to_mat4(&self) -> Mat4 {
        let [r0, r1, r2] = self.rows.map(|r| Vec4::from_array(r.map(f16::to_f32)));
        Mat4::from_cols(r0, r1, r2, Vec4::W).transpose()
    }
}

/// Caller-owned palette destination, precision chosen per call.
#[derive(Debug)]
pub enum BonePaletteMut<'a> {
    Full(&'a mut [BoneMatrix3x4]),
    Half(&'a mut [BoneMatrix3x4Half]),
}

impl BonePaletteMut<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Full(entries) => entries.len(),
            Self::Half(entries) => entries.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn precision(&self) -> PalettePrecision {
        match self {
            Self::Full(_) => PalettePrecision::Full,
            Self::Half(_) => PalettePrecision::Half,
        }
    }
}

/// Influence slot → skeleton bone mapping for one mesh.
#[derive(Debug, Clone, Default)]
pub struct SkinnedMeshBinding {
    influence_to_bone: Vec<usize>,
}

impl SkinnedMeshBinding {
    /// Resolves every influence name of `mesh` against `skeleton`.
    ///
    /// On failure the previous mapping is left untouched.
    pub fn bind<M: SkinnedMesh + ?Sized>(
        &mut self,
        skeleton: &Skeleton,
        mesh: &M,
        mesh_index: usize,
    ) -> Result<()> {
        let count = mesh.influence_count();
        let mut mapping = try_filled_vec(count, 0, "skinned mesh influences")?;

        for (slot, bone) in mapping.iter_mut().enumerate() {
            let name = mesh.influence_name(slot);
            *bone = skeleton.find_bone(name).ok_or_else(|| {
                log::error!("Mesh binding {mesh_index}: influence '{name}' has no matching bone");
                AnimationError::UnresolvedInfluence {
                    mesh_index,
                    name: name.to_string(),
                }
            })?;
        }

        self.influence_to_bone = mapping;
        log::debug!("Mesh binding {mesh_index}: {count} influences resolved");
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.influence_to_bone.clear();
    }

    #[inline]
    #[must_use]
    pub fn influence_count(&self) -> usize {
        self.influence_to_bone.len()
    }

    #[inline]
    #[must_use]
    pub fn influence_to_bone(&self) -> &[usize] {
        &self.influence_to_bone
    }

    #[inline]
    #[must_use]
    pub fn bone_for_influence(&self, influence: usize) -> Option<usize> {
        self.influence_to_bone.get(influence).copied()
    }

    /// Writes one palette entry per influence into `dest[..influence_count]`.
    pub fn write_palette<P: PaletteEntry>(
        &self,
        skeleton: &Skeleton,
        world_pose: &WorldPose,
        dest: &mut [P],
    ) -> Result<()> {
        let required = self.influence_to_bone.len();
        if dest.len() < required {
            return Err(AnimationError::PaletteTooSmall {
                required,
                provided: dest.len(),
            });
        }

        for (entry, &bone) in dest.iter_mut().zip(&self.influence_to_bone) {
            let out_of_range = AnimationError::BoneIndexOutOfRange {
                index: bone,
                bone_count: skeleton.bone_count(),
            };
            let world = world_pose.get(bone).ok_or_else(|| out_of_range.clone())?;
            let inverse_bind = skeleton.bone(bone).ok_or(out_of_range)?.inverse_bind_pose;

            let composite = Mat4::from(*world * inverse_bind);
            *entry = P::from_rows(&[composite.row(0), composite.row(1), composite.row(2)]);
        }

        Ok(())
    }
}
