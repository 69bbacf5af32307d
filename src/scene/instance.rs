//! Skeleton instance
//!
//! Per-character runtime state driven once per tick:
//!
//! ```text
//! update_animation(dt)  ->  build_world_pose()  ->  create_bone_palette(mesh, dest)
//!   local pose               world pose              caller-owned palette buffer
//! ```
//!
//! A [`SkeletonInstance`] has no internal synchronization. Share the
//! [`Skeleton`] and [`Animation`] assets across threads, but drive each
//! instance from a single thread.

use std::sync::Arc;

use glam::{Affine3A, Quat, Vec3};

use crate::animation::binding::AnimationBinding;
use crate::animation::clip::Animation;
use crate::errors::{AnimationError, Result, try_filled_vec};
use crate::scene::pose::{BoundingBox, LocalPose, WorldPose};
use crate::scene::skeleton::Skeleton;
use crate::scene::skin::{
    BoneMatrix3x4, BoneMatrix3x4Half, BonePaletteMut, PaletteEntry, SkinnedMesh, SkinnedMeshBinding,
};
use crate::settings::{AnimationSettings, PalettePrecision};

#[derive(Debug, Clone)]
pub struct SkeletonInstance {
    skeleton: Arc<Skeleton>,

    local_pose: LocalPose,
    world_pose: WorldPose,

    // Procedural corrections, applied after sampling
    rotation_offsets: Vec<Quat>,
    position_offsets: Vec<Vec3>,

    binding: Option<AnimationBinding>,
    mesh_bindings: Vec<SkinnedMeshBinding>,

    playback_speed: f32,
    palette_precision: PalettePrecision,
}

impl SkeletonInstance {
    pub fn new(skeleton: Arc<Skeleton>, mesh_binding_count: usize) -> Result<Self> {
        let mut instance = Self {
            skeleton: Arc::clone(&skeleton),
            local_pose: LocalPose::default(),
            world_pose: WorldPose::default(),
            rotation_offsets: Vec::new(),
            position_offsets: Vec::new(),
            binding: None,
            mesh_bindings: Vec::new(),
            playback_speed: 1.0,
            palette_precision: PalettePrecision::default(),
        };
        instance.initialize(skeleton, mesh_binding_count)?;
        Ok(instance)
    }

    pub fn with_settings(skeleton: Arc<Skeleton>, settings: &AnimationSettings) -> Result<Self> {
        let mut instance = Self::new(skeleton, settings.mesh_binding_count)?;
        instance.playback_speed = settings.playback_speed;
        instance.palette_precision = settings.palette_precision;
        Ok(instance)
    }

    /// Sizes all per-bone buffers for `skeleton` and resets them to the bind
    /// pose with neutral offsets.
    ///
    /// The mesh-binding array is only reallocated when `mesh_binding_count`
    /// changes. Switching to a different skeleton drops the active animation
    /// binding and clears every mesh binding, since their bone indices refer to
    /// the old hierarchy.
    ///
    /// On error the instance is left exactly as it was.
    pub fn initialize(&mut self, skeleton: Arc<Skeleton>, mesh_binding_count: usize) -> Result<()> {
        let bone_count = skeleton.bone_count();

        let mut local_pose = LocalPose::new(bone_count)?;
        local_pose.reset_to(skeleton.bind_pose());
        let world_pose = WorldPose::new(bone_count)?;
        let rotation_offsets = try_filled_vec(bone_count, Quat::IDENTITY, "rotation offsets")?;
        let position_offsets = try_filled_vec(bone_count, Vec3::ZERO, "position offsets")?;
        let mesh_bindings = if mesh_binding_count == self.mesh_bindings.len() {
            None
        } else {
            Some(try_filled_vec(
                mesh_binding_count,
                SkinnedMeshBinding::default(),
                "skinned mesh bindings",
            )?)
        };

        // Everything is allocated; commit
        self.local_pose = local_pose;
        self.world_pose = world_pose;
        self.rotation_offsets = rotation_offsets;
        self.position_offsets = position_offsets;
        if let Some(mesh_bindings) = mesh_bindings {
            self.mesh_bindings = mesh_bindings;
        }

        if !Arc::ptr_eq(&self.skeleton, &skeleton) {
            self.binding = None;
            self.mesh_bindings.iter_mut().for_each(SkinnedMeshBinding::clear);
        }
        self.skeleton = skeleton;

        log::debug!(
            "SkeletonInstance initialized: {bone_count} bones, {mesh_binding_count} mesh slots"
        );
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    // ========================================================================
    // Skinned meshes
    // ========================================================================

    /// Resolves every influence of `mesh` to a bone and stores the mapping in
    /// slot `index`. Fails if any influence has no matching bone.
    pub fn bind_skinned_mesh<M: SkinnedMesh + ?Sized>(&mut self, index: usize, mesh: &M) -> Result<()> {
        let count = self.mesh_bindings.len();
        let binding = self
            .mesh_bindings
            .get_mut(index)
            .ok_or(AnimationError::MeshBindingIndexOutOfRange { index, count })?;
        binding.bind(&self.skeleton, mesh, index)
    }

    #[inline]
    #[must_use]
    pub fn mesh_binding_count(&self) -> usize {
        self.mesh_bindings.len()
    }

    #[inline]
    #[must_use]
    pub fn mesh_binding(&self, index: usize) -> Option<&SkinnedMeshBinding> {
        self.mesh_bindings.get(index)
    }

    // ========================================================================
    // Animation binding
    // ========================================================================

    /// Starts playing `animation` from time zero, replacing whatever was
    /// playing before. There is no cross-fade.
    ///
    /// If binding fails the previous animation keeps playing.
    pub fn create_animation_binding(&mut self, animation: Arc<Animation>) -> Result<&mut AnimationBinding> {
        let binding = match self.binding.take() {
            Some(mut binding) => match binding.initialize(&self.skeleton, animation) {
                Ok(()) => binding,
                Err(err) => {
                    self.binding = Some(binding);
                    return Err(err);
                }
            },
            None => AnimationBinding::new(&self.skeleton, animation)?,
        };

        let binding = self.binding.insert(binding);
        binding.set_speed(self.playback_speed);
        Ok(binding)
    }

    pub fn clear_animation_binding(&mut self) {
        self.binding = None;
    }

    #[inline]
    #[must_use]
    pub fn binding(&self) -> Option<&AnimationBinding> {
        self.binding.as_ref()
    }

    #[inline]
    pub fn binding_mut(&mut self) -> Option<&mut AnimationBinding> {
        self.binding.as_mut()
    }

    // ========================================================================
    // Procedural offsets
    // ========================================================================

    /// Replaces the rotation applied on top of the sampled orientation of `bone`.
    pub fn set_joint_rotation_offset(&mut self, bone: usize, rotation: Quat) -> Result<()> {
        let bone_count = self.rotation_offsets.len();
        let slot = self
            .rotation_offsets
            .get_mut(bone)
            .ok_or(AnimationError::BoneIndexOutOfRange { index: bone, bone_count })?;
        *slot = rotation;
        Ok(())
    }

    /// Replaces the translation added to the sampled position of `bone`.
    pub fn set_joint_position_offset(&mut self, bone: usize, offset: Vec3) -> Result<()> {
        let bone_count = self.position_offsets.len();
        let slot = self
            .position_offsets
            .get_mut(bone)
            .ok_or(AnimationError::BoneIndexOutOfRange { index: bone, bone_count })?;
        *slot = offset;
        Ok(())
    }

    pub fn reset_joint_offsets(&mut self) {
        self.rotation_offsets.fill(Quat::IDENTITY);
        self.position_offsets.fill(Vec3::ZERO);
    }

    // ========================================================================
    // Per-frame pipeline
    // ========================================================================

    /// Advances the active animation and rebuilds the local pose.
    ///
    /// 1. Ticks the binding clock by `dt`.
    /// 2. Resets every bone to the bind pose.
    /// 3. Overwrites animated bones with the sampled keys.
    /// 4. Applies the procedural offsets to every bone.
    pub fn update_animation(&mut self, dt: f32) -> Result<()> {
        if let Some(binding) = self.binding.as_mut() {
            binding.tick(dt);
        }

        self.local_pose.reset_to(self.skeleton.bind_pose());

        if let Some(binding) = self.binding.as_mut() {
            binding.sample_to_local_pose(&mut self.local_pose)?;
        }

        let offsets = self.rotation_offsets.iter().zip(&self.position_offsets);
        for (bone, (rotation, position)) in self.local_pose.as_mut_slice().iter_mut().zip(offsets) {
            bone.orientation = *rotation * bone.orientation;
            bone.position += *position;
        }

        Ok(())
    }

    /// Forward kinematics over the depth-first bone order.
    ///
    /// Every parent precedes its children, so one linear pass suffices.
    pub fn build_world_pose(&mut self) {
        let locals = self.local_pose.as_slice();
        let world = &mut self.world_pose.matrices;

        for (i, (bone, local)) in self.skeleton.bones().iter().zip(locals).enumerate() {
            let local = local.to_affine();
            world[i] = match bone.parent {
                Some(parent) => {
                    debug_assert!(parent < i, "bone {i} precedes its parent {parent}");
                    world[parent] * local
                }
                None => local,
            };
        }
    }

    /// Writes the skinning palette of mesh slot `mesh_index` into `dest`.
    ///
    /// Entry `k` is the affine part of `world_pose[b] * inverse_bind_pose[b]`
    /// for the bone `b` bound to influence `k`. Never allocates.
    pub fn create_bone_palette(&self, mesh_index: usize, dest: BonePaletteMut<'_>) -> Result<()> {
        match dest {
            BonePaletteMut::Full(entries) => self.write_bone_palette(mesh_index, entries),
            BonePaletteMut::Half(entries) => self.write_bone_palette(mesh_index, entries),
        }
    }

    pub fn write_bone_palette<P: PaletteEntry>(&self, mesh_index: usize, dest: &mut [P]) -> Result<()> {
        let binding = self.mesh_bindings.get(mesh_index).ok_or(
            AnimationError::MeshBindingIndexOutOfRange {
                index: mesh_index,
                count: self.mesh_bindings.len(),
            },
        )?;
        binding.write_palette(&self.skeleton, &self.world_pose, dest)
    }

    /// Entry format used by [`create_bone_palette_bytes`](Self::create_bone_palette_bytes).
    #[inline]
    #[must_use]
    pub fn palette_precision(&self) -> PalettePrecision {
        self.palette_precision
    }

    #[inline]
    pub fn set_palette_precision(&mut self, precision: PalettePrecision) {
        self.palette_precision = precision;
    }

    /// Bytes needed to hold the palette of mesh slot `mesh_index` in the
    /// instance's palette precision.
    pub fn palette_byte_size(&self, mesh_index: usize) -> Result<usize> {
        let binding = self.mesh_bindings.get(mesh_index).ok_or(
            AnimationError::MeshBindingIndexOutOfRange {
                index: mesh_index,
                count: self.mesh_bindings.len(),
            },
        )?;
        Ok(binding.influence_count() * self.palette_precision.entry_size())
    }

    /// Palette output into a raw (e.g. mapped GPU) byte buffer, encoded in
    /// the instance's [`palette_precision`](Self::palette_precision).
    pub fn create_bone_palette_bytes(&self, mesh_index: usize, bytes: &mut [u8]) -> Result<()> {
        self.create_bone_palette_bytes_as(mesh_index, bytes, self.palette_precision)
    }

    /// Like [`create_bone_palette_bytes`](Self::create_bone_palette_bytes)
    /// with an explicit precision.
    ///
    /// `bytes` must be aligned for and sized to a whole number of entries of
    /// the requested precision.
    pub fn create_bone_palette_bytes_as(
        &self,
        mesh_index: usize,
        bytes: &mut [u8],
        precision: PalettePrecision,
    ) -> Result<()> {
        let dest = match precision {
            PalettePrecision::Full => {
                BonePaletteMut::Full(bytemuck::try_cast_slice_mut::<u8, BoneMatrix3x4>(bytes)?)
            }
            PalettePrecision::Half => {
                BonePaletteMut::Half(bytemuck::try_cast_slice_mut::<u8, BoneMatrix3x4Half>(bytes)?)
            }
        };
        self.create_bone_palette(mesh_index, dest)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn local_pose(&self) -> &LocalPose {
        &self.local_pose
    }

    #[inline]
    #[must_use]
    pub fn world_pose(&self) -> &WorldPose {
        &self.world_pose
    }

    pub fn world_matrix(&self, bone: usize) -> Result<Affine3A> {
        self.world_pose
            .get(bone)
            .copied()
            .ok_or(AnimationError::BoneIndexOutOfRange {
                index: bone,
                bone_count: self.world_pose.len(),
            })
    }

    /// Tight bounds around the current bone positions (no padding).
    #[must_use]
    pub fn world_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.world_pose.as_slice().iter().map(|m| Vec3::from(m.translation)))
    }
}
