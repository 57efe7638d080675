//! Generated motion-vector material
//!
//! One `VelocityMaterial` exists per substituted object. It carries the
//! per-object cross-frame state the velocity pass depends on:
//!
//! - the current and previous clip transforms (projection x model-view),
//!   where "previous" always lags "current" by exactly one frame
//! - the previous frame's bone matrix texture for skinned objects
//! - the shader variant flags, with a rebuild marker that fires only on
//!   actual flag transitions
//!
//! The two-step per-frame update is the load-bearing ordering contract:
//! [`VelocityMaterial::begin_frame`] writes the current transform before the
//! render submission, and [`VelocityMaterial::end_frame`] advances current
//! into previous strictly after it. Reordering the two produces motion
//! vectors that are one frame early or one frame stale.

use bitflags::bitflags;
use glam::{Affine3A, Mat4, Vec2, Vec3, Vec4};

use crate::resources::material::RenderFlags;
use crate::resources::texture::{BoneTexture, RetiredTextures};
use crate::resources::version_tracker::ChangeTracker;

bitflags! {
    /// Shader variant switches for the generated velocity program.
    ///
    /// Toggling any of these invalidates the compiled program, so they are
    /// only written on actual transitions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VelocityShaderFlags: u32 {
        /// Rigid-motion approximation is invalid for this surface; the
        /// shader encodes saturated motion so temporal passes drop history.
        const FULL_MOVEMENT = 1 << 0;
        const USE_SKINNING  = 1 << 1;
        const BONE_TEXTURE  = 1 << 2;
    }
}

/// Per-object motion-vector material state.
#[derive(Debug)]
pub struct VelocityMaterial {
    // === Uniforms ===
    velocity_matrix: Mat4,
    prev_velocity_matrix: Mat4,
    last_world: Affine3A,
    prev_bone_texture: Option<BoneTexture>,
    /// Identity of the current-frame bone texture bound for this object.
    bone_texture_binding: Option<u64>,

    // === Program state ===
    flags: VelocityShaderFlags,
    render_flags: RenderFlags,
    needs_rebuild: bool,
    rebuilds: ChangeTracker,
}

impl Default for VelocityMaterial {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityMaterial {
    /// A fresh material with identity transforms and no skinning state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            velocity_matrix: Mat4::IDENTITY,
            prev_velocity_matrix: Mat4::IDENTITY,
            last_world: Affine3A::IDENTITY,
            prev_bone_texture: None,
            bone_texture_binding: None,
            flags: VelocityShaderFlags::empty(),
            render_flags: RenderFlags::default(),
            needs_rebuild: false,
            rebuilds: ChangeTracker::new(),
        }
    }

    // ========================================================================
    // Per-frame state machine
    // ========================================================================

    /// Writes the current clip transform and applies the full-motion hint.
    ///
    /// Called during the install phase, before the render submission.
    pub fn begin_frame(&mut self, current_clip: Mat4, full_motion: bool) {
        self.velocity_matrix = current_clip;
        self.set_flag(VelocityShaderFlags::FULL_MOVEMENT, full_motion);
    }

    /// Advances current state into the previous-frame slots.
    ///
    /// Called during the restore phase, strictly after the render submission
    /// for this frame. If `bones` is present, the current bone texture is
    /// snapshotted with the reuse-or-retire discipline.
    pub fn end_frame(
        &mut self,
        world: Affine3A,
        bones: Option<&BoneTexture>,
        retired: &mut RetiredTextures,
    ) {
        self.prev_velocity_matrix = self.velocity_matrix;
        self.last_world = world;
        if let Some(bones) = bones {
            self.snapshot_bones(bones, retired);
        }
    }

    /// Mirrors the original material's mesh-level rasterization flags.
    pub fn sync_render_flags(&mut self, flags: &RenderFlags) {
        self.render_flags = *flags;
    }

    /// Binds the object's current bone texture and enables the skinning
    /// shader variant.
    pub fn bind_skinning(&mut self, bones: &BoneTexture) {
        self.set_flag(VelocityShaderFlags::USE_SKINNING, true);
        self.set_flag(VelocityShaderFlags::BONE_TEXTURE, true);
        self.bone_texture_binding = Some(bones.id());
    }

    /// Copies the current bone texture into the previous-frame snapshot.
    ///
    /// Storage is reused in place when the texture size is unchanged;
    /// otherwise the old snapshot is retired (disposed at end of frame) and
    /// a correctly sized replacement is allocated.
    pub fn snapshot_bones(&mut self, current: &BoneTexture, retired: &mut RetiredTextures) {
        match &mut self.prev_bone_texture {
            Some(previous) if previous.size() == current.size() => {
                previous.copy_from(current);
            }
            slot => {
                if let Some(stale) = slot.take() {
                    retired.push(stale);
                }
                *slot = Some(BoneTexture::snapshot_of(current));
            }
        }
    }

    fn set_flag(&mut self, flag: VelocityShaderFlags, on: bool) {
        if self.flags.contains(flag) != on {
            self.flags.toggle(flag);
            self.needs_rebuild = true;
            self.rebuilds.bump();
        }
    }

    // ========================================================================
    // Shader semantics
    // ========================================================================

    /// Current-frame clip-space position of a local-space point.
    #[must_use]
    pub fn clip_position(&self, local: Vec3) -> Vec4 {
        self.velocity_matrix * local.extend(1.0)
    }

    /// Evaluates the velocity program for a local-space point.
    ///
    /// Encodes half the NDC-space displacement since the previous frame in
    /// RG; `FULL_MOVEMENT` encodes the saturated vector instead.
    #[must_use]
    pub fn evaluate(&self, local: Vec3) -> Vec4 {
        if self.flags.contains(VelocityShaderFlags::FULL_MOVEMENT) {
            return Vec4::ONE;
        }
        let now = project_ndc(self.velocity_matrix, local);
        let before = project_ndc(self.prev_velocity_matrix, local);
        let velocity = (now - before) * 0.5;
        Vec4::new(velocity.x, velocity.y, 0.0, 0.0)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn velocity_matrix(&self) -> Mat4 {
        self.velocity_matrix
    }

    #[inline]
    #[must_use]
    pub fn prev_velocity_matrix(&self) -> Mat4 {
        self.prev_velocity_matrix
    }

    #[inline]
    #[must_use]
    pub fn last_world(&self) -> Affine3A {
        self.last_world
    }

    #[inline]
    #[must_use]
    pub fn prev_bone_texture(&self) -> Option<&BoneTexture> {
        self.prev_bone_texture.as_ref()
    }

    /// Detaches the previous-frame bone snapshot (used when the material is
    /// discarded so the snapshot can be retired for deferred disposal).
    pub(crate) fn take_prev_bone_texture(&mut self) -> Option<BoneTexture> {
        self.prev_bone_texture.take()
    }

    #[inline]
    #[must_use]
    pub fn bone_texture_binding(&self) -> Option<u64> {
        self.bone_texture_binding
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> VelocityShaderFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn render_flags(&self) -> &RenderFlags {
        &self.render_flags
    }

    /// Whether the GPU program must be rebuilt, clearing the marker.
    pub fn take_rebuild(&mut self) -> bool {
        std::mem::take(&mut self.needs_rebuild)
    }

    /// Total number of program-invalidating flag transitions.
    #[inline]
    #[must_use]
    pub fn rebuild_version(&self) -> u64 {
        self.rebuilds.version()
    }
}

/// Perspective-divides a clip-space position down to NDC xy.
fn project_ndc(clip_transform: Mat4, local: Vec3) -> Vec2 {
    let clip = clip_transform * local.extend(1.0);
    if clip.w.abs() <= f32::EPSILON {
        return Vec2::ZERO;
    }
    Vec2::new(clip.x, clip.y) / clip.w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_motion_toggles_rebuild_once_per_transition() {
        let mut material = VelocityMaterial::new();
        assert_eq!(material.rebuild_version(), 0);

        material.begin_frame(Mat4::IDENTITY, true);
        assert_eq!(material.rebuild_version(), 1);
        assert!(material.take_rebuild());

        // Repeated identical hints are free
        material.begin_frame(Mat4::IDENTITY, true);
        material.begin_frame(Mat4::IDENTITY, true);
        assert_eq!(material.rebuild_version(), 1);
        assert!(!material.take_rebuild());

        material.begin_frame(Mat4::IDENTITY, false);
        assert_eq!(material.rebuild_version(), 2);
    }

    #[test]
    fn test_static_transform_encodes_zero_velocity() {
        let mut material = VelocityMaterial::new();
        let clip = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0)
            * Mat4::from_translation(Vec3::new(0.3, -0.2, -5.0));
        let mut retired = RetiredTextures::new();

        // Two frames with the same transform
        material.begin_frame(clip, false);
        material.end_frame(Affine3A::IDENTITY, None, &mut retired);
        material.begin_frame(clip, false);

        let encoded = material.evaluate(Vec3::new(0.1, 0.2, 0.0));
        assert!(encoded.length() < 1e-6);
    }

    #[test]
    fn test_full_motion_encodes_saturated_vector() {
        let mut material = VelocityMaterial::new();
        material.begin_frame(Mat4::IDENTITY, true);
        assert_eq!(material.evaluate(Vec3::ZERO), Vec4::ONE);
    }
}
