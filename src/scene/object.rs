//! Renderable objects
//!
//! Objects live in a slotmap keyed by [`ObjectKey`]; the key is the stable
//! identity the substitution cache stores, so caching never extends an
//! object's lifetime.

use glam::{Affine3A, Mat4};

use crate::resources::material::MaterialKey;
use crate::resources::texture::BoneTexture;

slotmap::new_key_type! {
    /// Stable identity of a renderable object in the scene.
    pub struct ObjectKey;
}

/// Skinning data attached to a renderable object.
#[derive(Debug)]
pub struct Skin {
    /// Current-frame bone matrix texture, rewritten by the host's animation
    /// system each frame.
    pub bone_texture: BoneTexture,
}

impl Skin {
    #[must_use]
    pub fn from_joint_matrices(joints: &[Mat4]) -> Self {
        Self {
            bone_texture: BoneTexture::from_joint_matrices(joints),
        }
    }

    /// Uploads this frame's joint matrices, reallocating the bone texture
    /// only when the required size changes.
    pub fn set_joint_matrices(&mut self, joints: &[Mat4]) {
        self.bone_texture.write_joint_matrices(joints);
    }
}

/// A renderable scene node as seen by the auxiliary-buffer passes.
#[derive(Debug)]
pub struct RenderObject {
    pub name: String,
    /// Current world transform (updated by the host before each frame).
    pub world: Affine3A,
    /// Current material binding. Owned by the scene; the velocity pass
    /// substitutes it during its render phase only.
    pub material: MaterialKey,
    pub skin: Option<Skin>,
    pub visible: bool,
    /// Shading depends on dynamic reflections, so the rigid-motion
    /// approximation does not hold for this surface.
    pub needs_updated_reflections: bool,
}

impl RenderObject {
    #[must_use]
    pub fn new(name: &str, material: MaterialKey) -> Self {
        Self {
            name: name.to_string(),
            world: Affine3A::IDENTITY,
            material,
            skin: None,
            visible: true,
            needs_updated_reflections: false,
        }
    }
}
