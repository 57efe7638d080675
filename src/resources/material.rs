//! Material data for the substitution subsystem.
//!
//! The host scene owns shading materials; this crate only needs to know
//! three things about them:
//!
//! 1. Their identity (a [`MaterialKey`] into the shared store), so the
//!    substitution cache can detect when the host swaps an object's material.
//! 2. The mesh-level rasterization flags ([`RenderFlags`]) that the velocity
//!    pass must mirror onto its generated material every frame.
//! 3. Whether the surface content is time-varying (video-backed), which
//!    forces the full-motion shader mode.
//!
//! Generated velocity materials live in the same store as surface materials
//! so that swapping an object's material binding is a plain key assignment.

use slotmap::SlotMap;

use crate::resources::velocity_material::VelocityMaterial;

slotmap::new_key_type! {
    /// Stable identity of a material in the shared store.
    pub struct MaterialKey;
}

/// Shared material store. Identity comparison is key comparison.
pub type MaterialStore = SlotMap<MaterialKey, Material>;

/// Which triangle faces are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Mesh-level rasterization flags.
///
/// These affect whether/how the velocity pass rasterizes an object, so the
/// generated material must track the original's current values rather than
/// a copy taken at substitution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlags {
    pub visible: bool,
    pub wireframe: bool,
    pub side: Side,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            visible: true,
            wireframe: false,
            side: Side::Front,
        }
    }
}

/// A host shading material.
///
/// Opaque to this crate except for the attributes the velocity pass reads.
#[derive(Debug, Clone)]
pub struct SurfaceMaterial {
    pub name: String,
    pub flags: RenderFlags,
    /// The color map is video-backed: surface content changes every frame
    /// independently of geometry motion.
    pub video_map: bool,
}

impl SurfaceMaterial {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            flags: RenderFlags::default(),
            video_map: false,
        }
    }
}

/// Entry of the shared material store.
#[derive(Debug)]
pub enum Material {
    /// A shading material owned by the host scene.
    Surface(SurfaceMaterial),
    /// A generated motion-vector material owned by the substitution cache.
    Velocity(VelocityMaterial),
}

impl Material {
    #[inline]
    #[must_use]
    pub fn is_velocity(&self) -> bool {
        matches!(self, Material::Velocity(_))
    }

    #[must_use]
    pub fn render_flags(&self) -> &RenderFlags {
        match self {
            Material::Surface(m) => &m.flags,
            Material::Velocity(m) => m.render_flags(),
        }
    }

    #[must_use]
    pub fn as_surface(&self) -> Option<&SurfaceMaterial> {
        match self {
            Material::Surface(m) => Some(m),
            Material::Velocity(_) => None,
        }
    }

    #[must_use]
    pub fn as_velocity(&self) -> Option<&VelocityMaterial> {
        match self {
            Material::Velocity(m) => Some(m),
            Material::Surface(_) => None,
        }
    }

    #[must_use]
    pub fn as_velocity_mut(&mut self) -> Option<&mut VelocityMaterial> {
        match self {
            Material::Velocity(m) => Some(m),
            Material::Surface(_) => None,
        }
    }
}
