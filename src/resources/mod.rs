//! Pure-data resources
//!
//! Provides:
//! - Material: material store shared by the host scene and the velocity pass
//! - VelocityMaterial: generated motion-vector material with per-object state
//! - BoneTexture / DepthBuffer / OcclusionBuffer / NoiseTexture: CPU texel stores
//! - RenderTarget: offscreen per-pixel output buffer
//! - HbaoSettings: HBAO estimator configuration
//! - ChangeTracker: version counter for downstream cache invalidation

pub mod hbao;
pub mod material;
pub mod target;
pub mod texture;
pub mod velocity_material;
pub mod version_tracker;

pub use hbao::HbaoSettings;
pub use material::{Material, MaterialKey, MaterialStore, RenderFlags, Side, SurfaceMaterial};
pub use target::RenderTarget;
pub use texture::{
    BoneTexture, DepthBuffer, NoiseHandle, NoiseTexture, OcclusionBuffer, RetiredTextures,
};
pub use velocity_material::{VelocityMaterial, VelocityShaderFlags};
pub use version_tracker::ChangeTracker;
