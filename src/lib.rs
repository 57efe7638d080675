#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod passes;
pub mod resources;
pub mod scene;

pub use errors::{Result, WispError};
pub use passes::{FrameContext, HbaoPass, Pipeline, RenderNode, SceneRenderer, VelocityPass};
pub use resources::{
    BoneTexture, DepthBuffer, HbaoSettings, Material, MaterialKey, MaterialStore, NoiseHandle,
    NoiseTexture, OcclusionBuffer, RenderFlags, RenderTarget, RetiredTextures, Side,
    SurfaceMaterial, VelocityMaterial, VelocityShaderFlags,
};
pub use scene::{Camera, ObjectKey, RenderObject, Scene, Skin};
