//! Render passes
//!
//! Provides:
//! - RenderNode: explicit lifecycle interface implemented by each pass
//! - Pipeline: driver that owns nodes, propagates resizes, runs them in order
//! - SceneRenderer: the opaque "render scene with camera into target" collaborator
//! - VelocityPass: three-phase motion-vector pass (install / render / restore)
//! - HbaoPass: horizon-based ambient occlusion estimator

pub mod hbao;
pub mod node;
pub mod velocity;

pub use hbao::HbaoPass;
pub use node::{FrameContext, Pipeline, RenderNode, SceneRenderer};
pub use velocity::{MaterialSubstitutionCache, VelocityPass};
