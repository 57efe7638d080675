//! Host-scene interface
//!
//! The scene graph proper (hierarchy, traversal, culling) belongs to the
//! host engine; this module models the slice of it the auxiliary-buffer
//! passes consume: renderable objects with stable identities, a camera, and
//! a background value the velocity pass temporarily overrides.

pub mod camera;
pub mod object;
pub mod scene;

pub use camera::Camera;
pub use object::{ObjectKey, RenderObject, Skin};
pub use scene::Scene;
