//! Pass lifecycle interface
//!
//! Each screen-space pass implements [`RenderNode`] explicitly (no inherited
//! base-pass behavior); a [`Pipeline`] composes them and drives the shared
//! lifecycle: resize propagation and in-order execution.

use std::any::Any;

use crate::resources::hbao::HbaoSettings;
use crate::resources::target::RenderTarget;
use crate::resources::texture::DepthBuffer;
use crate::scene::camera::Camera;
use crate::scene::scene::Scene;

/// The renderer collaborator.
///
/// A single opaque, ordered submission: implementations clear `target` to
/// the scene's background (when set) and rasterize the scene's visibility
/// set through `camera`. The draw is guaranteed complete (or correctly
/// ordered) before any consumer reads `target`.
pub trait SceneRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera, target: &mut RenderTarget);
}

/// Everything a pass may consume during one frame.
pub struct FrameContext<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a Camera,
    pub renderer: &'a mut dyn SceneRenderer,
    /// Depth input for screen-space estimators, when the frame has one.
    pub depth: Option<&'a DepthBuffer>,
    /// HBAO configuration, read fresh each frame.
    pub hbao: &'a HbaoSettings,
}

/// Lifecycle interface for screen-space passes.
pub trait RenderNode {
    /// Node name, for debugging and logging.
    fn name(&self) -> &str;

    /// Output-resolution change. Idempotent; called between frames only.
    fn resize(&mut self, width: u32, height: u32);

    /// Executes the pass for the current frame.
    fn run(&mut self, ctx: &mut FrameContext<'_>);

    /// Downcast support for retrieving pass outputs from a pipeline.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Owns a sequence of passes and drives them in order.
pub struct Pipeline {
    nodes: Vec<Box<dyn RenderNode>>,
    width: u32,
    height: u32,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            width: 1,
            height: 1,
        }
    }

    /// Appends a pass, bringing it to the pipeline's current resolution.
    pub fn push(&mut self, mut node: Box<dyn RenderNode>) {
        node.resize(self.width, self.height);
        self.nodes.push(node);
    }

    /// Propagates a resolution change to every node. Idempotent.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        for node in &mut self.nodes {
            node.resize(width, height);
        }
    }

    /// Runs all passes in insertion order.
    pub fn run(&mut self, ctx: &mut FrameContext<'_>) {
        for node in &mut self.nodes {
            log::trace!("running pass `{}`", node.name());
            node.run(ctx);
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Box<dyn RenderNode>] {
        &self.nodes
    }

    #[must_use]
    pub fn node_mut(&mut self, index: usize) -> Option<&mut (dyn RenderNode + 'static)> {
        self.nodes.get_mut(index).map(AsMut::as_mut)
    }
}
