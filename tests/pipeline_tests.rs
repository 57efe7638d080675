//! Tests for the pass pipeline.
//!
//! Tests for:
//! - resize propagation to owned nodes, at push time and afterwards
//! - in-order node execution
//! - downcasting nodes to retrieve pass outputs
//! - a full velocity + HBAO frame through one FrameContext

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Affine3A, Vec3};

use wisp::{
    Camera, DepthBuffer, FrameContext, HbaoPass, HbaoSettings, Pipeline, RenderNode, RenderObject,
    RenderTarget, Scene, SceneRenderer, SurfaceMaterial, VelocityPass,
};

struct NoopRenderer;

impl SceneRenderer for NoopRenderer {
    fn render(&mut self, scene: &Scene, _camera: &Camera, target: &mut RenderTarget) {
        if let Some(background) = scene.background {
            target.clear(background);
        }
    }
}

struct RecordingNode {
    name: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl RenderNode for RecordingNode {
    fn name(&self) -> &str {
        self.name
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn run(&mut self, _ctx: &mut FrameContext<'_>) {
        self.log.borrow_mut().push(self.name);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn test_scene() -> (Scene, Camera) {
    let mut scene = Scene::new();
    let material = scene.add_surface_material(SurfaceMaterial::new("plaster"));
    let mut object = RenderObject::new("cube", material);
    object.world = Affine3A::from_translation(Vec3::new(0.0, 0.0, -5.0));
    scene.add_object(object);
    (scene, Camera::new_perspective(60.0, 1.0, 0.1, 100.0))
}

#[test]
fn test_resize_propagates_to_nodes() {
    let mut pipeline = Pipeline::new();
    pipeline.push(Box::new(VelocityPass::new()));
    pipeline.set_size(64, 32);
    // Nodes pushed after a resize are brought to the current resolution
    pipeline.push(Box::new(HbaoPass::with_generated_noise()));

    let velocity = pipeline.nodes()[0]
        .as_any()
        .downcast_ref::<VelocityPass>()
        .unwrap();
    assert_eq!(velocity.target().width(), 64);
    assert_eq!(velocity.target().height(), 32);

    let hbao = pipeline.nodes()[1]
        .as_any()
        .downcast_ref::<HbaoPass>()
        .unwrap();
    assert_eq!(hbao.occlusion().width(), 64);
    assert_eq!(hbao.occlusion().height(), 32);
}

#[test]
fn test_nodes_run_in_insertion_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pipeline = Pipeline::new();
    for name in ["first", "second", "third"] {
        pipeline.push(Box::new(RecordingNode {
            name,
            log: Rc::clone(&log),
        }));
    }

    let (mut scene, camera) = test_scene();
    let mut renderer = NoopRenderer;
    let settings = HbaoSettings::new();
    let mut ctx = FrameContext {
        scene: &mut scene,
        camera: &camera,
        renderer: &mut renderer,
        depth: None,
        hbao: &settings,
    };
    pipeline.run(&mut ctx);

    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn test_velocity_and_hbao_share_one_frame() {
    let mut pipeline = Pipeline::new();
    pipeline.set_size(8, 8);
    pipeline.push(Box::new(VelocityPass::new()));
    pipeline.push(Box::new(HbaoPass::with_generated_noise()));

    let (mut scene, camera) = test_scene();
    let mut renderer = NoopRenderer;
    let depth = DepthBuffer::new(8, 8);
    let settings = HbaoSettings::new();

    let mut ctx = FrameContext {
        scene: &mut scene,
        camera: &camera,
        renderer: &mut renderer,
        depth: Some(&depth),
        hbao: &settings,
    };
    pipeline.run(&mut ctx);

    let velocity = pipeline.nodes()[0]
        .as_any()
        .downcast_ref::<VelocityPass>()
        .unwrap();
    assert_eq!(velocity.rendered_objects_this_frame(), 1);

    let hbao = pipeline.nodes()[1]
        .as_any()
        .downcast_ref::<HbaoPass>()
        .unwrap();
    assert_eq!(hbao.occlusion().width(), 8);
    assert_eq!(hbao.frame(), 16);
}

#[test]
fn test_hbao_node_skips_frames_without_depth() {
    let mut pipeline = Pipeline::new();
    pipeline.push(Box::new(HbaoPass::with_generated_noise()));

    let (mut scene, camera) = test_scene();
    let mut renderer = NoopRenderer;
    let settings = HbaoSettings::new();
    let mut ctx = FrameContext {
        scene: &mut scene,
        camera: &camera,
        renderer: &mut renderer,
        depth: None,
        hbao: &settings,
    };
    pipeline.run(&mut ctx);

    let hbao = pipeline.nodes()[0]
        .as_any()
        .downcast_ref::<HbaoPass>()
        .unwrap();
    assert_eq!(hbao.frame(), 0);
}

#[test]
fn test_node_mut_allows_reconfiguring_a_pass() {
    let mut pipeline = Pipeline::new();
    pipeline.push(Box::new(VelocityPass::new()));

    let pass = pipeline
        .node_mut(0)
        .unwrap()
        .as_any_mut()
        .downcast_mut::<VelocityPass>()
        .unwrap();
    pass.set_size(128, 128);
    assert_eq!(pass.target().width(), 128);

    assert!(pipeline.node_mut(1).is_none());
}
