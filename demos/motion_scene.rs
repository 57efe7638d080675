//! Runs a few frames of the velocity + HBAO pipeline over a synthetic scene
//! and prints per-frame buffer statistics.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example motion_scene
//! ```

use glam::{Affine3A, Mat4, Vec3};

use wisp::{
    Camera, DepthBuffer, FrameContext, HbaoPass, HbaoSettings, Material, Pipeline, RenderObject,
    RenderTarget, Scene, SceneRenderer, Skin, SurfaceMaterial, VelocityPass,
};

/// Splats each object's origin into the target using its substituted
/// velocity material.
struct SplatRenderer;

impl SceneRenderer for SplatRenderer {
    fn render(&mut self, scene: &Scene, _camera: &Camera, target: &mut RenderTarget) {
        if let Some(background) = scene.background {
            target.clear(background);
        }
        for key in scene.visible_objects() {
            let object = &scene.objects[key];
            let Some(material) = scene.material(object.material).and_then(Material::as_velocity)
            else {
                continue;
            };
            let clip = material.clip_position(Vec3::ZERO);
            if clip.w <= 0.0 {
                continue;
            }
            let x = ((clip.x / clip.w * 0.5 + 0.5) * target.width() as f32) as u32;
            let y = ((0.5 - clip.y / clip.w * 0.5) * target.height() as f32) as u32;
            target.set_texel(x, y, material.evaluate(Vec3::ZERO));
        }
    }
}

fn main() {
    env_logger::init();

    let mut scene = Scene::new();
    let plaster = scene.add_surface_material(SurfaceMaterial::new("plaster"));

    let mut cube = RenderObject::new("cube", plaster);
    cube.world = Affine3A::from_translation(Vec3::new(0.0, 0.0, -5.0));
    let cube_key = scene.add_object(cube);

    let mut dancer = RenderObject::new("dancer", plaster);
    dancer.world = Affine3A::from_translation(Vec3::new(1.5, 0.0, -6.0));
    dancer.skin = Some(Skin::from_joint_matrices(&[Mat4::IDENTITY; 24]));
    scene.add_object(dancer);

    let camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let mut renderer = SplatRenderer;
    let settings = HbaoSettings::new();

    let mut pipeline = Pipeline::new();
    pipeline.push(Box::new(VelocityPass::new()));
    pipeline.push(Box::new(HbaoPass::with_generated_noise()));
    pipeline.set_size(128, 128);

    let depth = DepthBuffer::from_data(128, 128, vec![0.9; 128 * 128]).unwrap();

    for frame in 0..4 {
        // Drift the cube so it produces nonzero motion vectors
        scene.objects[cube_key].world =
            Affine3A::from_translation(Vec3::new(0.1 * frame as f32, 0.0, -5.0));

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
        let peak = velocity
            .target()
            .texels()
            .iter()
            .map(|texel| texel.truncate().truncate().length())
            .fold(0.0f32, f32::max);

        let hbao = pipeline.nodes()[1]
            .as_any()
            .downcast_ref::<HbaoPass>()
            .unwrap();
        let mean_ao =
            hbao.occlusion().data().iter().sum::<f32>() / hbao.occlusion().data().len() as f32;

        println!(
            "frame {frame}: {} objects, peak |velocity| = {peak:.5}, mean AO = {mean_ao:.3}",
            velocity.rendered_objects_this_frame()
        );
    }
}
