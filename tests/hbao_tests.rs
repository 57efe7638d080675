//! Tests for the HBAO pass.
//!
//! Tests for:
//! - degenerate settings passing depth through fully unoccluded
//! - flat geometry staying unoccluded, concave steps darkening
//! - the wrapping frame counter
//! - graceful degradation while the noise texture is still loading
//! - occlusion buffer auto-resize against the depth input

use wisp::{Camera, DepthBuffer, HbaoPass, HbaoSettings, NoiseHandle, NoiseTexture};

fn test_camera() -> Camera {
    Camera::new_perspective(90.0, 1.0, 0.1, 100.0)
}

/// NDC depth for a view-space distance under the test camera.
fn ndc_depth(camera: &Camera, distance: f32) -> f32 {
    let clip = camera.projection_matrix() * glam::Vec4::new(0.0, 0.0, -distance, 1.0);
    clip.z / clip.w
}

#[test]
fn test_zero_samples_is_fully_unoccluded() {
    let camera = test_camera();
    let depth = DepthBuffer::from_data(4, 4, vec![0.5; 16]).unwrap();
    let mut settings = HbaoSettings::new();
    settings.set_sample_count(0);

    let mut pass = HbaoPass::with_generated_noise();
    pass.render(&depth, &camera, &settings);
    assert!(pass.occlusion().data().iter().all(|&ao| ao == 1.0));
}

#[test]
fn test_zero_distance_is_fully_unoccluded() {
    let camera = test_camera();
    let depth = DepthBuffer::from_data(4, 4, vec![0.5; 16]).unwrap();
    let mut settings = HbaoSettings::new();
    settings.set_max_distance(0.0);

    let mut pass = HbaoPass::with_generated_noise();
    pass.render(&depth, &camera, &settings);
    assert!(pass.occlusion().data().iter().all(|&ao| ao == 1.0));
}

#[test]
fn test_background_pixels_stay_unoccluded() {
    let camera = test_camera();
    // Far-plane depth everywhere
    let depth = DepthBuffer::new(8, 8);

    let mut pass = HbaoPass::with_generated_noise();
    pass.render(&depth, &camera, &HbaoSettings::new());
    assert!(pass.occlusion().data().iter().all(|&ao| ao == 1.0));
}

#[test]
fn test_flat_plane_is_mostly_unoccluded() {
    let camera = test_camera();
    let d = ndc_depth(&camera, 2.0);
    let depth = DepthBuffer::from_data(16, 16, vec![d; 256]).unwrap();

    let mut pass = HbaoPass::with_generated_noise();
    pass.render(&depth, &camera, &HbaoSettings::new());

    for &ao in pass.occlusion().data() {
        assert!(ao > 0.9, "flat plane occluded: {ao}");
    }
}

#[test]
fn test_concave_step_darkens_far_side() {
    let camera = test_camera();
    let near = ndc_depth(&camera, 1.0);
    let far = ndc_depth(&camera, 1.2);

    // Left half one step closer to the camera than the right half
    let mut depth = DepthBuffer::new(32, 32);
    for y in 0..32 {
        for x in 0..32 {
            depth.set(x, y, if x < 16 { near } else { far });
        }
    }

    let mut settings = HbaoSettings::new();
    settings.set_max_distance(1.0);
    // The step is a real occluder, not thin geometry
    settings.set_thickness_rejection(1.0);
    settings.set_denoise_iterations(0);

    let mut pass = HbaoPass::with_generated_noise();
    pass.render(&depth, &camera, &settings);

    let at_step = pass.occlusion().get(17, 16);
    let far_from_step = pass.occlusion().get(30, 16);
    assert!(at_step < 0.95, "step edge not occluded: {at_step}");
    assert!(at_step < far_from_step);
}

#[test]
fn test_denoise_smooths_toward_neighbors() {
    let camera = test_camera();
    let d = ndc_depth(&camera, 2.0);
    let depth = DepthBuffer::from_data(16, 16, vec![d; 256]).unwrap();

    let mut settings = HbaoSettings::new();
    settings.set_denoise_iterations(3);
    settings.set_denoise_strength(1.0);

    let mut pass = HbaoPass::with_generated_noise();
    pass.render(&depth, &camera, &settings);

    // A flat plane denoised on uniform depth stays near-uniform
    let data = pass.occlusion().data();
    let (min, max) = data
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    assert!(max - min < 0.1, "denoised flat plane spread: {}", max - min);
}

#[test]
fn test_frame_counter_advances_by_sample_count() {
    let camera = test_camera();
    let depth = DepthBuffer::new(2, 2);
    let mut settings = HbaoSettings::new();
    settings.set_sample_count(16);

    let mut pass = HbaoPass::with_generated_noise();
    assert_eq!(pass.frame(), 0);
    pass.render(&depth, &camera, &settings);
    assert_eq!(pass.frame(), 16);
    pass.render(&depth, &camera, &settings);
    assert_eq!(pass.frame(), 32);
}

#[test]
fn test_frame_counter_wraps() {
    let camera = test_camera();
    let depth = DepthBuffer::new(1, 1);
    let mut settings = HbaoSettings::new();
    settings.set_sample_count(16);

    let mut pass = HbaoPass::with_generated_noise();
    for _ in 0..4096 {
        pass.render(&depth, &camera, &settings);
    }
    assert_eq!(pass.frame(), 0);
}

#[test]
fn test_pending_noise_degrades_gracefully() {
    let camera = test_camera();
    let d = ndc_depth(&camera, 2.0);
    let depth = DepthBuffer::from_data(8, 8, vec![d; 64]).unwrap();

    let (handle, tx) = NoiseHandle::pending();
    let mut pass = HbaoPass::new(handle);

    // Estimator runs undithered while the texture is in flight
    pass.render(&depth, &camera, &HbaoSettings::new());
    assert!(pass.occlusion().data().iter().all(|ao| ao.is_finite()));

    tx.send(NoiseTexture::generate(4, 4)).unwrap();
    pass.render(&depth, &camera, &HbaoSettings::new());
    assert_eq!(pass.occlusion().width(), 8);
}

#[test]
fn test_occlusion_buffer_tracks_depth_dimensions() {
    let camera = test_camera();
    let mut pass = HbaoPass::with_generated_noise();
    pass.set_size(8, 8);

    let depth = DepthBuffer::new(16, 12);
    pass.render(&depth, &camera, &HbaoSettings::new());
    assert_eq!(pass.occlusion().width(), 16);
    assert_eq!(pass.occlusion().height(), 12);
}
