//! HBAO (Horizon-Based Ambient Occlusion) pass
//!
//! A stateless per-pixel estimator: view-space position is reconstructed
//! from depth and the inverse projection matrix, several screen-space
//! directions are marched per pixel, and the accumulated horizon-angle
//! estimate is shaped by the configured falloff and power curves. The only
//! cross-frame state is a wrapping frame counter that rotates the dither
//! pattern so a downstream temporal accumulator can average the noise out.
//!
//! The noise pattern arrives through a promise-style [`NoiseHandle`]; until
//! it resolves the estimator runs undithered (zero offset) rather than
//! faulting.

use glam::{Mat4, Vec3, Vec4};

use crate::passes::node::{FrameContext, RenderNode};
use crate::resources::hbao::HbaoSettings;
use crate::resources::texture::{DepthBuffer, NoiseHandle, NoiseTexture, OcclusionBuffer};
use crate::scene::camera::Camera;

/// Frame counter modulus. Precision past the wrap is irrelevant; the counter
/// only has to keep successive frames' dither offsets decorrelated.
const FRAME_WRAP: u32 = 65536;

/// Ray-march steps per sampling direction.
const MARCH_STEPS: u32 = 4;

/// Horizon-based ambient occlusion estimator.
pub struct HbaoPass {
    frame: u32,
    noise: NoiseHandle,
    occlusion: OcclusionBuffer,
    scratch: Vec<f32>,
    noted_pending_noise: bool,
}

impl HbaoPass {
    #[must_use]
    pub fn new(noise: NoiseHandle) -> Self {
        Self {
            frame: 0,
            noise,
            occlusion: OcclusionBuffer::new(1, 1),
            scratch: Vec::new(),
            noted_pending_noise: false,
        }
    }

    /// Convenience constructor with a generated 64x64 dither pattern.
    #[must_use]
    pub fn with_generated_noise() -> Self {
        Self::new(NoiseHandle::ready(NoiseTexture::generate(64, 64)))
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.occlusion.width() != width || self.occlusion.height() != height {
            self.occlusion.resize(width, height);
        }
    }

    /// Estimates occlusion for every pixel of `depth`.
    ///
    /// The occlusion buffer is reallocated to match the depth input when
    /// dimensions differ; a size mismatch never fails the frame.
    pub fn render(&mut self, depth: &DepthBuffer, camera: &Camera, settings: &HbaoSettings) {
        self.frame = (self.frame + settings.sample_count()) % FRAME_WRAP;

        if self.occlusion.width() != depth.width() || self.occlusion.height() != depth.height() {
            log::debug!(
                "occlusion buffer resized to {}x{}",
                depth.width(),
                depth.height()
            );
            self.occlusion.resize(depth.width(), depth.height());
        }

        if !self.noise.is_ready() && !self.noted_pending_noise {
            log::debug!("noise texture not yet available; estimator runs undithered");
            self.noted_pending_noise = true;
        }

        let frame = self.frame;
        let Self {
            noise,
            occlusion,
            scratch,
            ..
        } = self;
        let noise = noise.poll();

        estimate(depth, camera, settings, noise, frame, occlusion);
        denoise(depth, settings, occlusion, scratch);
    }

    /// The per-pixel occlusion output (`1.0` = fully unoccluded).
    #[inline]
    #[must_use]
    pub fn occlusion(&self) -> &OcclusionBuffer {
        &self.occlusion
    }

    /// Current value of the wrapping frame counter.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }
}

impl RenderNode for HbaoPass {
    fn name(&self) -> &str {
        "hbao"
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.set_size(width, height);
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) {
        if let Some(depth) = ctx.depth {
            self.render(depth, ctx.camera, ctx.hbao);
        } else {
            log::trace!("hbao pass skipped: no depth input this frame");
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ============================================================================
// Estimator kernel
// ============================================================================

fn estimate(
    depth: &DepthBuffer,
    camera: &Camera,
    settings: &HbaoSettings,
    noise: Option<&NoiseTexture>,
    frame: u32,
    out: &mut OcclusionBuffer,
) {
    let inv_proj = camera.projection_matrix_inverse();
    // projection[0][0] maps view-space x to NDC x at unit depth
    let proj_scale = camera.projection_matrix().col(0).x;
    let width = depth.width();

    for y in 0..depth.height() {
        for x in 0..width {
            out.data[(y * width + x) as usize] =
                estimate_pixel(depth, x, y, &inv_proj, proj_scale, settings, noise, frame);
        }
    }
}

#[allow(clippy::similar_names, clippy::too_many_arguments)]
fn estimate_pixel(
    depth: &DepthBuffer,
    x: u32,
    y: u32,
    inv_proj: &Mat4,
    proj_scale: f32,
    settings: &HbaoSettings,
    noise: Option<&NoiseTexture>,
    frame: u32,
) -> f32 {
    let sample_count = settings.sample_count();
    let max_distance = settings.max_distance();
    if sample_count == 0 || max_distance <= 0.0 {
        return 1.0;
    }
    if depth.get(x, y) >= 1.0 {
        // Far plane: background pixel
        return 1.0;
    }

    let center = reconstruct_view_pos(depth, x, y, inv_proj);
    let normal = view_normal(depth, x, y, inv_proj);

    // Screen-space footprint of the view-space sampling radius at this depth
    let radius_ndc = max_distance * proj_scale / center.z.abs().max(1e-4);
    let radius_px = 0.5 * radius_ndc * depth.width() as f32;

    let jitter = dither(noise, x, y, frame);
    let width = depth.width() as f32;
    let height = depth.height() as f32;

    let mut occlusion = 0.0f32;
    for i in 0..sample_count {
        let angle = std::f32::consts::TAU * ((i as f32 + jitter) / sample_count as f32);
        let (dir_y, dir_x) = angle.sin_cos();

        let mut horizon = 0.0f32;
        for step in 1..=MARCH_STEPS {
            let t = step as f32 / MARCH_STEPS as f32;
            let sx = x as f32 + 0.5 + dir_x * t * radius_px;
            let sy = y as f32 + 0.5 + dir_y * t * radius_px;
            if sx < 0.0 || sy < 0.0 || sx >= width || sy >= height {
                break;
            }
            let (sxu, syu) = (sx as u32, sy as u32);
            if sxu == x && syu == y {
                continue;
            }
            if depth.get(sxu, syu) >= 1.0 {
                continue;
            }

            let sample = reconstruct_view_pos(depth, sxu, syu, inv_proj);
            let delta = sample - center;
            let distance = delta.length();
            if distance <= 1e-6 || distance > max_distance {
                continue;
            }
            // Thickness rejection: an occluder poking out beyond the budget
            // in front of the surface is treated as thin geometry.
            if sample.z - center.z > settings.thickness_rejection() {
                continue;
            }

            let falloff = (1.0 - distance / max_distance)
                .clamp(0.0, 1.0)
                .powf(settings.distance_falloff_power());
            let sin_elevation = (delta / distance).dot(normal);
            horizon = horizon.max((sin_elevation - settings.depth_bias()).max(0.0) * falloff);
        }
        occlusion += horizon;
    }

    let unoccluded = (1.0 - occlusion / sample_count as f32).clamp(0.0, 1.0);
    unoccluded.powf(settings.occlusion_power())
}

/// Reconstructs the view-space position of a pixel center from its depth.
fn reconstruct_view_pos(depth: &DepthBuffer, x: u32, y: u32, inv_proj: &Mat4) -> Vec3 {
    let ndc = Vec4::new(
        ((x as f32 + 0.5) / depth.width() as f32) * 2.0 - 1.0,
        1.0 - ((y as f32 + 0.5) / depth.height() as f32) * 2.0,
        depth.get(x, y),
        1.0,
    );
    let view = *inv_proj * ndc;
    view.truncate() / view.w
}

/// View-space surface normal from screen-space depth differentials.
fn view_normal(depth: &DepthBuffer, x: u32, y: u32, inv_proj: &Mat4) -> Vec3 {
    let center = reconstruct_view_pos(depth, x, y, inv_proj);
    let right = reconstruct_view_pos(depth, x + 1, y, inv_proj);
    let down = reconstruct_view_pos(depth, x, y + 1, inv_proj);
    (down - center).cross(right - center).normalize_or(Vec3::Z)
}

/// Per-pixel dither offset in `[0, 1)`, rotated by the frame counter.
///
/// Absent noise degrades to a zero offset (undithered sampling).
fn dither(noise: Option<&NoiseTexture>, x: u32, y: u32, frame: u32) -> f32 {
    let Some(noise) = noise else {
        return 0.0;
    };
    let offset_x = frame % noise.width();
    let offset_y = (frame / noise.width()) % noise.height();
    noise.sample(x + offset_x, y + offset_y).x
}

// ============================================================================
// Denoiser
// ============================================================================

/// Depth-aware blur over the raw estimate.
///
/// Weights drop off with squared depth difference scaled by `depth_phi`, so
/// geometric edges are preserved while flat regions are smoothed.
fn denoise(
    depth: &DepthBuffer,
    settings: &HbaoSettings,
    occlusion: &mut OcclusionBuffer,
    scratch: &mut Vec<f32>,
) {
    let iterations = settings.denoise_iterations();
    let blend = settings.denoise_strength().min(1.0);
    if iterations == 0 || blend <= 0.0 {
        return;
    }

    let radius = i64::from(settings.denoise_kernel_radius());
    let phi = settings.depth_phi();
    let width = i64::from(occlusion.width());
    let height = i64::from(occlusion.height());

    for _ in 0..iterations {
        scratch.clear();
        scratch.reserve((width * height) as usize);

        for y in 0..height {
            for x in 0..width {
                let center_depth = depth.get(x as u32, y as u32);
                let raw = occlusion.get(x as u32, y as u32);

                let mut sum = 0.0f32;
                let mut weight_sum = 0.0f32;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let sx = (x + dx).clamp(0, width - 1) as u32;
                        let sy = (y + dy).clamp(0, height - 1) as u32;
                        let depth_delta = center_depth - depth.get(sx, sy);
                        let weight = (-(depth_delta * depth_delta) * phi).exp();
                        sum += occlusion.get(sx, sy) * weight;
                        weight_sum += weight;
                    }
                }

                let blurred = if weight_sum > 0.0 { sum / weight_sum } else { raw };
                scratch.push(raw + (blurred - raw) * blend);
            }
        }

        occlusion.data.copy_from_slice(scratch);
    }
}
