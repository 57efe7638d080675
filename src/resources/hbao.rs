//! HBAO (Horizon-Based Ambient Occlusion) Configuration
//!
//! This module defines HBAO settings as a pure data structure. The estimator
//! reads the bundle fresh each frame; nothing else affects its correctness.
//!
//! # Algorithm parameters
//!
//! The estimator marches several screen-space directions per pixel, measures
//! horizon angles against the reconstructed view-space surface, and shapes
//! the accumulated estimate with a distance falloff and a final power curve.
//! The raw estimate is then smoothed by a depth-aware denoiser whose edge
//! stopping is controlled by `depth_phi`.

use serde::{Deserialize, Serialize};

/// HBAO estimator configuration (immutable per frame).
///
/// All setters clamp to their documented ranges; degenerate values
/// (`sample_count == 0`, `max_distance == 0`) are valid and yield a fully
/// unoccluded output rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HbaoSettings {
    sample_count: u32,
    max_distance: f32,
    distance_falloff_power: f32,
    depth_bias: f32,
    thickness_rejection: f32,
    occlusion_power: f32,
    denoise_strength: f32,
    denoise_iterations: u32,
    denoise_kernel_radius: u32,
    depth_phi: f32,
}

impl Default for HbaoSettings {
    fn default() -> Self {
        Self {
            sample_count: 16,
            max_distance: 2.0,
            distance_falloff_power: 2.0,
            depth_bias: 0.05,
            thickness_rejection: 0.05,
            occlusion_power: 2.0,
            denoise_strength: 1.0,
            denoise_iterations: 2,
            denoise_kernel_radius: 2,
            depth_phi: 10.0,
        }
    }
}

impl HbaoSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of sampling directions per pixel. Clamped to 0..=64.
    pub fn set_sample_count(&mut self, count: u32) {
        self.sample_count = count.min(64);
    }

    #[inline]
    #[must_use]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Sets the maximum sample distance in view-space units.
    pub fn set_max_distance(&mut self, distance: f32) {
        self.max_distance = distance.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Sets the exponent of the distance falloff curve. Clamped to 1..=20.
    pub fn set_distance_falloff_power(&mut self, power: f32) {
        self.distance_falloff_power = power.clamp(1.0, 20.0);
    }

    #[inline]
    #[must_use]
    pub fn distance_falloff_power(&self) -> f32 {
        self.distance_falloff_power
    }

    /// Sets the horizon-angle sine bias used to suppress self-occlusion.
    /// Clamped to 0..=1.
    pub fn set_depth_bias(&mut self, bias: f32) {
        self.depth_bias = bias.clamp(0.0, 1.0);
    }

    #[inline]
    #[must_use]
    pub fn depth_bias(&self) -> f32 {
        self.depth_bias
    }

    /// Sets the thickness budget: samples whose view-space depth difference
    /// exceeds this are rejected as thin-geometry false occluders.
    pub fn set_thickness_rejection(&mut self, thickness: f32) {
        self.thickness_rejection = thickness.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn thickness_rejection(&self) -> f32 {
        self.thickness_rejection
    }

    /// Sets the exponent applied to the final occlusion value.
    /// Clamped to 0.5..=64.
    pub fn set_occlusion_power(&mut self, power: f32) {
        self.occlusion_power = power.clamp(0.5, 64.0);
    }

    #[inline]
    #[must_use]
    pub fn occlusion_power(&self) -> f32 {
        self.occlusion_power
    }

    /// Sets the denoiser blend strength. Clamped to 0..=5; values above 1
    /// saturate the blend.
    pub fn set_denoise_strength(&mut self, strength: f32) {
        self.denoise_strength = strength.clamp(0.0, 5.0);
    }

    #[inline]
    #[must_use]
    pub fn denoise_strength(&self) -> f32 {
        self.denoise_strength
    }

    /// Sets the number of denoise iterations. Clamped to 0..=5.
    pub fn set_denoise_iterations(&mut self, iterations: u32) {
        self.denoise_iterations = iterations.min(5);
    }

    #[inline]
    #[must_use]
    pub fn denoise_iterations(&self) -> u32 {
        self.denoise_iterations
    }

    /// Sets the denoise kernel radius in pixels. Clamped to 1..=5.
    pub fn set_denoise_kernel_radius(&mut self, radius: u32) {
        self.denoise_kernel_radius = radius.clamp(1, 5);
    }

    #[inline]
    #[must_use]
    pub fn denoise_kernel_radius(&self) -> u32 {
        self.denoise_kernel_radius
    }

    /// Sets the depth-difference rejection sharpness of the denoiser.
    /// Clamped to 0..=50.
    pub fn set_depth_phi(&mut self, phi: f32) {
        self.depth_phi = phi.clamp(0.0, 50.0);
    }

    #[inline]
    #[must_use]
    pub fn depth_phi(&self) -> f32 {
        self.depth_phi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_clamp() {
        let mut settings = HbaoSettings::new();

        settings.set_sample_count(1000);
        assert_eq!(settings.sample_count(), 64);

        settings.set_max_distance(-3.0);
        assert_eq!(settings.max_distance(), 0.0);

        settings.set_occlusion_power(0.0);
        assert_eq!(settings.occlusion_power(), 0.5);

        settings.set_denoise_kernel_radius(0);
        assert_eq!(settings.denoise_kernel_radius(), 1);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut settings = HbaoSettings::new();
        settings.set_sample_count(8);
        settings.set_depth_phi(25.0);

        let json = serde_json::to_string(&settings).unwrap();
        let restored: HbaoSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }
}
