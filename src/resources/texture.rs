//! CPU texel stores
//!
//! Provides:
//! - BoneTexture: square RGBA32F block encoding per-bone joint matrices
//! - RetiredTextures: deferred disposal list for replaced bone textures
//! - DepthBuffer: per-pixel NDC depth input for the HBAO estimator
//! - OcclusionBuffer: per-pixel occlusion scalar output
//! - NoiseTexture / NoiseHandle: tileable dither pattern with promise-style
//!   delivery for asynchronously loaded noise assets

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec2};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::errors::{Result, WispError};

// Global texture ID generator. IDs never repeat, so storage reuse versus
// reallocation is observable through identity.
static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

fn next_texture_id() -> u64 {
    NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// BoneTexture
// ============================================================================

/// A square RGBA32F texel block encoding skinning joint matrices.
///
/// Each 4x4 matrix occupies four consecutive RGBA texels. The texture is
/// sized to the smallest power-of-two square (minimum 4) that fits all
/// joints, so the size only changes when the joint count crosses a
/// power-of-two boundary.
#[derive(Debug)]
pub struct BoneTexture {
    id: u64,
    size: u32,
    data: Vec<f32>,
}

impl BoneTexture {
    /// Side length required for `joint_count` matrices.
    #[must_use]
    pub fn size_for(joint_count: usize) -> u32 {
        let texels = (joint_count * 4) as f32;
        (texels.sqrt().ceil() as u32).next_power_of_two().max(4)
    }

    /// Builds a bone texture holding the given joint matrices.
    #[must_use]
    pub fn from_joint_matrices(joints: &[Mat4]) -> Self {
        let size = Self::size_for(joints.len());
        let mut texture = Self {
            id: next_texture_id(),
            size,
            data: vec![0.0; (size * size * 4) as usize],
        };
        texture.pack(joints);
        texture
    }

    /// Builds a texture from raw texel data.
    pub fn from_texels(size: u32, data: Vec<f32>) -> Result<Self> {
        if size == 0 {
            return Err(WispError::EmptyResource("bone texture"));
        }
        let expected = (size * size * 4) as usize;
        if data.len() != expected {
            return Err(WispError::TexelSizeMismatch {
                context: "bone texture",
                width: size,
                height: size,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            id: next_texture_id(),
            size,
            data,
        })
    }

    /// Allocates an independent copy with its own identity.
    #[must_use]
    pub fn snapshot_of(source: &BoneTexture) -> Self {
        Self {
            id: next_texture_id(),
            size: source.size,
            data: source.data.clone(),
        }
    }

    /// Rewrites the joint matrices in place when the required size is
    /// unchanged; otherwise reallocates storage under a fresh identity.
    pub fn write_joint_matrices(&mut self, joints: &[Mat4]) {
        let required = Self::size_for(joints.len());
        if required != self.size {
            self.id = next_texture_id();
            self.size = required;
            self.data = vec![0.0; (required * required * 4) as usize];
        } else {
            self.data.fill(0.0);
        }
        self.pack(joints);
    }

    /// Overwrites this texture's texels from `source`. Both textures must
    /// have the same size; callers handle the reallocation path.
    pub(crate) fn copy_from(&mut self, source: &BoneTexture) {
        debug_assert_eq!(self.size, source.size);
        self.data.copy_from_slice(&source.data);
    }

    fn pack(&mut self, joints: &[Mat4]) {
        for (i, m) in joints.iter().enumerate() {
            let offset = i * 16;
            self.data[offset..offset + 16].copy_from_slice(&m.to_cols_array());
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Raw byte view of the texel storage, for upload to a GPU queue.
    #[must_use]
    pub fn data_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Reads back the joint matrix at `index`.
    #[must_use]
    pub fn joint_matrix(&self, index: usize) -> Mat4 {
        let offset = index * 16;
        let mut cols = [0.0f32; 16];
        cols.copy_from_slice(&self.data[offset..offset + 16]);
        Mat4::from_cols_array(&cols)
    }
}

// ============================================================================
// RetiredTextures
// ============================================================================

/// Bone textures replaced mid-frame.
///
/// Disposal is deferred until the frame that stopped referencing them has
/// been submitted: the velocity pass flushes this list at the end of its
/// restore phase, releasing each texture exactly once.
#[derive(Debug, Default)]
pub struct RetiredTextures {
    textures: Vec<BoneTexture>,
}

impl RetiredTextures {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, texture: BoneTexture) {
        self.textures.push(texture);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// IDs of the textures currently awaiting disposal.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.textures.iter().map(BoneTexture::id)
    }

    /// Releases all retired textures, returning how many were dropped.
    pub fn flush(&mut self) -> usize {
        let count = self.textures.len();
        self.textures.clear();
        count
    }
}

// ============================================================================
// DepthBuffer / OcclusionBuffer
// ============================================================================

/// Per-pixel NDC depth (`[0, 1]`, 1.0 = far plane / background).
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthBuffer {
    /// Creates a buffer cleared to the far plane.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![1.0; (width * height) as usize],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = (width * height) as usize;
        if data.len() != expected {
            return Err(WispError::TexelSizeMismatch {
                context: "depth buffer",
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth at pixel center, clamped addressing.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, depth: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = depth;
        }
    }
}

/// Per-pixel occlusion scalar (`1.0` = fully unoccluded).
#[derive(Debug, Clone)]
pub struct OcclusionBuffer {
    width: u32,
    height: u32,
    pub(crate) data: Vec<f32>,
}

impl OcclusionBuffer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![1.0; (width * height) as usize],
        }
    }

    /// Reallocates to new dimensions, resetting to fully unoccluded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize((width * height) as usize, 1.0);
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y.min(self.height - 1) * self.width + x.min(self.width - 1)) as usize]
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

// ============================================================================
// NoiseTexture / NoiseHandle
// ============================================================================

/// A tileable RGBA8 dither pattern addressed by screen position.
///
/// `Repeat` addressing, `Nearest` filtering semantics.
#[derive(Debug, Clone)]
pub struct NoiseTexture {
    width: u32,
    height: u32,
    data: Vec<[u8; 4]>,
}

impl NoiseTexture {
    pub fn from_rgba(width: u32, height: u32, data: Vec<[u8; 4]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WispError::EmptyResource("noise texture"));
        }
        let expected = (width * height) as usize;
        if data.len() != expected {
            return Err(WispError::TexelSizeMismatch {
                context: "noise texture",
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Generates a deterministic random pattern.
    ///
    /// Stand-in for the blue-noise asset; uses a fixed seed so results are
    /// stable across frames and sessions.
    #[must_use]
    pub fn generate(width: u32, height: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(12345);
        let mut data = Vec::with_capacity((width * height) as usize);
        for _ in 0..width * height {
            data.push([
                rng.random_range(0..=u8::MAX),
                rng.random_range(0..=u8::MAX),
                rng.random_range(0..=u8::MAX),
                255,
            ]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples the RG channels at a wrapped pixel address, remapped to
    /// `[0, 1)`.
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> Vec2 {
        let texel = self.data[((y % self.height) * self.width + (x % self.width)) as usize];
        Vec2::new(f32::from(texel[0]), f32::from(texel[1])) / 256.0
    }
}

/// Promise-style handle for a noise texture that may still be loading.
///
/// The HBAO pass polls this each frame; until the texture resolves, the
/// estimator runs undithered (zero noise offset) rather than faulting.
#[derive(Debug)]
pub struct NoiseHandle {
    receiver: Option<flume::Receiver<NoiseTexture>>,
    texture: Option<NoiseTexture>,
}

impl NoiseHandle {
    /// Handle whose texture is available immediately.
    #[must_use]
    pub fn ready(texture: NoiseTexture) -> Self {
        Self {
            receiver: None,
            texture: Some(texture),
        }
    }

    /// Handle that resolves once a texture is sent on the returned channel.
    #[must_use]
    pub fn pending() -> (Self, flume::Sender<NoiseTexture>) {
        let (tx, rx) = flume::bounded(1);
        (
            Self {
                receiver: Some(rx),
                texture: None,
            },
            tx,
        )
    }

    /// Returns the texture if it has arrived, completing the handle on the
    /// first successful receive.
    pub fn poll(&mut self) -> Option<&NoiseTexture> {
        if self.texture.is_none()
            && let Some(receiver) = &self.receiver
            && let Ok(texture) = receiver.try_recv()
        {
            log::debug!(
                "noise texture resolved ({}x{})",
                texture.width,
                texture.height
            );
            self.texture = Some(texture);
            self.receiver = None;
        }
        self.texture.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.texture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_texture_sizing() {
        // 4 texels per matrix, power-of-two square, minimum 4
        assert_eq!(BoneTexture::size_for(1), 4);
        assert_eq!(BoneTexture::size_for(4), 4);
        assert_eq!(BoneTexture::size_for(16), 8);
        assert_eq!(BoneTexture::size_for(64), 16);
    }

    #[test]
    fn test_bone_texture_roundtrip() {
        let joints = vec![Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0)); 3];
        let texture = BoneTexture::from_joint_matrices(&joints);
        assert_eq!(texture.joint_matrix(2), joints[2]);
    }

    #[test]
    fn test_bone_texture_in_place_rewrite_keeps_identity() {
        let mut texture = BoneTexture::from_joint_matrices(&[Mat4::IDENTITY; 4]);
        let id = texture.id();
        texture.write_joint_matrices(&[Mat4::IDENTITY; 3]);
        assert_eq!(texture.id(), id);

        // Crossing the size boundary reallocates under a new identity
        texture.write_joint_matrices(&[Mat4::IDENTITY; 16]);
        assert_ne!(texture.id(), id);
        assert_eq!(texture.size(), 8);
    }

    #[test]
    fn test_texel_validation() {
        assert!(BoneTexture::from_texels(4, vec![0.0; 64]).is_ok());
        assert!(matches!(
            BoneTexture::from_texels(4, vec![0.0; 63]),
            Err(WispError::TexelSizeMismatch { .. })
        ));
        assert!(matches!(
            NoiseTexture::from_rgba(0, 4, Vec::new()),
            Err(WispError::EmptyResource(_))
        ));
    }

    #[test]
    fn test_noise_handle_resolves_once_sent() {
        let (mut handle, tx) = NoiseHandle::pending();
        assert!(handle.poll().is_none());

        tx.send(NoiseTexture::generate(4, 4)).unwrap();
        assert!(handle.poll().is_some());
        assert!(handle.is_ready());
    }
}
