//! Offscreen render target
//!
//! A plain CPU-side pixel store standing in for the renderer's offscreen
//! target allocation primitive. The velocity pass owns one of these; the
//! renderer collaborator writes encoded motion vectors into it.

use glam::Vec4;

/// An RGBA32F offscreen target.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    width: u32,
    height: u32,
    generation: u64,
    texels: Vec<Vec4>,
}

impl RenderTarget {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            generation: 0,
            texels: vec![Vec4::ZERO; (width * height) as usize],
        }
    }

    /// Resizes the backing storage.
    ///
    /// Idempotent: calling with the current dimensions does not reallocate
    /// (the generation counter is unchanged). May be called at any time
    /// between frames.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.generation = self.generation.wrapping_add(1);
        self.texels = vec![Vec4::ZERO; (width * height) as usize];
    }

    /// Fills every texel with `color`.
    pub fn clear(&mut self, color: Vec4) {
        self.texels.fill(color);
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

    /// Bumped every time the backing storage is reallocated.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    #[must_use]
    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        self.texels[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set_texel(&mut self, x: u32, y: u32, value: Vec4) {
        if x < self.width && y < self.height {
            self.texels[(y * self.width + x) as usize] = value;
        }
    }

    #[inline]
    #[must_use]
    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    /// Raw byte view of the texel storage, for upload to a GPU queue.
    #[must_use]
    pub fn texel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}
