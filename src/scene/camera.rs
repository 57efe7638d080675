use glam::{Affine3A, Mat4};

/// Perspective camera.
///
/// Projection follows the wgpu/Vulkan convention (`glam`'s `perspective_rh`,
/// NDC depth in `[0, 1]`). The view matrix is the inverse of the camera's
/// world transform, recomputed by [`Camera::update_view`].
#[derive(Debug, Clone)]
pub struct Camera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // Cached matrices, read-only for the passes
    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) projection_matrix_inverse: Mat4,
}

impl Camera {
    /// Creates a perspective camera. `fov` is the vertical field of view in
    /// degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            projection_matrix_inverse: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the projection matrix from the current fov/aspect/planes.
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.projection_matrix_inverse = self.projection_matrix.inverse();
    }

    /// Updates the cached view matrix from the camera's world transform.
    pub fn update_view(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
    }

    /// Clip transform for an object: projection x (view x world).
    #[must_use]
    pub fn clip_from_world(&self, world: &Affine3A) -> Mat4 {
        self.projection_matrix * (self.view_matrix * Mat4::from(*world))
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix_inverse(&self) -> Mat4 {
        self.projection_matrix_inverse
    }
}
