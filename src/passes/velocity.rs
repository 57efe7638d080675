//! Velocity (motion vector) pass
//!
//! Renders the scene once with every visible object's shading material
//! transparently substituted by a generated [`VelocityMaterial`], producing
//! an offscreen buffer of per-pixel screen-space displacements. The scene
//! must observe no persistent change to object materials outside the render
//! phase, and persistent per-object state (skinning pose history, transform
//! history) must survive across frames — that discipline lives in the
//! substitution cache and the per-material state machine.
//!
//! # Frame protocol
//!
//! Three sequential phases per frame, always in order, never overlapping
//! across frames:
//!
//! 1. **Install** — resolve each visible object's substitution entry, write
//!    this frame's clip transform, mirror render flags, bind skinning, and
//!    swap the velocity material in.
//! 2. **Render** — override the scene background with the neutral no-motion
//!    clear, submit one render into the offscreen target, restore the
//!    background.
//! 3. **Restore** — advance each material's current transform into its
//!    previous slot (the one-frame-lag invariant), snapshot bone textures,
//!    rebind original materials, sweep dead cache entries, and flush
//!    deferred disposals.

use glam::{Affine3A, Vec4};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::passes::node::{FrameContext, RenderNode, SceneRenderer};
use crate::resources::material::{Material, MaterialKey, MaterialStore};
use crate::resources::target::RenderTarget;
use crate::resources::texture::RetiredTextures;
use crate::resources::velocity_material::VelocityMaterial;
use crate::scene::camera::Camera;
use crate::scene::object::{ObjectKey, RenderObject};
use crate::scene::scene::Scene;

/// Background value during the velocity render: unoccluded pixels decode to
/// zero motion.
pub const NO_MOTION_CLEAR: Vec4 = Vec4::ZERO;

// ============================================================================
// MaterialSubstitutionCache
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct SubstitutionEntry {
    /// The original material reference last observed for this object.
    original: MaterialKey,
    /// The generated velocity material bound to it.
    velocity: MaterialKey,
}

/// Per-object mapping from original shading material to generated velocity
/// material.
///
/// Keyed by object identity, so holding an entry never extends an object's
/// lifetime. Entries for removed objects are collected by [`sweep`], called
/// once per frame by the pass; hosts that destroy objects explicitly may
/// call [`remove`] instead.
///
/// [`sweep`]: MaterialSubstitutionCache::sweep
/// [`remove`]: MaterialSubstitutionCache::remove
#[derive(Debug, Default)]
pub struct MaterialSubstitutionCache {
    entries: FxHashMap<ObjectKey, SubstitutionEntry>,
}

impl MaterialSubstitutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-fetch the velocity material for `object`.
    ///
    /// When the object's current `original` material matches the recorded
    /// one, the existing state is returned. When it differs, the host has
    /// swapped the object's shading material: the stale velocity material is
    /// discarded (its bone snapshot retired) and a fresh one is created, so
    /// transform history is not carried over to a different surface.
    ///
    /// Returns the velocity material key and whether it was newly created.
    pub fn resolve(
        &mut self,
        object: ObjectKey,
        original: MaterialKey,
        materials: &mut MaterialStore,
        retired: &mut RetiredTextures,
    ) -> (MaterialKey, bool) {
        if let Some(entry) = self.entries.get(&object) {
            if entry.original == original {
                return (entry.velocity, false);
            }
            log::debug!("object {object:?} changed material; regenerating velocity state");
            Self::dispose_velocity(materials, entry.velocity, retired);
        }

        let velocity = materials.insert(Material::Velocity(VelocityMaterial::new()));
        self.entries
            .insert(object, SubstitutionEntry { original, velocity });
        (velocity, true)
    }

    /// The recorded original material for `object`, if cached.
    #[must_use]
    pub fn original(&self, object: ObjectKey) -> Option<MaterialKey> {
        self.entries.get(&object).map(|entry| entry.original)
    }

    /// The generated velocity material for `object`, if cached.
    #[must_use]
    pub fn velocity(&self, object: ObjectKey) -> Option<MaterialKey> {
        self.entries.get(&object).map(|entry| entry.velocity)
    }

    /// Explicitly drops the entry for a destroyed object.
    pub fn remove(
        &mut self,
        object: ObjectKey,
        materials: &mut MaterialStore,
        retired: &mut RetiredTextures,
    ) {
        if let Some(entry) = self.entries.remove(&object) {
            Self::dispose_velocity(materials, entry.velocity, retired);
        }
    }

    /// Collects entries whose object no longer exists in the scene.
    pub fn sweep(
        &mut self,
        objects: &SlotMap<ObjectKey, RenderObject>,
        materials: &mut MaterialStore,
        retired: &mut RetiredTextures,
    ) {
        self.entries.retain(|&object, entry| {
            if objects.contains_key(object) {
                return true;
            }
            log::debug!("collecting velocity state for removed object {object:?}");
            Self::dispose_velocity(materials, entry.velocity, retired);
            false
        });
    }

    fn dispose_velocity(
        materials: &mut MaterialStore,
        velocity: MaterialKey,
        retired: &mut RetiredTextures,
    ) {
        if let Some(Material::Velocity(mut material)) = materials.remove(velocity)
            && let Some(snapshot) = material.take_prev_bone_texture()
        {
            retired.push(snapshot);
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// VelocityPass
// ============================================================================

/// Three-phase velocity pass orchestrator.
pub struct VelocityPass {
    target: RenderTarget,
    cache: MaterialSubstitutionCache,
    /// Visibility set captured at install time; restore iterates exactly this.
    installed: Vec<ObjectKey>,
    retired: RetiredTextures,
    rendered_objects_this_frame: usize,
    last_camera_world: Affine3A,
}

impl Default for VelocityPass {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: RenderTarget::new(1, 1),
            cache: MaterialSubstitutionCache::new(),
            installed: Vec::new(),
            retired: RetiredTextures::new(),
            rendered_objects_this_frame: 0,
            last_camera_world: Affine3A::IDENTITY,
        }
    }

    /// Resizes the offscreen velocity buffer. Idempotent; callable at any
    /// time between frames, independent of the frame protocol.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.target.set_size(width, height);
    }

    /// Runs the full three-phase protocol for one frame.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        renderer: &mut dyn SceneRenderer,
    ) {
        self.install(scene, camera);
        self.render_velocity(scene, camera, renderer);
        self.restore(scene);
        self.last_camera_world = *camera.world_matrix();
    }

    /// Phase 1: substitute velocity materials across the visibility set.
    fn install(&mut self, scene: &mut Scene, camera: &Camera) {
        self.rendered_objects_this_frame = 0;
        self.installed.clear();
        self.installed.extend(scene.visible_objects());
        let installed = std::mem::take(&mut self.installed);

        let Scene {
            objects, materials, ..
        } = scene;

        for &key in &installed {
            let Some(object) = objects.get_mut(key) else {
                continue;
            };
            let original_key = object.material;
            let Some(Material::Surface(surface)) = materials.get(original_key) else {
                // Not a surface material; nothing to substitute.
                continue;
            };
            let full_motion = object.needs_updated_reflections || surface.video_map;
            let flags = surface.flags;
            let clip = camera.clip_from_world(&object.world);

            let (velocity_key, created) =
                self.cache
                    .resolve(key, original_key, materials, &mut self.retired);
            let Some(Material::Velocity(velocity)) = materials.get_mut(velocity_key) else {
                continue;
            };

            velocity.begin_frame(clip, full_motion);
            velocity.sync_render_flags(&flags);
            if let Some(skin) = &object.skin {
                velocity.bind_skinning(&skin.bone_texture);
                if created {
                    // Fresh entry: seed the previous-frame pose with the
                    // current one so the first frame encodes zero bone motion.
                    velocity.snapshot_bones(&skin.bone_texture, &mut self.retired);
                }
            }

            object.material = velocity_key;
            self.rendered_objects_this_frame += 1;
        }

        self.installed = installed;
    }

    /// Phase 2: one render into the offscreen target under the neutral
    /// background.
    fn render_velocity(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        renderer: &mut dyn SceneRenderer,
    ) {
        let background = scene.background;
        scene.background = Some(NO_MOTION_CLEAR);
        renderer.render(scene, camera, &mut self.target);
        scene.background = background;
    }

    /// Phase 3: advance per-object state and rebind original materials.
    fn restore(&mut self, scene: &mut Scene) {
        let installed = std::mem::take(&mut self.installed);

        let Scene {
            objects, materials, ..
        } = scene;

        for &key in &installed {
            let Some(object) = objects.get_mut(key) else {
                // Removed mid-frame; the sweep below collects its entry.
                continue;
            };
            let Some(velocity_key) = self.cache.velocity(key) else {
                continue;
            };
            if object.material != velocity_key {
                continue;
            }

            if let Some(Material::Velocity(velocity)) = materials.get_mut(velocity_key) {
                velocity.end_frame(
                    object.world,
                    object.skin.as_ref().map(|skin| &skin.bone_texture),
                    &mut self.retired,
                );
            }
            if let Some(original) = self.cache.original(key) {
                object.material = original;
            }
        }

        self.cache.sweep(objects, materials, &mut self.retired);
        let disposed = self.retired.flush();
        if disposed > 0 {
            log::trace!("velocity pass disposed {disposed} retired bone texture(s)");
        }

        self.installed = installed;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The offscreen velocity buffer.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &MaterialSubstitutionCache {
        &self.cache
    }

    /// Objects substituted during the most recent install phase.
    #[inline]
    #[must_use]
    pub fn rendered_objects_this_frame(&self) -> usize {
        self.rendered_objects_this_frame
    }

    /// Camera world transform snapshotted at the end of the last frame.
    #[inline]
    #[must_use]
    pub fn last_camera_world(&self) -> &Affine3A {
        &self.last_camera_world
    }
}

impl RenderNode for VelocityPass {
    fn name(&self) -> &str {
        "velocity"
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.set_size(width, height);
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) {
        self.render(ctx.scene, ctx.camera, ctx.renderer);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
