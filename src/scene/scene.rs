use glam::Vec4;
use slotmap::SlotMap;

use crate::resources::material::{Material, MaterialKey, MaterialStore, SurfaceMaterial};
use crate::scene::object::{ObjectKey, RenderObject};

/// The host scene as seen by the auxiliary-buffer passes.
///
/// Pure data: object and material stores plus the background clear value.
/// The visibility traversal yields objects in stable insertion order, which
/// is the ordering the three-phase velocity protocol relies on.
#[derive(Debug, Default)]
pub struct Scene {
    pub objects: SlotMap<ObjectKey, RenderObject>,
    pub materials: MaterialStore,
    /// Background clear value. Temporarily overridden by the velocity pass
    /// during its render phase.
    pub background: Option<Vec4>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host shading material.
    pub fn add_surface_material(&mut self, material: SurfaceMaterial) -> MaterialKey {
        self.materials.insert(Material::Surface(material))
    }

    pub fn add_object(&mut self, object: RenderObject) -> ObjectKey {
        self.objects.insert(object)
    }

    /// Removes an object from the scene. The substitution cache notices the
    /// disappearance on its next sweep.
    pub fn remove_object(&mut self, key: ObjectKey) -> Option<RenderObject> {
        self.objects.remove(key)
    }

    /// Current visibility set, in stable traversal order.
    #[must_use]
    pub fn visible_objects(&self) -> Vec<ObjectKey> {
        self.objects
            .iter()
            .filter(|(_, object)| object.visible)
            .map(|(key, _)| key)
            .collect()
    }

    #[must_use]
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    #[must_use]
    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }
}
