//! Scene synchronization
//!
//! [`SceneSync`] owns the single voxel mesh installed in a scene. Every update
//! detaches and releases the previous mesh before building the next one, so a
//! scene never holds two voxel meshes and never holds more than one mesh's
//! worth of resources.

use std::collections::BTreeMap;
use voxdraw_core::{MeshBuffer, SurfaceMesher, VoxelGrid};

/// Material description for a voxel mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    /// Interpolate the per-vertex colors
    pub vertex_colors: bool,
}

impl Material {
    /// The material used for voxel surfaces
    pub const fn vertex_colored() -> Self {
        Self {
            vertex_colors: true,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::vertex_colored()
    }
}

/// The renderer side of a scene graph
///
/// `create_mesh` allocates geometry and material resources; `release` frees
/// them. `add`/`remove` only attach and detach a node.
pub trait SceneBackend {
    /// Handle to a renderable mesh owned by the backend
    type Handle;

    fn create_mesh(&mut self, geometry: MeshBuffer, material: Material) -> Self::Handle;

    fn add(&mut self, handle: &Self::Handle);

    fn remove(&mut self, handle: &Self::Handle);

    fn release(&mut self, handle: Self::Handle);
}

/// Keeps exactly zero or one voxel mesh installed in a scene
pub struct SceneSync<S: SceneBackend> {
    mesher: SurfaceMesher,
    current: Option<S::Handle>,
}

impl<S: SceneBackend> Default for SceneSync<S> {
    fn default() -> Self {
        Self::new(SurfaceMesher::default())
    }
}

impl<S: SceneBackend> SceneSync<S> {
    pub fn new(mesher: SurfaceMesher) -> Self {
        Self {
            mesher,
            current: None,
        }
    }

    /// Replace the installed mesh with one built from `grid`
    ///
    /// Returns the number of faces installed; 0 means the scene now holds no
    /// voxel mesh.
    pub fn update(&mut self, scene: &mut S, grid: &VoxelGrid) -> usize {
        self.clear(scene);

        let buffer = self.mesher.build(grid);
        if buffer.is_empty() {
            tracing::debug!("grid is empty, no mesh installed");
            return 0;
        }

        let faces = buffer.face_count();
        let handle = scene.create_mesh(buffer, Material::vertex_colored());
        scene.add(&handle);
        self.current = Some(handle);

        faces
    }

    /// Detach and release the installed mesh, if any
    pub fn clear(&mut self, scene: &mut S) {
        if let Some(handle) = self.current.take() {
            scene.remove(&handle);
            scene.release(handle);
        }
    }

    /// Handle of the installed mesh
    pub fn current(&self) -> Option<&S::Handle> {
        self.current.as_ref()
    }

    pub fn has_mesh(&self) -> bool {
        self.current.is_some()
    }
}

// ============================================================================
// Headless scene graph
// ============================================================================

/// Identifier of a mesh in a [`MemoryScene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(u64);

/// Scene graph operation, recorded in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    Created(MeshId),
    Added(MeshId),
    Removed(MeshId),
    Released(MeshId),
}

/// Geometry and material held by the scene
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMesh {
    pub geometry: MeshBuffer,
    pub material: Material,
}

/// In-memory scene graph
///
/// Used by the CLI and tests. Records every operation so resource ordering
/// can be checked after the fact.
#[derive(Debug, Default)]
pub struct MemoryScene {
    next_id: u64,
    resources: BTreeMap<MeshId, RenderMesh>,
    children: Vec<MeshId>,
    events: Vec<SceneEvent>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes attached to the scene
    pub fn node_count(&self) -> usize {
        self.children.len()
    }

    /// Number of meshes whose resources are still allocated
    pub fn live_meshes(&self) -> usize {
        self.resources.len()
    }

    /// Attached meshes in insertion order
    pub fn attached(&self) -> impl Iterator<Item = &RenderMesh> + '_ {
        self.children.iter().filter_map(|id| self.resources.get(id))
    }

    /// The first attached mesh
    pub fn first_attached(&self) -> Option<&RenderMesh> {
        self.attached().next()
    }

    /// All recorded operations
    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl SceneBackend for MemoryScene {
    type Handle = MeshId;

    fn create_mesh(&mut self, geometry: MeshBuffer, material: Material) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        self.resources.insert(id, RenderMesh { geometry, material });
        self.events.push(SceneEvent::Created(id));
        id
    }

    fn add(&mut self, handle: &MeshId) {
        if !self.children.contains(handle) {
            self.children.push(*handle);
        }
        self.events.push(SceneEvent::Added(*handle));
    }

    fn remove(&mut self, handle: &MeshId) {
        self.children.retain(|id| id != handle);
        self.events.push(SceneEvent::Removed(*handle));
    }

    fn release(&mut self, handle: MeshId) {
        if self.children.contains(&handle) {
            tracing::warn!(?handle, "releasing a mesh that is still attached");
            self.children.retain(|id| *id != handle);
        }
        self.resources.remove(&handle);
        self.events.push(SceneEvent::Released(handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxdraw_core::Color;

    fn grid_with_cell() -> VoxelGrid {
        let mut grid = VoxelGrid::new(3);
        grid.set(1, 1, 1, Color::token("blue"));
        grid
    }

    #[test]
    fn test_update_installs_one_mesh() {
        let mut scene = MemoryScene::new();
        let mut sync = SceneSync::default();

        let faces = sync.update(&mut scene, &grid_with_cell());
        assert_eq!(faces, 6);
        assert!(sync.has_mesh());
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.live_meshes(), 1);
        assert!(scene.first_attached().is_some_and(|m| m.material.vertex_colors));
    }

    #[test]
    fn test_update_twice_keeps_single_node() {
        let mut scene = MemoryScene::new();
        let mut sync = SceneSync::default();
        let grid = grid_with_cell();

        sync.update(&mut scene, &grid);
        assert_eq!(scene.node_count(), 1);
        sync.update(&mut scene, &grid);
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.live_meshes(), 1);
    }

    #[test]
    fn test_previous_mesh_released_before_new_one_created() {
        let mut scene = MemoryScene::new();
        let mut sync = SceneSync::default();
        let grid = grid_with_cell();

        sync.update(&mut scene, &grid);
        let first = *sync.current().unwrap();
        scene.clear_events();

        sync.update(&mut scene, &grid);
        let second = *sync.current().unwrap();
        assert_ne!(first, second);
        assert_eq!(
            scene.events(),
            &[
                SceneEvent::Removed(first),
                SceneEvent::Released(first),
                SceneEvent::Created(second),
                SceneEvent::Added(second),
            ]
        );
    }

    #[test]
    fn test_empty_grid_leaves_no_node() {
        let mut scene = MemoryScene::new();
        let mut sync = SceneSync::default();

        sync.update(&mut scene, &grid_with_cell());
        let faces = sync.update(&mut scene, &VoxelGrid::new(3));

        assert_eq!(faces, 0);
        assert!(!sync.has_mesh());
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.live_meshes(), 0);
    }

    #[test]
    fn test_clear_releases() {
        let mut scene = MemoryScene::new();
        let mut sync = SceneSync::default();
        sync.update(&mut scene, &grid_with_cell());

        sync.clear(&mut scene);
        sync.clear(&mut scene);
        assert_eq!(scene.live_meshes(), 0);
        assert_eq!(
            scene
                .events()
                .iter()
                .filter(|e| matches!(e, SceneEvent::Released(_)))
                .count(),
            1
        );
    }
}
