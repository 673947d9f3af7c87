use hashbrown::HashMap;
use strata_mesh::GeometryBuffers;
use strata_world::{BlockPos, ColumnCoord, SectionKey};

use crate::assets::TextureHandle;

/// Rendering backend seam. Owns the graphics resources behind each handle.
pub trait Scene {
    type Handle;

    /// Builds a mesh from section-local buffers placed at `origin` and adds it
    /// to the scene. `None` when the backend cannot build it.
    fn upload(
        &mut self,
        key: SectionKey,
        origin: BlockPos,
        buffers: GeometryBuffers,
    ) -> Option<Self::Handle>;

    /// Removes the mesh from the scene and frees its resources.
    fn release(&mut self, handle: Self::Handle);

    fn set_atlas(&mut self, atlas: TextureHandle);
}

/// Live mesh table: at most one mesh per section, every replaced or removed
/// mesh released before this returns.
pub struct SceneSync<S: Scene> {
    scene: S,
    live: HashMap<SectionKey, S::Handle>,
}

impl<S: Scene> SceneSync<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            live: HashMap::new(),
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: SectionKey) -> bool {
        self.live.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = SectionKey> + '_ {
        self.live.keys().copied()
    }

    /// Replaces the mesh for `key`. Returns whether a previous mesh was disposed.
    pub fn install(&mut self, key: SectionKey, origin: BlockPos, buffers: GeometryBuffers) -> bool {
        let disposed = self.remove(key);
        if let Some(handle) = self.scene.upload(key, origin, buffers) {
            self.live.insert(key, handle);
        }
        disposed
    }

    pub fn remove(&mut self, key: SectionKey) -> bool {
        match self.live.remove(&key) {
            Some(handle) => {
                self.scene.release(handle);
                true
            }
            None => false,
        }
    }

    /// Disposes every live mesh matching `pred`. Returns the count.
    pub fn remove_where(&mut self, mut pred: impl FnMut(SectionKey) -> bool) -> usize {
        let doomed: Vec<SectionKey> = self.live.keys().copied().filter(|&k| pred(k)).collect();
        doomed.into_iter().filter(|&k| self.remove(k)).count()
    }

    /// Disposes every live section of the column, whatever extent it was built with.
    pub fn remove_column(&mut self, coord: ColumnCoord) -> usize {
        self.remove_where(|k| k.column() == coord)
    }

    pub fn clear(&mut self) -> usize {
        let n = self.live.len();
        for (_, handle) in self.live.drain() {
            self.scene.release(handle);
        }
        n
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub u64);

#[derive(Clone, Debug)]
pub struct HeadlessMesh {
    pub key: SectionKey,
    pub origin: BlockPos,
    pub vertices: usize,
    pub triangles: usize,
}

/// Scene without a renderer: keeps mesh metadata and counts allocations.
#[derive(Default)]
pub struct HeadlessScene {
    next_id: u64,
    meshes: HashMap<MeshId, HeadlessMesh>,
    uploaded: u64,
    released: u64,
    atlas: Option<TextureHandle>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, id: MeshId) -> Option<&HeadlessMesh> {
        self.meshes.get(&id)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &HeadlessMesh> {
        self.meshes.values()
    }

    /// Meshes currently allocated.
    pub fn resident(&self) -> usize {
        self.meshes.len()
    }

    pub fn uploaded(&self) -> u64 {
        self.uploaded
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    pub fn atlas(&self) -> Option<&TextureHandle> {
        self.atlas.as_ref()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.values().map(|m| m.triangles).sum()
    }
}

impl Scene for HeadlessScene {
    type Handle = MeshId;

    fn upload(
        &mut self,
        key: SectionKey,
        origin: BlockPos,
        buffers: GeometryBuffers,
    ) -> Option<MeshId> {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        self.uploaded += 1;
        self.meshes.insert(
            id,
            HeadlessMesh {
                key,
                origin,
                vertices: buffers.vertex_count(),
                triangles: buffers.triangle_count(),
            },
        );
        Some(id)
    }

    fn release(&mut self, handle: MeshId) {
        if self.meshes.remove(&handle).is_some() {
            self.released += 1;
        } else {
            log::warn!(target: "dispatch", "release of unknown mesh {:?}", handle);
        }
    }

    fn set_atlas(&mut self, atlas: TextureHandle) {
        self.atlas = Some(atlas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> GeometryBuffers {
        let mut g = GeometryBuffers::new();
        g.add_quad(
            [[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
            [1.0; 3],
        );
        g
    }

    #[test]
    fn replacing_releases_the_previous_mesh() {
        let mut sync = SceneSync::new(HeadlessScene::new());
        let key = SectionKey::new(0, 16, 0);
        assert!(!sync.install(key, key.origin(), quad()));
        assert!(sync.install(key, key.origin(), quad()));
        assert_eq!(sync.len(), 1);
        assert_eq!(sync.scene().resident(), 1);
        assert_eq!(sync.scene().released(), 1);
    }

    #[test]
    fn column_removal_only_touches_that_column() {
        let mut sync = SceneSync::new(HeadlessScene::new());
        for key in [
            SectionKey::new(0, 0, 0),
            SectionKey::new(0, 16, 0),
            SectionKey::new(0, 480, 0),
            SectionKey::new(16, 0, 0),
        ] {
            sync.install(key, key.origin(), quad());
        }
        assert_eq!(sync.remove_column(ColumnCoord::containing(0, 0)), 3);
        assert!(sync.contains(SectionKey::new(16, 0, 0)));
        assert_eq!(sync.clear(), 1);
        assert_eq!(sync.scene().resident(), 0);
        assert_eq!(sync.scene().uploaded(), sync.scene().released());
    }
}
