use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use strata_blocks::{BlockStateTable, StateId};
use strata_mesh::SectionMesher;
use strata_runtime::{FromWorker, PoolConfig, ToWorker, WorkerPool};
use strata_world::{BlockPos, CHUNK_WIDTH, ColumnCoord, ColumnExtent, SECTION_HEIGHT, SectionKey};

use crate::assets::AssetLoader;
use crate::scene::{Scene, SceneSync};
use crate::settle::Settle;

const PUMP_SLICE: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Dirty marks and clears sent to workers.
    pub marks: u64,
    pub completions: u64,
    pub geometry_applied: u64,
    pub empty_geometry: u64,
    /// Geometry dropped because its section was no longer inside a loaded column.
    pub stale_discarded: u64,
    pub meshes_disposed: u64,
}

/// Controller side of the pipeline: broadcasts world data to every worker,
/// shards dirty marks, tracks outstanding work and applies results to the scene.
///
/// Single-threaded; results are applied only from [`DispatchController::pump`]
/// and friends.
pub struct DispatchController<S: Scene> {
    pool: WorkerPool,
    sync: SceneSync<S>,
    columns: HashMap<ColumnCoord, ColumnExtent>,
    /// Unresolved marks per section. Every mark resolves with one completion.
    outstanding: HashMap<SectionKey, u32>,
    settle: Settle,
    stats: DispatchStats,
    version: Option<String>,
    active: bool,
    table_override: Option<Arc<BlockStateTable>>,
    texture_override: Option<String>,
}

impl<S: Scene> DispatchController<S> {
    pub fn new(
        cfg: PoolConfig,
        mesher: Arc<dyn SectionMesher>,
        scene: S,
    ) -> Result<Self, Box<dyn Error>> {
        let pool = WorkerPool::new(cfg, mesher)?;
        Ok(Self {
            pool,
            sync: SceneSync::new(scene),
            columns: HashMap::new(),
            outstanding: HashMap::new(),
            settle: Settle::new(),
            stats: DispatchStats::default(),
            version: None,
            active: false,
            table_override: None,
            texture_override: None,
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn worker_count(&self) -> usize {
        self.pool.len()
    }

    pub fn route(&self, key: SectionKey) -> usize {
        self.pool.route(key)
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn scene(&self) -> &S {
        self.sync.scene()
    }

    pub fn live_meshes(&self) -> usize {
        self.sync.len()
    }

    pub fn has_mesh(&self, key: SectionKey) -> bool {
        self.sync.contains(key)
    }

    pub fn is_loaded(&self, x: i32, z: i32) -> bool {
        self.columns.contains_key(&ColumnCoord::containing(x, z))
    }

    pub fn loaded_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_outstanding(&self, key: SectionKey) -> bool {
        self.outstanding.contains_key(&key)
    }

    pub fn outstanding_keys(&self) -> impl Iterator<Item = SectionKey> + '_ {
        self.outstanding.keys().copied()
    }

    pub fn settle_handle(&self) -> Settle {
        self.settle.clone()
    }

    /// Descriptor table used by [`Self::set_version`] instead of loading one.
    pub fn set_block_table(&mut self, table: Option<Arc<BlockStateTable>>) {
        self.table_override = table;
    }

    /// Atlas path used by [`Self::set_version`] instead of `textures/<version>.png`.
    pub fn set_texture_override(&mut self, path: Option<String>) {
        self.texture_override = path;
    }

    /// Disposes every live mesh and drops all world state, here and in workers.
    /// Pending marks still resolve through worker completions.
    pub fn reset_world(&mut self) {
        self.active = false;
        let disposed = self.sync.clear();
        self.stats.meshes_disposed += disposed as u64;
        self.columns.clear();
        self.pool.broadcast(ToWorker::Reset);
        log::debug!(target: "dispatch", "world reset ({} meshes disposed)", disposed);
    }

    pub fn set_version(&mut self, version: &str, assets: &mut AssetLoader) {
        self.reset_world();
        self.version = Some(version.to_string());
        self.active = true;
        self.pool.broadcast(ToWorker::Version(version.to_string()));
        log::info!(target: "dispatch", "version {}", version);
        self.update_textures_data(version, assets);
    }

    fn update_textures_data(&mut self, version: &str, assets: &mut AssetLoader) {
        let table = match &self.table_override {
            Some(t) => Ok(Arc::clone(t)),
            None => assets.load_block_descriptor_table(version),
        };
        let table = table.unwrap_or_else(|e| {
            log::error!(target: "assets", "no descriptor table for {}, every state is air: {}", version, e);
            Arc::new(BlockStateTable::new())
        });
        self.pool.broadcast(ToWorker::DescriptorTable(table));
        let atlas = self
            .texture_override
            .clone()
            .unwrap_or_else(|| format!("textures/{version}.png"));
        match assets.load_texture(&atlas) {
            Ok(tex) => self.sync.scene_mut().set_atlas(tex),
            Err(e) => log::warn!(target: "assets", "atlas unavailable, keeping previous: {}", e),
        }
    }

    /// Installs or replaces a column in every replica and marks its sections
    /// plus the four horizontal neighbours of each.
    pub fn add_column(&mut self, x: i32, z: i32, snapshot: impl Into<Arc<str>>) {
        let coord = ColumnCoord::containing(x, z);
        let snapshot: Arc<str> = snapshot.into();
        let extent = ColumnExtent::read(&snapshot);
        self.columns.insert(coord, extent);
        let disposed = self
            .sync
            .remove_where(|k| k.column() == coord && !extent.contains_section(k.y));
        self.stats.meshes_disposed += disposed as u64;
        self.pool.broadcast(ToWorker::ColumnSnapshot {
            x: coord.x,
            z: coord.z,
            snapshot,
        });
        log::debug!(
            target: "dispatch",
            "column {} loaded (minY {}, height {})",
            coord,
            extent.min_y,
            extent.world_height
        );
        for y in extent.section_ys() {
            let key = coord.section(y);
            self.mark(key, true);
            self.mark(key.offset(-1, 0, 0), true);
            self.mark(key.offset(1, 0, 0), true);
            self.mark(key.offset(0, 0, -1), true);
            self.mark(key.offset(0, 0, 1), true);
        }
    }

    /// Unloads a column everywhere and disposes its meshes before returning.
    pub fn remove_column(&mut self, x: i32, z: i32) {
        let coord = ColumnCoord::containing(x, z);
        let extent = self.columns.remove(&coord).unwrap_or_default();
        self.pool.broadcast(ToWorker::ColumnUnload {
            x: coord.x,
            z: coord.z,
        });
        for y in extent.section_ys() {
            self.mark(coord.section(y), false);
        }
        self.stats.meshes_disposed += self.sync.remove_column(coord) as u64;
        log::debug!(target: "dispatch", "column {} unloaded", coord);
    }

    /// Broadcasts a single-block edit and marks the owning section plus every
    /// neighbour sharing a face with the edited position.
    pub fn set_block_state_id(&mut self, pos: BlockPos, state_id: StateId) {
        self.pool.broadcast(ToWorker::BlockEdit { pos, state_id });
        let key = pos.section();
        self.mark(key, true);
        let last = CHUNK_WIDTH - 1;
        let (lx, ly, lz) = (
            pos.x.rem_euclid(CHUNK_WIDTH),
            pos.y.rem_euclid(SECTION_HEIGHT),
            pos.z.rem_euclid(CHUNK_WIDTH),
        );
        if lx == 0 {
            self.mark(key.offset(-1, 0, 0), true);
        }
        if lx == last {
            self.mark(key.offset(1, 0, 0), true);
        }
        if ly == 0 {
            self.mark(key.offset(0, -1, 0), true);
        }
        if ly == SECTION_HEIGHT - 1 {
            self.mark(key.offset(0, 1, 0), true);
        }
        if lz == 0 {
            self.mark(key.offset(0, 0, -1), true);
        }
        if lz == last {
            self.mark(key.offset(0, 0, 1), true);
        }
    }

    /// Marks (or clears) the section containing `pos` on its owning worker.
    pub fn set_section_dirty(&mut self, pos: BlockPos, active: bool) {
        self.mark(pos.section(), active);
    }

    fn mark(&mut self, key: SectionKey, active: bool) {
        self.pool.send_dirty(key, active);
        *self.outstanding.entry(key).or_insert(0) += 1;
        self.stats.marks += 1;
        self.settle.update(self.outstanding.len());
    }

    /// Applies one worker message.
    pub fn apply(&mut self, msg: FromWorker) {
        match msg {
            FromWorker::Geometry {
                key,
                origin,
                buffers,
                ..
            } => {
                let current = self
                    .columns
                    .get(&key.column())
                    .is_some_and(|e| e.contains_section(key.y));
                if !current {
                    self.stats.stale_discarded += 1;
                    log::debug!(target: "dispatch", "discarding stale geometry for {}", key);
                    return;
                }
                if buffers.is_empty() {
                    self.stats.empty_geometry += 1;
                    if self.sync.remove(key) {
                        self.stats.meshes_disposed += 1;
                    }
                    return;
                }
                if self.sync.install(key, origin, buffers) {
                    self.stats.meshes_disposed += 1;
                }
                self.stats.geometry_applied += 1;
            }
            FromWorker::SectionDone { key, .. } => {
                self.stats.completions += 1;
                if let Some(n) = self.outstanding.get_mut(&key) {
                    *n -= 1;
                    if *n == 0 {
                        self.outstanding.remove(&key);
                    }
                }
                self.settle.update(self.outstanding.len());
            }
        }
    }

    /// Applies every result already queued. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let msgs = self.pool.drain_results();
        let n = msgs.len();
        for msg in msgs {
            self.apply(msg);
        }
        n
    }

    /// Like [`Self::pump`], but waits up to `timeout` for the first result.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.pool.recv_timeout(timeout) {
            Some(first) => {
                self.apply(first);
                1 + self.pump()
            }
            None => 0,
        }
    }

    /// Pumps until no section is outstanding. `false` when `timeout` elapses.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.outstanding.is_empty() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pump_timeout((deadline - now).min(PUMP_SLICE));
        }
    }
}
