use std::sync::Arc;

use crossbeam_channel::Sender;
use hashbrown::HashSet;
use strata_blocks::BlockStateTable;
use strata_mesh::SectionMesher;
use strata_world::{SectionKey, WorldState};

use crate::messages::{FromWorker, ToWorker};

/// One mesh worker: a private world replica plus its dirty-section set.
///
/// All mutation happens through [`WorkerUnit::handle`] and [`WorkerUnit::tick`],
/// which the pool calls from a single thread.
pub struct WorkerUnit {
    id: usize,
    world: Option<WorldState>,
    table: Option<Arc<BlockStateTable>>,
    dirty: HashSet<SectionKey>,
    mesher: Arc<dyn SectionMesher>,
    tx: Sender<FromWorker>,
}

impl WorkerUnit {
    pub fn new(id: usize, mesher: Arc<dyn SectionMesher>, tx: Sender<FromWorker>) -> Self {
        Self {
            id,
            world: None,
            table: None,
            dirty: HashSet::new(),
            mesher,
            tx,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn world(&self) -> Option<&WorldState> {
        self.world.as_ref()
    }

    pub fn is_dirty(&self, key: SectionKey) -> bool {
        self.dirty.contains(&key)
    }

    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    pub fn handle(&mut self, msg: ToWorker) {
        match msg {
            ToWorker::Version(v) => self.apply_version(v),
            ToWorker::DescriptorTable(t) => self.apply_block_descriptors(t),
            ToWorker::ColumnSnapshot { x, z, snapshot } => self.apply_column_add(x, z, &snapshot),
            ToWorker::ColumnUnload { x, z } => self.apply_column_remove(x, z),
            ToWorker::BlockEdit { pos, state_id } => {
                if let Some(world) = self.world.as_mut() {
                    world.set_block_state_id(pos, state_id);
                }
            }
            ToWorker::Dirty { key, active } => self.mark_dirty(key, active),
            ToWorker::Reset => self.apply_reset(),
        }
    }

    pub fn apply_version(&mut self, version: String) {
        self.drain_dirty();
        let table = self
            .table
            .clone()
            .unwrap_or_else(|| Arc::new(BlockStateTable::new()));
        log::debug!(target: "worker", "worker {} switching to version {}", self.id, version);
        self.world = Some(WorldState::new(version, table));
    }

    pub fn apply_block_descriptors(&mut self, table: Arc<BlockStateTable>) {
        if let Some(world) = self.world.as_mut() {
            world.set_table(Arc::clone(&table));
        }
        log::debug!(
            target: "worker",
            "worker {} loaded {} block states (max id {})",
            self.id,
            table.len(),
            table.max_state_id()
        );
        self.table = Some(table);
    }

    pub fn apply_column_add(&mut self, x: i32, z: i32, raw: &str) {
        let Some(world) = self.world.as_mut() else {
            log::debug!(target: "worker", "worker {} dropping column {},{}: no version", self.id, x, z);
            return;
        };
        if let Err(e) = world.add_column(x, z, raw) {
            log::warn!(target: "worker", "worker {} rejected column {},{}: {}", self.id, x, z, e);
        }
    }

    pub fn apply_column_remove(&mut self, x: i32, z: i32) {
        if let Some(world) = self.world.as_mut() {
            world.remove_column(x, z);
        }
    }

    pub fn apply_reset(&mut self) {
        self.drain_dirty();
        self.world = None;
        self.table = None;
    }

    /// Records or clears a mark. Every call resolves with exactly one
    /// completion signal, now or at a later tick. Clears resolve immediately
    /// (together with the mark they cancel), as do marks merged into a pending
    /// one or aimed at a section this replica does not hold.
    pub fn mark_dirty(&mut self, key: SectionKey, active: bool) {
        let key = SectionKey::new(key.x, key.y, key.z);
        if !active {
            if self.dirty.remove(&key) {
                self.done(key);
            }
            self.done(key);
            return;
        }
        let exists = self.world.as_ref().is_some_and(|w| w.has_section(key));
        if !exists || !self.dirty.insert(key) {
            self.done(key);
        }
    }

    /// One pass over the dirty set. Returns the number of sections meshed.
    pub fn tick(&mut self) -> usize {
        let (Some(world), Some(table)) = (self.world.as_ref(), self.table.as_ref()) else {
            return 0;
        };
        if self.dirty.is_empty() {
            return 0;
        }
        let keys: Vec<SectionKey> = self.dirty.drain().collect();
        let mut meshed = 0;
        for key in keys {
            if world.has_section(key) {
                let buffers = self.mesher.mesh_section(key, world, table);
                meshed += 1;
                let _ = self.tx.send(FromWorker::Geometry {
                    worker: self.id,
                    key,
                    origin: key.origin(),
                    buffers,
                });
            }
            let _ = self.tx.send(FromWorker::SectionDone {
                worker: self.id,
                key,
            });
        }
        log::trace!(target: "worker", "worker {} meshed {} sections", self.id, meshed);
        meshed
    }

    fn drain_dirty(&mut self) {
        let keys: Vec<SectionKey> = self.dirty.drain().collect();
        for key in keys {
            self.done(key);
        }
    }

    #[inline]
    fn done(&self, key: SectionKey) {
        let _ = self.tx.send(FromWorker::SectionDone {
            worker: self.id,
            key,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Receiver, unbounded};
    use strata_mesh::CubeMesher;
    use strata_world::{BlockPos, ColumnSnapshot};

    fn table() -> Arc<BlockStateTable> {
        Arc::new(
            BlockStateTable::from_toml_str(
                r#"
                [[states]]
                id = 1
                name = "stone"
            "#,
            )
            .unwrap(),
        )
    }

    fn ready_worker() -> (WorkerUnit, Receiver<FromWorker>) {
        let (tx, rx) = unbounded();
        let mut w = WorkerUnit::new(0, Arc::new(CubeMesher), tx);
        w.handle(ToWorker::Version("1.20".into()));
        w.handle(ToWorker::DescriptorTable(table()));
        let snap = ColumnSnapshot::new(0, 32).with_uniform_section(0, 1);
        w.handle(ToWorker::ColumnSnapshot {
            x: 0,
            z: 0,
            snapshot: snap.to_json().into(),
        });
        (w, rx)
    }

    #[test]
    fn marks_coalesce_and_tick_drains() {
        let (mut w, rx) = ready_worker();
        let key = SectionKey::new(0, 0, 0);
        w.mark_dirty(key, true);
        assert!(rx.try_recv().is_err());
        w.mark_dirty(SectionKey::new(3, 9, 15), true);
        assert_eq!(w.dirty_len(), 1);
        // the merged mark resolves at once
        assert!(matches!(rx.try_recv(), Ok(FromWorker::SectionDone { .. })));
        assert!(rx.try_recv().is_err());

        assert_eq!(w.tick(), 1);
        let out: Vec<_> = rx.try_iter().collect();
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], FromWorker::Geometry { key: k, buffers, .. } if *k == key && !buffers.is_empty()));
        assert!(matches!(&out[1], FromWorker::SectionDone { key: k, .. } if *k == key));
        assert_eq!(w.tick(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unpopulated_or_unloaded_section_resolves_immediately() {
        let (mut w, rx) = ready_worker();
        w.mark_dirty(SectionKey::new(0, 16, 0), true);
        w.mark_dirty(SectionKey::new(64, 0, 0), true);
        assert_eq!(w.dirty_len(), 0);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn clear_is_idempotent_and_always_signals() {
        let (mut w, rx) = ready_worker();
        let key = SectionKey::new(0, 0, 0);
        w.mark_dirty(key, true);
        w.mark_dirty(key, false);
        assert_eq!(rx.try_iter().count(), 2);
        w.mark_dirty(key, false);
        assert_eq!(rx.try_iter().count(), 1);
        assert!(!w.is_dirty(key));
        assert_eq!(w.tick(), 0);
    }

    #[test]
    fn unload_between_mark_and_tick_skips_meshing() {
        let (mut w, rx) = ready_worker();
        let key = SectionKey::new(0, 0, 0);
        w.mark_dirty(key, true);
        w.handle(ToWorker::ColumnUnload { x: 0, z: 0 });
        assert_eq!(w.tick(), 0);
        let out: Vec<_> = rx.try_iter().collect();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], FromWorker::SectionDone { .. }));
        assert_eq!(w.dirty_len(), 0);
    }

    #[test]
    fn tick_waits_for_descriptor_table() {
        let (tx, rx) = unbounded();
        let mut w = WorkerUnit::new(2, Arc::new(CubeMesher), tx);
        w.handle(ToWorker::Version("1.20".into()));
        let snap = ColumnSnapshot::new(0, 16).with_uniform_section(0, 1);
        w.handle(ToWorker::ColumnSnapshot {
            x: 0,
            z: 0,
            snapshot: snap.to_json().into(),
        });
        w.mark_dirty(SectionKey::new(0, 0, 0), true);
        assert_eq!(w.tick(), 0);
        assert_eq!(w.dirty_len(), 1);

        w.handle(ToWorker::DescriptorTable(table()));
        assert_eq!(w.tick(), 1);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn reset_resolves_pending_marks() {
        let (mut w, rx) = ready_worker();
        w.mark_dirty(SectionKey::new(0, 0, 0), true);
        w.handle(ToWorker::Reset);
        assert!(w.world().is_none());
        assert_eq!(w.dirty_len(), 0);
        assert_eq!(rx.try_iter().count(), 1);
        w.mark_dirty(SectionKey::new(0, 0, 0), true);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn edits_reach_the_replica() {
        let (mut w, _rx) = ready_worker();
        w.handle(ToWorker::BlockEdit {
            pos: BlockPos::new(1, 2, 3),
            state_id: 0,
        });
        let world = w.world().unwrap();
        assert_eq!(world.get_block(BlockPos::new(1, 2, 3)).unwrap().state_id(), 0);
        assert_eq!(world.get_block(BlockPos::new(1, 3, 3)).unwrap().state_id(), 1);
    }
}
