use std::sync::Arc;

use strata_blocks::{BlockStateTable, StateId};
use strata_mesh::GeometryBuffers;
use strata_world::{BlockPos, SectionKey};

/// Controller to worker. Everything but `Dirty` is broadcast to every worker.
#[derive(Clone, Debug)]
pub enum ToWorker {
    /// Switch data version; replaces the replica with an empty world.
    Version(String),
    DescriptorTable(Arc<BlockStateTable>),
    /// Serialized column, decoded by each worker on arrival.
    ColumnSnapshot {
        x: i32,
        z: i32,
        snapshot: Arc<str>,
    },
    ColumnUnload {
        x: i32,
        z: i32,
    },
    BlockEdit {
        pos: BlockPos,
        state_id: StateId,
    },
    /// Sharded to the owning worker only.
    Dirty {
        key: SectionKey,
        active: bool,
    },
    Reset,
}

impl ToWorker {
    pub fn kind(&self) -> &'static str {
        match self {
            ToWorker::Version(_) => "version",
            ToWorker::DescriptorTable(_) => "descriptorTable",
            ToWorker::ColumnSnapshot { .. } => "columnSnapshot",
            ToWorker::ColumnUnload { .. } => "columnUnload",
            ToWorker::BlockEdit { .. } => "blockEdit",
            ToWorker::Dirty { .. } => "dirty",
            ToWorker::Reset => "reset",
        }
    }
}

/// Worker to controller.
#[derive(Debug)]
pub enum FromWorker {
    Geometry {
        worker: usize,
        key: SectionKey,
        /// World position the section-local buffers are relative to.
        origin: BlockPos,
        buffers: GeometryBuffers,
    },
    /// One dirty mark resolved, with or without geometry.
    SectionDone { worker: usize, key: SectionKey },
}

impl FromWorker {
    #[inline]
    pub fn key(&self) -> SectionKey {
        match self {
            FromWorker::Geometry { key, .. } | FromWorker::SectionDone { key, .. } => *key,
        }
    }
}
