use std::error::Error;
use std::sync::{Arc, RwLock};

use hashbrown::{HashMap, HashSet};
use strata_blocks::{Biome, BlockDescriptor, BlockStateTable, EMPTY_STATE, StateId};

use crate::column::Column;
use crate::coords::{BlockPos, ColumnCoord, SectionKey};
use crate::snapshot::ColumnSnapshot;

/// Distinct invalid state ids logged per world before going quiet.
pub const INVALID_STATE_LOG_LIMIT: usize = 20;

/// A resolved block: the shared state descriptor plus this position's overlay.
#[derive(Clone, Debug)]
pub struct Block {
    pub descriptor: Arc<BlockDescriptor>,
    pub position: BlockPos,
    pub biome: Arc<Biome>,
}

impl Block {
    #[inline]
    pub fn state_id(&self) -> StateId {
        self.descriptor.state_id
    }

    #[inline]
    pub fn biome_color(&self) -> u32 {
        self.biome.color
    }
}

#[derive(Default)]
struct InvalidStateLog {
    logged: HashSet<StateId>,
    logged_write: bool,
}

/// Authoritative store of loaded columns for one replica.
pub struct WorldState {
    version: String,
    table: Arc<BlockStateTable>,
    columns: HashMap<ColumnCoord, Column>,
    descriptors: RwLock<HashMap<StateId, Arc<BlockDescriptor>>>,
    invalid: RwLock<InvalidStateLog>,
}

impl WorldState {
    pub fn new(version: impl Into<String>, table: Arc<BlockStateTable>) -> Self {
        Self {
            version: version.into(),
            table,
            columns: HashMap::new(),
            descriptors: RwLock::new(HashMap::new()),
            invalid: RwLock::new(InvalidStateLog::default()),
        }
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    pub fn table(&self) -> &Arc<BlockStateTable> {
        &self.table
    }

    /// Swaps the descriptor table; the descriptor cache is rebuilt lazily.
    pub fn set_table(&mut self, table: Arc<BlockStateTable>) {
        self.table = table;
        self.clear_caches();
    }

    pub fn clear_caches(&mut self) {
        if let Ok(mut d) = self.descriptors.write() {
            d.clear();
        }
        if let Ok(mut log) = self.invalid.write() {
            *log = InvalidStateLog::default();
        }
    }

    /// Decodes `raw` and installs it, replacing any prior column at that key.
    pub fn add_column(&mut self, x: i32, z: i32, raw: &str) -> Result<&Column, Box<dyn Error>> {
        let snap = ColumnSnapshot::decode(raw)?;
        let column = Column::from_snapshot(snap)?;
        Ok(self.insert_column(ColumnCoord::containing(x, z), column))
    }

    pub fn insert_column(&mut self, coord: ColumnCoord, column: Column) -> &Column {
        self.columns.insert(coord, column);
        &self.columns[&coord]
    }

    pub fn remove_column(&mut self, x: i32, z: i32) -> Option<Column> {
        self.columns.remove(&ColumnCoord::containing(x, z))
    }

    #[inline]
    pub fn column(&self, x: i32, z: i32) -> Option<&Column> {
        self.columns.get(&ColumnCoord::containing(x, z))
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_coords(&self) -> impl Iterator<Item = ColumnCoord> + '_ {
        self.columns.keys().copied()
    }

    /// Whether the section exists: parent column loaded and slot populated.
    pub fn has_section(&self, key: SectionKey) -> bool {
        self.column(key.x, key.z)
            .is_some_and(|c| c.has_section(key.y))
    }

    /// Number of distinct descriptors cached so far.
    pub fn cached_descriptors(&self) -> usize {
        self.descriptors.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Resolves the block at `pos`. `None` means the column is not loaded.
    /// Out-of-range or unmapped state ids resolve as the empty state.
    pub fn get_block(&self, pos: BlockPos) -> Option<Block> {
        let coord = pos.column();
        let column = self.columns.get(&coord)?;
        let mut state = column.state_at(pos);
        if state > self.table.max_state_id() || !self.table.has_mapping(state) {
            self.log_invalid_state(state, pos, coord, column);
            state = EMPTY_STATE;
        }
        let descriptor = self.descriptor(state);
        let biome = column
            .biome_at(pos)
            .and_then(|id| self.table.biome(id))
            .unwrap_or_else(|| self.table.default_biome());
        Some(Block {
            descriptor,
            position: pos,
            biome: Arc::clone(biome),
        })
    }

    /// Writes a raw state id. Fails without mutating when the id exceeds the
    /// table's maximum, the column is not loaded or `pos.y` is outside it.
    pub fn set_block_state_id(&mut self, pos: BlockPos, state: StateId) -> bool {
        if state > self.table.max_state_id() {
            let first = self
                .invalid
                .write()
                .map(|mut log| !std::mem::replace(&mut log.logged_write, true))
                .unwrap_or(false);
            if first {
                log::warn!(
                    target: "world",
                    "ignoring write of invalid state id {} at ({},{},{}) (max {})",
                    state,
                    pos.x,
                    pos.y,
                    pos.z,
                    self.table.max_state_id()
                );
            }
            return false;
        }
        match self.columns.get_mut(&pos.column()) {
            Some(column) => column.set_state(pos, state),
            None => false,
        }
    }

    fn descriptor(&self, state: StateId) -> Arc<BlockDescriptor> {
        if let Ok(cache) = self.descriptors.read() {
            if let Some(d) = cache.get(&state) {
                return Arc::clone(d);
            }
        }
        let built = Arc::new(
            self.table
                .descriptor(state)
                .cloned()
                .unwrap_or_else(BlockDescriptor::air),
        );
        match self.descriptors.write() {
            Ok(mut cache) => Arc::clone(cache.entry(state).or_insert(built)),
            Err(_) => built,
        }
    }

    fn log_invalid_state(
        &self,
        state: StateId,
        pos: BlockPos,
        coord: ColumnCoord,
        column: &Column,
    ) {
        let Ok(mut log) = self.invalid.write() else {
            return;
        };
        if log.logged.len() >= INVALID_STATE_LOG_LIMIT || !log.logged.insert(state) {
            return;
        }
        let section_index = (pos.y - column.min_y).div_euclid(16);
        let container = column.section(pos.y).map(|s| &s.blocks);
        log::warn!(
            target: "world",
            "invalid state id {} at ({},{},{}) in column {}: max {}, mapped {}, section {}, container {}, palette {:?}",
            state,
            pos.x,
            pos.y,
            pos.z,
            coord,
            self.table.max_state_id(),
            self.table.has_mapping(state),
            section_index,
            container.map(|c| c.kind()).unwrap_or("unknown"),
            container.and_then(|c| c.palette_len()),
        );
    }
}
