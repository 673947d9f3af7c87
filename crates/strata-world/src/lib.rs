//! Column/section storage and the per-replica world state.
#![forbid(unsafe_code)]

pub mod column;
pub mod container;
pub mod coords;
pub mod snapshot;
pub mod state;

pub use column::{Column, Section};
pub use container::BlockContainer;
pub use coords::{BlockPos, CHUNK_WIDTH, ColumnCoord, SECTION_HEIGHT, SectionKey, snap};
pub use snapshot::{ColumnExtent, ColumnSnapshot, SectionSnapshot};
pub use state::{Block, INVALID_STATE_LOG_LIMIT, WorldState};
