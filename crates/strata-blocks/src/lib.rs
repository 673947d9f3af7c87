//! Block-state descriptor table and biome data.
#![forbid(unsafe_code)]

pub mod config;
pub mod table;
pub mod types;

pub use table::BlockStateTable;
pub use types::{
    Biome, BiomeId, BlockDescriptor, DEFAULT_BIOME, EMPTY_STATE, Shape, ShapeBox, StateId,
};
