//! Section geometry: buffers, the mesher seam, and a reference cube mesher.
#![forbid(unsafe_code)]

pub mod buffers;
pub mod cube;
pub mod face;

pub use buffers::GeometryBuffers;
pub use cube::CubeMesher;
pub use face::Face;

use strata_blocks::BlockStateTable;
use strata_world::{SectionKey, WorldState};

/// Converts one section of a world replica into geometry.
///
/// Implementations must be pure with respect to their inputs: the same world
/// contents always produce the same buffers. Positions are section-local.
pub trait SectionMesher: Send + Sync {
    fn mesh_section(
        &self,
        origin: SectionKey,
        world: &WorldState,
        table: &BlockStateTable,
    ) -> GeometryBuffers;
}
