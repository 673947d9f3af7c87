use strata_blocks::BlockStateTable;
use strata_world::{BlockPos, SECTION_HEIGHT, SectionKey, WorldState};

use crate::SectionMesher;
use crate::buffers::GeometryBuffers;
use crate::face::Face;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const UNIT: [f32; 6] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

#[inline]
fn offset(mut corners: [[f32; 3]; 4], by: [f32; 3]) -> [[f32; 3]; 4] {
    for c in corners.iter_mut() {
        c[0] += by[0];
        c[1] += by[1];
        c[2] += by[2];
    }
    corners
}

/// Face-culling mesher for full cubes. Other shapes emit every box face.
#[derive(Clone, Copy, Debug, Default)]
pub struct CubeMesher;

impl CubeMesher {
    pub fn new() -> Self {
        Self
    }

    /// Whether the face of the block at `pos` facing `face` is hidden.
    /// Unloaded neighbours hide the face so column borders stay closed until
    /// the neighbour arrives and triggers a remesh.
    fn culled(world: &WorldState, pos: BlockPos, face: Face) -> bool {
        let (dx, dy, dz) = face.delta();
        match world.get_block(pos.offset(dx, dy, dz)) {
            None => true,
            Some(n) => n.descriptor.occludes(),
        }
    }
}

impl SectionMesher for CubeMesher {
    fn mesh_section(
        &self,
        origin: SectionKey,
        world: &WorldState,
        table: &BlockStateTable,
    ) -> GeometryBuffers {
        let mut out = GeometryBuffers::new();
        let populated = world
            .column(origin.x, origin.z)
            .and_then(|c| c.section(origin.y))
            .is_some_and(|s| s.blocks.has_non_air());
        if !populated || table.max_state_id() == 0 {
            return out;
        }
        let base = origin.origin();
        for ly in 0..SECTION_HEIGHT {
            for lz in 0..SECTION_HEIGHT {
                for lx in 0..SECTION_HEIGHT {
                    let pos = base.offset(lx, ly, lz);
                    let Some(block) = world.get_block(pos) else {
                        continue;
                    };
                    let desc = &block.descriptor;
                    if desc.is_empty() {
                        continue;
                    }
                    let rgb = if desc.tint { block.biome.rgb() } else { WHITE };
                    let local = [lx as f32, ly as f32, lz as f32];
                    if desc.is_cube() {
                        for face in Face::ALL {
                            if Self::culled(world, pos, face) {
                                continue;
                            }
                            let corners = offset(face.corners(UNIT), local);
                            out.add_quad(corners, face.normal(), desc.uv, rgb);
                        }
                        continue;
                    }
                    for b in desc.shape.boxes() {
                        for face in Face::ALL {
                            let corners = offset(face.corners(*b), local);
                            out.add_quad(corners, face.normal(), desc.uv, rgb);
                        }
                    }
                }
            }
        }
        if !out.is_empty() {
            log::trace!(
                target: "worker",
                "section {} -> {} quads",
                origin,
                out.vertex_count() / 4
            );
        }
        out
    }
}
