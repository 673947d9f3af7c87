use std::sync::Arc;

use proptest::prelude::*;
use strata_blocks::BlockStateTable;
use strata_mesh::{CubeMesher, SectionMesher};
use strata_world::{BlockPos, ColumnSnapshot, SectionKey, WorldState};

fn table() -> Arc<BlockStateTable> {
    Arc::new(
        BlockStateTable::from_toml_str(
            r#"
            [[states]]
            id = 1
            name = "stone"

            [[states]]
            id = 2
            name = "fence"
            shape = [[0.375, 0.0, 0.375, 0.625, 1.0, 0.625], [0.0, 0.75, 0.4, 1.0, 0.9, 0.6]]
        "#,
        )
        .unwrap(),
    )
}

proptest! {
    #[test]
    fn buffers_stay_consistent(
        blocks in proptest::collection::vec((0i32..16, 0i32..16, 0i32..16, 0u32..3), 0..48),
    ) {
        let t = table();
        let mut world = WorldState::new("prop", Arc::clone(&t));
        world.add_column(0, 0, &ColumnSnapshot::new(0, 16).to_json()).unwrap();
        for (x, y, z, s) in blocks {
            world.set_block_state_id(BlockPos::new(x, y, z), s);
        }
        let g = CubeMesher.mesh_section(SectionKey::new(0, 0, 0), &world, &t);
        let v = g.vertex_count();
        prop_assert_eq!(v % 4, 0);
        prop_assert_eq!(g.normals.len(), v * 3);
        prop_assert_eq!(g.colors.len(), v * 3);
        prop_assert_eq!(g.uvs.len(), v * 2);
        prop_assert_eq!(g.indices.len(), v / 4 * 6);
        prop_assert!(g.indices.iter().all(|&i| (i as usize) < v));
        if let Some((min, max)) = g.bounds() {
            prop_assert!(min.iter().all(|c| *c >= 0.0));
            prop_assert!(max.iter().all(|c| *c <= 16.0));
        }
    }
}
