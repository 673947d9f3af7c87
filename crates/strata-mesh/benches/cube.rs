use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

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
            name = "glass"
            transparent = true
        "#,
        )
        .unwrap(),
    )
}

fn bench_solid_section(c: &mut Criterion) {
    let t = table();
    let mut world = WorldState::new("bench", Arc::clone(&t));
    for (x, z) in [(0, 0), (16, 0), (-16, 0), (0, 16), (0, -16)] {
        let snap = ColumnSnapshot::new(0, 48).with_uniform_section(16, 1);
        world.add_column(x, z, &snap.to_json()).unwrap();
    }
    c.bench_function("cube_solid_section", |b| {
        b.iter(|| black_box(CubeMesher.mesh_section(SectionKey::new(0, 16, 0), &world, &t)))
    });
}

fn bench_checkerboard_section(c: &mut Criterion) {
    let t = table();
    let mut world = WorldState::new("bench", Arc::clone(&t));
    world
        .add_column(0, 0, &ColumnSnapshot::new(0, 16).to_json())
        .unwrap();
    for y in 0..16 {
        for z in 0..16 {
            for x in 0..16 {
                if (x + y + z) % 2 == 0 {
                    world.set_block_state_id(BlockPos::new(x, y, z), 1 + (x as u32 % 2));
                }
            }
        }
    }
    c.bench_function("cube_checkerboard_section", |b| {
        b.iter(|| black_box(CubeMesher.mesh_section(SectionKey::new(0, 0, 0), &world, &t)))
    });
}

criterion_group!(benches, bench_solid_section, bench_checkerboard_section);
criterion_main!(benches);
