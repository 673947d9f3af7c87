use std::sync::Arc;

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
            uv = [0.0, 0.0, 0.0625, 0.0625]

            [[states]]
            id = 2
            name = "grass_block"
            tint = true

            [[states]]
            id = 3
            name = "glass"
            transparent = true

            [[states]]
            id = 4
            name = "slab"
            shape = [[0.0, 0.0, 0.0, 1.0, 0.5, 1.0]]

            [[biomes]]
            id = 6
            name = "swamp"
            color = 0x6A7039
        "#,
        )
        .unwrap(),
    )
}

fn air_column(world: &mut WorldState, x: i32, z: i32) {
    world
        .add_column(x, z, &ColumnSnapshot::new(0, 16).to_json())
        .unwrap();
}

fn quads(world: &WorldState, key: SectionKey) -> usize {
    let t = Arc::clone(world.table());
    CubeMesher.mesh_section(key, world, &t).vertex_count() / 4
}

#[test]
fn lone_block_emits_six_faces() {
    let mut world = WorldState::new("1.20", table());
    air_column(&mut world, 0, 0);
    assert!(world.set_block_state_id(BlockPos::new(5, 5, 5), 1));
    let t = Arc::clone(world.table());
    let g = CubeMesher.mesh_section(SectionKey::new(0, 0, 0), &world, &t);
    assert_eq!(g.vertex_count(), 24);
    assert_eq!(g.indices.len(), 36);
    assert_eq!(g.bounds(), Some(([5.0; 3], [6.0; 3])));
    assert!(g.colors.iter().all(|c| *c == 1.0));
    assert_eq!(&g.uvs[..2], &[0.0, 0.0625]);
}

#[test]
fn unloaded_neighbours_close_column_borders() {
    let mut world = WorldState::new("1.20", table());
    let snap = ColumnSnapshot::new(0, 16).with_uniform_section(0, 1);
    world.add_column(0, 0, &snap.to_json()).unwrap();
    let key = SectionKey::new(0, 0, 0);
    // Top and bottom border the void above and below the column.
    assert_eq!(quads(&world, key), 512);

    air_column(&mut world, 16, 0);
    assert_eq!(quads(&world, key), 512 + 256);
    air_column(&mut world, 0, -16);
    assert_eq!(quads(&world, key), 512 + 512);
}

#[test]
fn transparent_cubes_do_not_occlude() {
    let mut world = WorldState::new("1.20", table());
    air_column(&mut world, 0, 0);
    world.set_block_state_id(BlockPos::new(4, 4, 4), 1);
    world.set_block_state_id(BlockPos::new(5, 4, 4), 3);
    // stone keeps its face towards the glass, glass loses its face towards the stone
    assert_eq!(quads(&world, SectionKey::new(0, 0, 0)), 6 + 5);
}

#[test]
fn boxes_emit_every_face() {
    let mut world = WorldState::new("1.20", table());
    air_column(&mut world, 0, 0);
    world.set_block_state_id(BlockPos::new(0, 0, 0), 1);
    world.set_block_state_id(BlockPos::new(0, 1, 0), 4);
    let t = Arc::clone(world.table());
    let g = CubeMesher.mesh_section(SectionKey::new(0, 0, 0), &world, &t);
    // slab emits all six faces; stone loses the two faces towards unloaded columns
    assert_eq!(g.vertex_count() / 4, 6 + 6 - 2);
    let (_, max) = g.bounds().unwrap();
    assert_eq!(max[1], 1.5);
}

#[test]
fn tinted_blocks_take_biome_colour() {
    let t = table();
    let mut world = WorldState::new("1.20", Arc::clone(&t));
    let snap = ColumnSnapshot::new(0, 16).with_biomes(vec![6; 256]);
    world.add_column(0, 0, &snap.to_json()).unwrap();
    world.set_block_state_id(BlockPos::new(1, 1, 1), 2);
    let g = CubeMesher.mesh_section(SectionKey::new(0, 0, 0), &world, &t);
    let swamp = t.biome(6).unwrap().rgb();
    assert_eq!(&g.colors[..3], &swamp);
}

#[test]
fn meshing_is_deterministic() {
    let mut world = WorldState::new("1.20", table());
    air_column(&mut world, 0, 0);
    for i in 0..16 {
        world.set_block_state_id(BlockPos::new(i, i % 5, 15 - i), 1 + (i as u32 % 3));
    }
    let t = Arc::clone(world.table());
    let key = SectionKey::new(0, 0, 0);
    let a = CubeMesher.mesh_section(key, &world, &t);
    let b = CubeMesher.mesh_section(key, &world, &t);
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn sections_of_missing_columns_are_empty() {
    let world = WorldState::new("1.20", table());
    assert_eq!(quads(&world, SectionKey::new(32, 0, 32)), 0);
}
