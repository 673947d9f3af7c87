use proptest::prelude::*;
use strata_runtime::route_section;
use strata_world::{BlockPos, SectionKey};

proptest! {
    #[test]
    fn routing_is_stable_and_in_range(
        x in -100_000i32..100_000,
        y in -2_048i32..2_048,
        z in -100_000i32..100_000,
        n in 1usize..64,
    ) {
        let key = SectionKey::new(x, y, z);
        let first = route_section(key, n);
        prop_assert!(first < n);
        for _ in 0..4 {
            prop_assert_eq!(route_section(key, n), first);
        }
    }

    #[test]
    fn every_block_of_a_section_routes_alike(
        x in -10_000i32..10_000,
        y in -512i32..512,
        z in -10_000i32..10_000,
        dx in 0i32..16,
        dy in 0i32..16,
        dz in 0i32..16,
        n in 1usize..16,
    ) {
        let key = SectionKey::containing(BlockPos::new(x, y, z));
        let inner = SectionKey::containing(key.origin().offset(dx, dy, dz));
        prop_assert_eq!(route_section(inner, n), route_section(key, n));
    }

    #[test]
    fn routing_ignores_axis_order(a in -500i32..500, b in -500i32..500, c in -500i32..500, n in 1usize..9) {
        let k1 = SectionKey::new(a * 16, b * 16, c * 16);
        let k2 = SectionKey::new(c * 16, a * 16, b * 16);
        prop_assert_eq!(route_section(k1, n), route_section(k2, n));
    }
}
