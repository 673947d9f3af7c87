use std::error::Error;

use strata_blocks::{BiomeId, StateId};

use crate::container::BlockContainer;
use crate::coords::{BlockPos, CHUNK_WIDTH, SECTION_HEIGHT};
use crate::snapshot::{ColumnExtent, ColumnSnapshot, SectionSnapshot};

const BIOME_CELLS: usize = (CHUNK_WIDTH * CHUNK_WIDTH) as usize;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Section {
    pub blocks: BlockContainer,
}

impl Section {
    pub fn filled(state: StateId) -> Self {
        Self {
            blocks: BlockContainer::Single(state),
        }
    }

    fn from_snapshot(s: SectionSnapshot) -> Result<Self, String> {
        let blocks = match s {
            SectionSnapshot::Single { value } => BlockContainer::Single(value),
            SectionSnapshot::Indirect { palette, data } => BlockContainer::indirect(palette, data)?,
            SectionSnapshot::Direct { states } => BlockContainer::direct(states)?,
        };
        Ok(Self { blocks })
    }
}

/// Vertical stack of sections at one column coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub min_y: i32,
    pub world_height: i32,
    pub sections: Vec<Option<Section>>,
    /// Per x/z biome ids, indexed `x + 16 * z`.
    pub biomes: Option<Vec<BiomeId>>,
}

impl Column {
    pub fn empty(extent: ColumnExtent) -> Self {
        Self {
            min_y: extent.min_y,
            world_height: extent.world_height,
            sections: vec![None; extent.section_count()],
            biomes: None,
        }
    }

    pub fn from_snapshot(snap: ColumnSnapshot) -> Result<Self, Box<dyn Error>> {
        let extent = ColumnExtent {
            min_y: snap.min_y,
            world_height: snap.world_height,
        };
        let count = extent.section_count();
        if snap.sections.len() > count {
            return Err(format!(
                "snapshot has {} sections, extent allows {}",
                snap.sections.len(),
                count
            )
            .into());
        }
        let mut column = Column::empty(extent);
        for (i, s) in snap.sections.into_iter().enumerate() {
            if let Some(s) = s {
                let section = Section::from_snapshot(s).map_err(|e| format!("section {i}: {e}"))?;
                column.sections[i] = Some(section);
            }
        }
        column.biomes = match snap.biomes {
            Some(b) if b.len() == BIOME_CELLS => Some(b),
            Some(b) => {
                let msg = format!("biome map has {} entries, expected {}", b.len(), BIOME_CELLS);
                return Err(msg.into());
            }
            None => None,
        };
        Ok(column)
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.min_y + self.world_height
    }

    /// Slot index of the section containing world height `y`, if inside the column.
    #[inline]
    pub fn section_index(&self, y: i32) -> Option<usize> {
        if y < self.min_y || y >= self.max_y() {
            return None;
        }
        let idx = ((y - self.min_y) / SECTION_HEIGHT) as usize;
        (idx < self.sections.len()).then_some(idx)
    }

    #[inline]
    pub fn section(&self, y: i32) -> Option<&Section> {
        self.section_index(y)
            .and_then(|i| self.sections[i].as_ref())
    }

    /// Whether the section containing `y` exists and is populated.
    #[inline]
    pub fn has_section(&self, y: i32) -> bool {
        self.section(y).is_some()
    }

    /// Raw state id at a world position inside this column; empty outside it.
    pub fn state_at(&self, pos: BlockPos) -> StateId {
        let Some(section) = self.section(pos.y) else {
            return 0;
        };
        let (lx, lz) = pos.local_xz();
        let ly = (pos.y - self.min_y).rem_euclid(SECTION_HEIGHT) as usize;
        section.blocks.get(lx, ly, lz)
    }

    /// Writes a state id; creates an empty section when the slot is unpopulated.
    /// Returns `false` when `pos.y` lies outside the column.
    pub fn set_state(&mut self, pos: BlockPos, state: StateId) -> bool {
        let Some(idx) = self.section_index(pos.y) else {
            return false;
        };
        let (lx, lz) = pos.local_xz();
        let ly = (pos.y - self.min_y).rem_euclid(SECTION_HEIGHT) as usize;
        self.sections[idx]
            .get_or_insert_with(Section::default)
            .blocks
            .set(lx, ly, lz, state);
        true
    }

    pub fn biome_at(&self, pos: BlockPos) -> Option<BiomeId> {
        let (lx, lz) = pos.local_xz();
        self.biomes
            .as_ref()
            .map(|b| b[lx + lz * CHUNK_WIDTH as usize])
    }

    pub fn populated_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column() -> Column {
        let snap = ColumnSnapshot::new(-16, 48)
            .with_uniform_section(-16, 1)
            .with_uniform_section(16, 2);
        Column::from_snapshot(snap).unwrap()
    }

    #[test]
    fn section_lookup_respects_population() {
        let c = column();
        assert_eq!(c.sections.len(), 3);
        assert!(c.has_section(-16));
        assert!(c.has_section(-1));
        assert!(!c.has_section(0));
        assert!(c.has_section(31));
        assert!(!c.has_section(32));
        assert!(!c.has_section(-17));
        assert_eq!(c.populated_sections(), 2);
    }

    #[test]
    fn state_reads_and_writes_use_local_coords() {
        let mut c = column();
        let p = BlockPos::new(-33, 20, 47);
        assert_eq!(c.state_at(p), 2);
        assert!(c.set_state(p, 9));
        assert_eq!(c.state_at(p), 9);
        assert_eq!(c.state_at(p.offset(1, 0, 0)), 2);
        assert!(c.set_state(BlockPos::new(0, 5, 0), 4));
        assert!(c.has_section(5));
        assert_eq!(c.state_at(BlockPos::new(0, 5, 0)), 4);
        assert_eq!(c.state_at(BlockPos::new(1, 5, 0)), 0);
        assert!(!c.set_state(BlockPos::new(0, 40, 0), 4));
        assert_eq!(c.state_at(BlockPos::new(0, 40, 0)), 0);
    }

    #[test]
    fn rejects_oversized_payloads() {
        let mut snap = ColumnSnapshot::new(0, 16).with_uniform_section(0, 1);
        snap.sections.push(None);
        assert!(Column::from_snapshot(snap).is_err());
        let snap = ColumnSnapshot::new(0, 16).with_biomes(vec![1; 3]);
        assert!(Column::from_snapshot(snap).is_err());
    }

    #[test]
    fn biome_lookup_by_local_xz() {
        let mut biomes = vec![1u16; 256];
        biomes[3 + 16 * 5] = 7;
        let c = Column::from_snapshot(ColumnSnapshot::new(0, 16).with_biomes(biomes)).unwrap();
        assert_eq!(c.biome_at(BlockPos::new(19, 0, -11)), Some(7));
        assert_eq!(c.biome_at(BlockPos::new(0, 0, 0)), Some(1));
    }
}
