use strata_blocks::StateId;

/// Blocks per section (16 × 16 × 16).
pub const SECTION_VOLUME: usize = 4096;
/// Palette size above which an indirect container is flattened.
pub const MAX_PALETTE: usize = 256;

/// Paletted state storage for one section, indexed `x + 16 * (z + 16 * y)`.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockContainer {
    Single(StateId),
    Indirect {
        palette: Vec<StateId>,
        indices: Vec<u16>,
    },
    Direct(Vec<StateId>),
}

impl Default for BlockContainer {
    fn default() -> Self {
        BlockContainer::Single(0)
    }
}

impl BlockContainer {
    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        (y * 16 + z) * 16 + x
    }

    /// Validates raw palette data; indices must be in range and cover the section.
    pub fn indirect(palette: Vec<StateId>, indices: Vec<u16>) -> Result<Self, String> {
        if palette.is_empty() {
            return Err("empty palette".into());
        }
        if indices.len() != SECTION_VOLUME {
            return Err(format!(
                "palette data has {} entries, expected {}",
                indices.len(),
                SECTION_VOLUME
            ));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
            return Err(format!(
                "palette index {} out of range ({} entries)",
                bad,
                palette.len()
            ));
        }
        Ok(BlockContainer::Indirect { palette, indices })
    }

    pub fn direct(states: Vec<StateId>) -> Result<Self, String> {
        if states.len() != SECTION_VOLUME {
            return Err(format!(
                "direct data has {} entries, expected {}",
                states.len(),
                SECTION_VOLUME
            ));
        }
        Ok(BlockContainer::Direct(states))
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> StateId {
        let i = Self::idx(x, y, z);
        match self {
            BlockContainer::Single(v) => *v,
            BlockContainer::Indirect { palette, indices } => palette[indices[i] as usize],
            BlockContainer::Direct(states) => states[i],
        }
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, state: StateId) {
        let i = Self::idx(x, y, z);
        match self {
            BlockContainer::Single(v) => {
                if *v == state {
                    return;
                }
                let mut indices = vec![0u16; SECTION_VOLUME];
                indices[i] = 1;
                *self = BlockContainer::Indirect {
                    palette: vec![*v, state],
                    indices,
                };
            }
            BlockContainer::Indirect { palette, indices } => {
                let slot = match palette.iter().position(|&p| p == state) {
                    Some(slot) => slot,
                    None if palette.len() < MAX_PALETTE => {
                        palette.push(state);
                        palette.len() - 1
                    }
                    None => {
                        let mut states: Vec<StateId> =
                            indices.iter().map(|&k| palette[k as usize]).collect();
                        states[i] = state;
                        *self = BlockContainer::Direct(states);
                        return;
                    }
                };
                indices[i] = slot as u16;
            }
            BlockContainer::Direct(states) => states[i] = state,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BlockContainer::Single(_) => "single",
            BlockContainer::Indirect { .. } => "indirect",
            BlockContainer::Direct(_) => "direct",
        }
    }

    pub fn palette_len(&self) -> Option<usize> {
        match self {
            BlockContainer::Indirect { palette, .. } => Some(palette.len()),
            _ => None,
        }
    }

    pub fn has_non_air(&self) -> bool {
        match self {
            BlockContainer::Single(v) => *v != 0,
            BlockContainer::Indirect { palette, indices } => {
                indices.iter().any(|&k| palette[k as usize] != 0)
            }
            BlockContainer::Direct(states) => states.iter().any(|&s| s != 0),
        }
    }
}
