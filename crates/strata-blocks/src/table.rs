use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::config::{ShapeConfig, StateDef, TableConfig};
use super::types::{Biome, BiomeId, BlockDescriptor, DEFAULT_BIOME, EMPTY_STATE, Shape, StateId};

/// Block-state → descriptor mapping for one data version, plus the biome table.
#[derive(Clone, Debug)]
pub struct BlockStateTable {
    states: HashMap<StateId, BlockDescriptor>,
    biomes: HashMap<BiomeId, Arc<Biome>>,
    max_state_id: StateId,
    air: BlockDescriptor,
    default_biome: Arc<Biome>,
}

impl Default for BlockStateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStateTable {
    /// Table with only the built-in empty state and default biome.
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            biomes: HashMap::new(),
            max_state_id: EMPTY_STATE,
            air: BlockDescriptor::air(),
            default_biome: Arc::new(Biome::plains()),
        }
    }

    pub fn from_config(cfg: TableConfig) -> Result<Self, Box<dyn Error>> {
        let mut table = Self::new();
        for def in cfg.states {
            let id = def.id;
            let desc = compile_state(def)?;
            table.max_state_id = table.max_state_id.max(id);
            table.states.insert(id, desc);
        }
        if let Some(air) = table.states.get(&EMPTY_STATE) {
            table.air = air.clone();
        }
        for def in cfg.biomes {
            table.biomes.insert(
                def.id,
                Arc::new(Biome {
                    id: def.id,
                    name: def.name,
                    color: def.color,
                }),
            );
        }
        if let Some(b) = table.biomes.get(&DEFAULT_BIOME) {
            table.default_biome = Arc::clone(b);
        }
        Ok(table)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: TableConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Highest declared state id; writes above it are rejected.
    #[inline]
    pub fn max_state_id(&self) -> StateId {
        self.max_state_id
    }

    #[inline]
    pub fn has_mapping(&self, id: StateId) -> bool {
        id == EMPTY_STATE || self.states.contains_key(&id)
    }

    pub fn descriptor(&self, id: StateId) -> Option<&BlockDescriptor> {
        if id == EMPTY_STATE {
            return Some(&self.air);
        }
        self.states.get(&id)
    }

    pub fn biome(&self, id: BiomeId) -> Option<&Arc<Biome>> {
        if id == DEFAULT_BIOME {
            return Some(&self.default_biome);
        }
        self.biomes.get(&id)
    }

    #[inline]
    pub fn default_biome(&self) -> &Arc<Biome> {
        &self.default_biome
    }

    pub fn id_by_name(&self, name: &str) -> Option<StateId> {
        if self.air.name == name {
            return Some(EMPTY_STATE);
        }
        self.states
            .iter()
            .filter(|(_, d)| d.name == name)
            .map(|(id, _)| *id)
            .min()
    }

    /// Number of declared states (the built-in empty state is not counted unless declared).
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn compile_state(def: StateDef) -> Result<BlockDescriptor, Box<dyn Error>> {
    let shape = match def.shape {
        None => Shape::Cube,
        Some(ShapeConfig::Named(k)) => match k.as_str() {
            "cube" => Shape::Cube,
            "empty" | "none" => Shape::Empty,
            other => {
                return Err(
                    format!("state {} ({}): unknown shape '{}'", def.id, def.name, other).into(),
                );
            }
        },
        Some(ShapeConfig::Boxes(boxes)) => Shape::from_boxes(boxes),
    };
    let transparent = def.transparent.unwrap_or(shape.is_empty());
    Ok(BlockDescriptor {
        state_id: def.id,
        display_name: def.display_name.unwrap_or_else(|| def.name.clone()),
        name: def.name,
        shape,
        transparent,
        tint: def.tint.unwrap_or(false),
        uv: def.uv.unwrap_or([0.0, 0.0, 1.0, 1.0]),
    })
}
