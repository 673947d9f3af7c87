use serde::Deserialize;

use super::types::{BiomeId, ShapeBox, StateId};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub biomes: Vec<BiomeDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StateDef {
    pub id: StateId,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub shape: Option<ShapeConfig>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub tint: Option<bool>,
    #[serde(default)]
    pub uv: Option<[f32; 4]>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ShapeConfig {
    // shape = "cube"
    Named(String),
    // shape = [[0.0, 0.0, 0.0, 1.0, 0.5, 1.0]]
    Boxes(Vec<ShapeBox>),
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeDef {
    pub id: BiomeId,
    pub name: String,
    pub color: u32,
}
