use std::error::Error;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strata_blocks::{BiomeId, StateId};

use crate::coords::SECTION_HEIGHT;

pub const DEFAULT_MIN_Y: i32 = 0;
pub const DEFAULT_WORLD_HEIGHT: i32 = 256;
/// Tallest column accepted from a snapshot; taller ones fall back to the default extent.
pub const MAX_WORLD_HEIGHT: i32 = 4096;

/// Vertical extent declared by a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnExtent {
    pub min_y: i32,
    pub world_height: i32,
}

impl Default for ColumnExtent {
    fn default() -> Self {
        Self {
            min_y: DEFAULT_MIN_Y,
            world_height: DEFAULT_WORLD_HEIGHT,
        }
    }
}

impl ColumnExtent {
    /// Reads `minY`/`worldHeight` from raw snapshot text. Missing, non-integer or
    /// unparseable fields fall back to the defaults individually. An extent taller
    /// than [`MAX_WORLD_HEIGHT`] or whose top does not fit in `i32` is replaced
    /// by the default extent as a whole.
    pub fn read(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(v) => Self::from_value(&v),
            Err(_) => Self::default(),
        }
    }

    pub fn from_value(v: &Value) -> Self {
        let field = |name: &str| {
            v.get(name)
                .and_then(Value::as_i64)
                .and_then(|n| i32::try_from(n).ok())
        };
        let min_y = field("minY").unwrap_or(DEFAULT_MIN_Y);
        let world_height = field("worldHeight")
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_WORLD_HEIGHT);
        let world_height = round_up_sections(world_height);
        if world_height > MAX_WORLD_HEIGHT || min_y.checked_add(world_height).is_none() {
            return Self::default();
        }
        Self { min_y, world_height }
    }

    #[inline]
    pub fn max_y(self) -> i32 {
        self.min_y + self.world_height
    }

    #[inline]
    pub fn section_count(self) -> usize {
        (self.world_height / SECTION_HEIGHT) as usize
    }

    /// Whether a section with bottom `y` lies inside this extent.
    #[inline]
    pub fn contains_section(self, y: i32) -> bool {
        y >= self.min_y && y < self.max_y()
    }

    /// Section origins on y, bottom-up.
    pub fn section_ys(self) -> impl Iterator<Item = i32> {
        (self.min_y..self.max_y()).step_by(SECTION_HEIGHT as usize)
    }
}

fn round_up_sections(h: i32) -> i32 {
    // Stable equivalent of signed `i32::div_ceil` (SECTION_HEIGHT > 0).
    let q = h / SECTION_HEIGHT;
    let q = if h % SECTION_HEIGHT > 0 { q + 1 } else { q };
    q.saturating_mul(SECTION_HEIGHT)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionSnapshot {
    Indirect { palette: Vec<StateId>, data: Vec<u16> },
    Direct { states: Vec<StateId> },
    Single { value: StateId },
}

/// Serialized column as delivered by the world source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSnapshot {
    pub min_y: i32,
    pub world_height: i32,
    #[serde(default)]
    pub sections: Vec<Option<SectionSnapshot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomes: Option<Vec<BiomeId>>,
}

impl ColumnSnapshot {
    /// Empty column of the given extent.
    pub fn new(min_y: i32, world_height: i32) -> Self {
        Self {
            min_y,
            world_height,
            sections: Vec::new(),
            biomes: None,
        }
    }

    /// Fills the section whose bottom is at `y` with one state.
    pub fn with_uniform_section(mut self, y: i32, state: StateId) -> Self {
        let idx = ((y - self.min_y) / SECTION_HEIGHT) as usize;
        if self.sections.len() <= idx {
            self.sections.resize(idx + 1, None);
        }
        self.sections[idx] = Some(SectionSnapshot::Single { value: state });
        self
    }

    pub fn with_section(mut self, y: i32, section: SectionSnapshot) -> Self {
        let idx = ((y - self.min_y) / SECTION_HEIGHT) as usize;
        if self.sections.len() <= idx {
            self.sections.resize(idx + 1, None);
        }
        self.sections[idx] = Some(section);
        self
    }

    pub fn with_biomes(mut self, biomes: Vec<BiomeId>) -> Self {
        self.biomes = Some(biomes);
        self
    }

    /// Lenient decode: the extent falls back to defaults like [`ColumnExtent::read`],
    /// section and biome payloads must be well-formed.
    pub fn decode(raw: &str) -> Result<Self, Box<dyn Error>> {
        let v: Value = serde_json::from_str(raw)?;
        let extent = ColumnExtent::from_value(&v);
        let sections = match v.get("sections") {
            Some(s) if !s.is_null() => Vec::<Option<SectionSnapshot>>::deserialize(s)?,
            _ => Vec::new(),
        };
        let biomes = match v.get("biomes") {
            Some(b) if !b.is_null() => Some(Vec::<BiomeId>::deserialize(b)?),
            _ => None,
        };
        Ok(Self {
            min_y: extent.min_y,
            world_height: extent.world_height,
            sections,
            biomes,
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_defaults_when_missing_or_invalid() {
        assert_eq!(ColumnExtent::read("not json"), ColumnExtent::default());
        assert_eq!(ColumnExtent::read("{}"), ColumnExtent::default());
        let e = ColumnExtent::read(r#"{"minY": "low", "worldHeight": 384}"#);
        assert_eq!(e, ColumnExtent { min_y: 0, world_height: 384 });
        let e = ColumnExtent::read(r#"{"minY": -64, "worldHeight": -5}"#);
        assert_eq!(e, ColumnExtent { min_y: -64, world_height: 256 });
        let e = ColumnExtent::read(r#"{"minY": 0, "worldHeight": 20}"#);
        assert_eq!(e.world_height, 32);
        assert_eq!(e.section_ys().collect::<Vec<_>>(), vec![0, 16]);
    }

    #[test]
    fn oversized_or_overflowing_extent_falls_back() {
        let e = ColumnExtent::read(r#"{"minY": 0, "worldHeight": 2147483647}"#);
        assert_eq!(e, ColumnExtent::default());
        let e = ColumnExtent::read(r#"{"minY": 0, "worldHeight": 8192}"#);
        assert_eq!(e, ColumnExtent::default());
        let e = ColumnExtent::read(r#"{"minY": 2147483600, "worldHeight": 256}"#);
        assert_eq!(e, ColumnExtent::default());
        assert_eq!(e.section_ys().count(), 16);

        let e = ColumnExtent::read(r#"{"minY": -2048, "worldHeight": 4096}"#);
        assert_eq!(e, ColumnExtent { min_y: -2048, world_height: MAX_WORLD_HEIGHT });
        assert_eq!(e.section_count(), 256);
        assert!(e.contains_section(-2048));
        assert!(!e.contains_section(2048));
    }

    #[test]
    fn decode_accepts_all_section_forms() {
        let raw = serde_json::json!({
            "minY": -16,
            "worldHeight": 64,
            "sections": [
                null,
                {"value": 4},
                {"palette": [0, 2], "data": vec![1u16; 4096]},
                {"states": vec![3u32; 4096]},
            ],
        })
        .to_string();
        let snap = ColumnSnapshot::decode(&raw).unwrap();
        assert_eq!(snap.min_y, -16);
        assert_eq!(snap.sections.len(), 4);
        assert!(snap.sections[0].is_none());
        assert_eq!(snap.sections[1], Some(SectionSnapshot::Single { value: 4 }));
        assert!(matches!(snap.sections[2], Some(SectionSnapshot::Indirect { .. })));
        assert!(matches!(snap.sections[3], Some(SectionSnapshot::Direct { .. })));
        assert!(snap.biomes.is_none());
    }

    #[test]
    fn decode_round_trips_builder_output() {
        let snap = ColumnSnapshot::new(0, 32).with_uniform_section(16, 1);
        let back = ColumnSnapshot::decode(&snap.to_json()).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn decode_rejects_garbage_sections() {
        assert!(ColumnSnapshot::decode(r#"{"sections": [{"bogus": 1}]}"#).is_err());
        assert!(ColumnSnapshot::decode("[1, 2").is_err());
    }
}
