/// Integer encoding of a block's exact type and variant.
pub type StateId = u32;
pub type BiomeId = u16;

/// Canonical empty/unknown state. Every table resolves it.
pub const EMPTY_STATE: StateId = 0;
/// Biome used when a column stores no biome or an unresolved one.
pub const DEFAULT_BIOME: BiomeId = 1;

/// Axis-aligned box in block-local units: `[x0, y0, z0, x1, y1, z1]`.
pub type ShapeBox = [f32; 6];

const UNIT_BOX: [ShapeBox; 1] = [[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]];

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Empty,
    Cube,
    Boxes(Vec<ShapeBox>),
}

impl Shape {
    /// Collapses a box list into the canonical variant (a single unit box is a cube).
    pub fn from_boxes(boxes: Vec<ShapeBox>) -> Shape {
        match boxes.as_slice() {
            [] => Shape::Empty,
            [b] if *b == UNIT_BOX[0] => Shape::Cube,
            _ => Shape::Boxes(boxes),
        }
    }

    #[inline]
    pub fn is_cube(&self) -> bool {
        matches!(self, Shape::Cube)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Shape::Empty)
    }

    pub fn boxes(&self) -> &[ShapeBox] {
        match self {
            Shape::Empty => &[],
            Shape::Cube => &UNIT_BOX,
            Shape::Boxes(b) => b,
        }
    }
}

/// State-keyed block metadata. Identical for every block sharing a state id.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockDescriptor {
    pub state_id: StateId,
    pub name: String,
    pub display_name: String,
    pub shape: Shape,
    pub transparent: bool,
    /// Multiply vertex colour by the biome colour.
    pub tint: bool,
    /// Atlas rect `(u, v, du, dv)`.
    pub uv: [f32; 4],
}

impl BlockDescriptor {
    pub fn air() -> Self {
        Self {
            state_id: EMPTY_STATE,
            name: "air".into(),
            display_name: "Air".into(),
            shape: Shape::Empty,
            transparent: true,
            tint: false,
            uv: [0.0, 0.0, 1.0, 1.0],
        }
    }

    #[inline]
    pub fn is_cube(&self) -> bool {
        self.shape.is_cube()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Whether this block hides the adjacent face of a neighbour.
    #[inline]
    pub fn occludes(&self) -> bool {
        self.is_cube() && !self.transparent
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Biome {
    pub id: BiomeId,
    pub name: String,
    /// `0xRRGGBB`
    pub color: u32,
}

impl Biome {
    pub fn plains() -> Self {
        Self {
            id: DEFAULT_BIOME,
            name: "plains".into(),
            color: 0x91BD59,
        }
    }

    #[inline]
    pub fn rgb(&self) -> [f32; 3] {
        let r = ((self.color >> 16) & 0xFF) as f32 / 255.0;
        let g = ((self.color >> 8) & 0xFF) as f32 / 255.0;
        let b = (self.color & 0xFF) as f32 / 255.0;
        [r, g, b]
    }
}
