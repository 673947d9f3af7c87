use std::fmt;

use serde::{Deserialize, Serialize};

/// Horizontal extent of a column.
pub const CHUNK_WIDTH: i32 = 16;
/// Vertical extent of a section.
pub const SECTION_HEIGHT: i32 = 16;

/// Rounds down to the nearest multiple of 16, also for negative values.
#[inline]
pub const fn snap(v: i32) -> i32 {
    v.div_euclid(CHUNK_WIDTH) * CHUNK_WIDTH
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    #[inline]
    pub fn column(self) -> ColumnCoord {
        ColumnCoord::containing(self.x, self.z)
    }

    #[inline]
    pub fn section(self) -> SectionKey {
        SectionKey::containing(self)
    }

    /// Position within the owning column on x/z (`0..16`).
    #[inline]
    pub fn local_xz(self) -> (usize, usize) {
        (
            self.x.rem_euclid(CHUNK_WIDTH) as usize,
            self.z.rem_euclid(CHUNK_WIDTH) as usize,
        )
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// Column identity: world x/z snapped to the chunk width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnCoord {
    pub x: i32,
    pub z: i32,
}

impl ColumnCoord {
    #[inline]
    pub const fn containing(x: i32, z: i32) -> Self {
        Self {
            x: snap(x),
            z: snap(z),
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::containing(self.x + dx * CHUNK_WIDTH, self.z + dz * CHUNK_WIDTH)
    }

    #[inline]
    pub fn section(self, y: i32) -> SectionKey {
        SectionKey::new(self.x, y, self.z)
    }
}

impl fmt::Display for ColumnCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

/// Section identity: origin snapped to 16 on every axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SectionKey {
    /// Snaps arbitrary coordinates to the section that contains them.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: snap(x),
            y: snap(y),
            z: snap(z),
        }
    }

    #[inline]
    pub const fn containing(pos: BlockPos) -> Self {
        Self::new(pos.x, pos.y, pos.z)
    }

    #[inline]
    pub fn column(self) -> ColumnCoord {
        ColumnCoord::containing(self.x, self.z)
    }

    #[inline]
    pub fn origin(self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }

    /// Section index along each axis (`floor(coord / 16)`).
    #[inline]
    pub fn grid(self) -> (i32, i32, i32) {
        (
            self.x.div_euclid(CHUNK_WIDTH),
            self.y.div_euclid(SECTION_HEIGHT),
            self.z.div_euclid(CHUNK_WIDTH),
        )
    }

    /// Neighbouring section, stepping whole sections.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx * CHUNK_WIDTH,
            y: self.y + dy * SECTION_HEIGHT,
            z: self.z + dz * CHUNK_WIDTH,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}
