/// Interleaved geometry for one section, positions relative to its origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    /// Linear RGB per vertex.
    pub colors: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
}

impl GeometryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.positions.reserve(n_quads * 4 * 3);
        self.normals.reserve(n_quads * 4 * 3);
        self.colors.reserve(n_quads * 4 * 3);
        self.uvs.reserve(n_quads * 4 * 2);
        self.indices.reserve(n_quads * 6);
    }

    /// Appends a quad (two triangles). `uv` is the atlas rect `(u, v, du, dv)`;
    /// corners map to `(0,1) (1,1) (1,0) (0,0)` of that rect.
    pub fn add_quad(
        &mut self,
        corners: [[f32; 3]; 4],
        normal: [f32; 3],
        uv: [f32; 4],
        rgb: [f32; 3],
    ) {
        let base = self.vertex_count() as u32;
        let [u, v, du, dv] = uv;
        let tex = [[u, v + dv], [u + du, v + dv], [u + du, v], [u, v]];
        for (p, t) in corners.iter().zip(tex.iter()) {
            self.positions.extend_from_slice(p);
            self.normals.extend_from_slice(&normal);
            self.colors.extend_from_slice(&rgb);
            self.uvs.extend_from_slice(t);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned bounds of the positions, `None` when empty.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.is_empty() {
            return None;
        }
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in self.positions.chunks_exact(3) {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }
}
