//! Primitive rune geometry.
//!
//! All primitives are flat triangle lists in the unit rune space: x and y
//! span `[-1, 1]`, z is 0 (depth is assigned later by `overlay_frac`). UV
//! coordinates are derived from position so textured primitives map the full
//! image across the shape's bounding square.

use glam::Vec3;

/// A vertex for rune rendering: position plus texture coordinates.
///
/// `#[repr(C)]` and the bytemuck derives make the struct castable to a byte
/// slice for GPU upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in rune space.
    pub position: [f32; 3],
    /// Texture coordinates in `[0, 1]`.
    pub uv: [f32; 2],
}

impl Vertex {
    /// The wgpu vertex buffer layout for this vertex type (20 bytes per
    /// vertex: position at location 0, uv at location 1).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    /// Creates a vertex at `(x, y, 0)` with UVs mapped from rune space.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: [x, y, 0.0],
            uv: [(x + 1.0) * 0.5, (1.0 - y) * 0.5],
        }
    }
}

/// CPU-side geometry for one primitive rune: an unindexed triangle list.
///
/// Geometry is immutable once built and shared between every occurrence of
/// the primitive in a composition. The renderer uploads it unmodified.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    /// Triangle-list vertices; the length is always a multiple of 3.
    pub vertices: Vec<Vertex>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Computes the axis-aligned bounding extent.
    ///
    /// Returns `(min, max)` corners; the zero box for empty geometry.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.vertices.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for v in &self.vertices {
            let p = Vec3::from_array(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    /// Number of triangles in the list.
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    fn push_triangle(&mut self, a: (f32, f32), b: (f32, f32), c: (f32, f32)) {
        self.vertices.push(Vertex::at(a.0, a.1));
        self.vertices.push(Vertex::at(b.0, b.1));
        self.vertices.push(Vertex::at(c.0, c.1));
    }

    fn push_quad(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        self.push_triangle((x0, y1), (x1, y1), (x0, y0));
        self.push_triangle((x0, y0), (x1, y1), (x1, y0));
    }

    /// Fans `outline` around `center`, closing the loop.
    fn fan(center: (f32, f32), outline: &[(f32, f32)]) -> Self {
        let mut geom = Self::new(Vec::with_capacity(outline.len() * 3));
        for i in 0..outline.len() {
            let next = outline[(i + 1) % outline.len()];
            geom.push_triangle(center, outline[i], next);
        }
        geom
    }

    /// The empty rune. Valid geometry; the renderer skips it.
    pub fn blank() -> Self {
        Self::new(Vec::new())
    }

    /// A square covering the full rune space.
    pub fn square() -> Self {
        let mut geom = Self::new(Vec::with_capacity(6));
        geom.push_quad(-1.0, -1.0, 1.0, 1.0);
        geom
    }

    /// A circle of radius 1 centered at the origin.
    pub fn circle() -> Self {
        const SEGMENTS: usize = 60;
        let outline: Vec<(f32, f32)> = (0..SEGMENTS)
            .map(|i| {
                let theta = std::f32::consts::TAU * i as f32 / SEGMENTS as f32;
                (theta.cos(), theta.sin())
            })
            .collect();
        Self::fan((0.0, 0.0), &outline)
    }

    /// An upward-pointing triangle on the full base.
    pub fn triangle() -> Self {
        let mut geom = Self::new(Vec::with_capacity(3));
        geom.push_triangle((-1.0, -1.0), (1.0, -1.0), (0.0, 1.0));
        geom
    }

    /// A small triangle tucked into the upper-right corner.
    pub fn corner() -> Self {
        let mut geom = Self::new(Vec::with_capacity(3));
        geom.push_triangle((1.0, 0.0), (1.0, 1.0), (0.0, 1.0));
        geom
    }

    /// A sail: a right triangle standing on the baseline.
    pub fn sail() -> Self {
        let mut geom = Self::new(Vec::with_capacity(3));
        geom.push_triangle((0.5, 1.0), (0.5, -1.0), (-0.5, -1.0));
        geom
    }

    /// A square ring: the full square minus a centered opening.
    pub fn rcross() -> Self {
        const INNER: f32 = 0.4;
        let mut geom = Self::new(Vec::with_capacity(24));
        geom.push_quad(-1.0, INNER, 1.0, 1.0);
        geom.push_quad(-1.0, -1.0, 1.0, -INNER);
        geom.push_quad(-1.0, -INNER, -INNER, INNER);
        geom.push_quad(INNER, -INNER, 1.0, INNER);
        geom
    }

    /// A four-pointed star.
    pub fn nova() -> Self {
        const VALLEY: f32 = 0.35;
        let mut outline = Vec::with_capacity(8);
        for i in 0..8 {
            let theta = std::f32::consts::FRAC_PI_2 + std::f32::consts::TAU * i as f32 / 8.0;
            let radius = if i % 2 == 0 { 1.0 } else { VALLEY };
            outline.push((radius * theta.cos(), radius * theta.sin()));
        }
        Self::fan((0.0, 0.0), &outline)
    }

    /// A heart traced from the classic parametric curve.
    pub fn heart() -> Self {
        const SAMPLES: usize = 60;
        // x = 16 sin^3 t, y = 13 cos t - 5 cos 2t - 2 cos 3t - cos 4t,
        // scaled by 1/17 to fit the unit rune space.
        let outline: Vec<(f32, f32)> = (0..SAMPLES)
            .map(|i| {
                let t = std::f32::consts::TAU * i as f32 / SAMPLES as f32;
                let x = 16.0 * t.sin().powi(3) / 17.0;
                let y = (13.0 * t.cos()
                    - 5.0 * (2.0 * t).cos()
                    - 2.0 * (3.0 * t).cos()
                    - (4.0 * t).cos())
                    / 17.0;
                (x, y)
            })
            .collect();
        // Fan center sits below the notch so every boundary segment stays
        // inside the curve.
        Self::fan((0.0, -0.2), &outline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_uv_maps_rune_space() {
        let v = Vertex::at(-1.0, 1.0);
        assert_eq!(v.uv, [0.0, 0.0]);
        let v = Vertex::at(1.0, -1.0);
        assert_eq!(v.uv, [1.0, 1.0]);
        let v = Vertex::at(0.0, 0.0);
        assert_eq!(v.uv, [0.5, 0.5]);
    }

    #[test]
    fn square_bounds_cover_rune_space() {
        let (min, max) = RawGeometry::square().bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn blank_is_empty_with_zero_bounds() {
        let blank = RawGeometry::blank();
        assert_eq!(blank.triangle_count(), 0);
        assert_eq!(blank.bounds(), (Vec3::ZERO, Vec3::ZERO));
    }

    #[test]
    fn all_primitives_are_triangle_lists() {
        for geom in [
            RawGeometry::square(),
            RawGeometry::circle(),
            RawGeometry::triangle(),
            RawGeometry::corner(),
            RawGeometry::sail(),
            RawGeometry::rcross(),
            RawGeometry::nova(),
            RawGeometry::heart(),
        ] {
            assert_eq!(geom.vertices.len() % 3, 0);
            assert!(geom.triangle_count() > 0);
        }
    }

    #[test]
    fn circle_stays_within_unit_radius() {
        let circle = RawGeometry::circle();
        for v in &circle.vertices {
            let r = (v.position[0] * v.position[0] + v.position[1] * v.position[1]).sqrt();
            assert!(r <= 1.0 + 1e-5);
        }
    }
}
