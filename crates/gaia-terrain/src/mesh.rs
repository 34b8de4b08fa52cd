//! Output vertex buffers: the regular terrain grid with positions, colors and
//! normals ready for GPU upload.

use glam::{DVec2, DVec3};

use crate::geometry::Bounds;

/// Regular `(subdivisions + 1)^2` vertex grid over the terrain domain.
///
/// Vertices are row-major: index `row * per_side + col`, with `col` growing
/// along +x and `row` along +y from the domain's minimum corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    pub bounds: Bounds,
    pub per_side: usize,
}

impl GridLayout {
    pub fn new(bounds: Bounds, subdivisions: u32) -> Self {
        Self {
            bounds,
            per_side: subdivisions as usize + 1,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.per_side * self.per_side
    }

    /// Distance between neighboring vertices along x and y.
    pub fn spacing(&self) -> DVec2 {
        let cells = (self.per_side - 1).max(1) as f64;
        self.bounds.size() / cells
    }

    pub fn position_of(&self, index: usize) -> DVec2 {
        let (row, col) = (index / self.per_side, index % self.per_side);
        self.bounds.min + DVec2::new(col as f64, row as f64) * self.spacing()
    }

    /// Counter-clockwise triangle list, two triangles per grid cell.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let n = self.per_side;
        let cells = n - 1;
        let mut indices = Vec::with_capacity(cells * cells * 6);
        for row in 0..cells {
            for col in 0..cells {
                let a = (row * n + col) as u32;
                let b = a + 1;
                let c = a + n as u32;
                let d = c + 1;
                indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }
        indices
    }
}

/// Interleaved vertex for renderers that upload a single buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
}

/// Completed terrain surface. Immutable once published.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBuffer {
    pub layout: GridLayout,
    /// `(x, y, z)` per vertex, z being elevation.
    pub positions: Vec<[f32; 3]>,
    /// Linear RGB per vertex.
    pub colors: Vec<[f32; 3]>,
    /// Unit normals from central differences of the elevation grid.
    pub normals: Vec<[f32; 3]>,
}

impl MeshBuffer {
    /// Assembles the buffer from per-vertex elevations and colors and derives
    /// the normals.
    pub fn from_grid(layout: GridLayout, elevations: &[f64], colors: Vec<[f32; 3]>) -> Self {
        debug_assert_eq!(elevations.len(), layout.vertex_count());
        debug_assert_eq!(colors.len(), layout.vertex_count());
        let positions = elevations
            .iter()
            .enumerate()
            .map(|(i, &z)| {
                let p = layout.position_of(i);
                [p.x as f32, p.y as f32, z as f32]
            })
            .collect();
        let normals = grid_normals(&layout, elevations);
        Self {
            layout,
            positions,
            colors,
            normals,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn elevation(&self, index: usize) -> f32 {
        self.positions[index][2]
    }

    pub fn triangle_indices(&self) -> Vec<u32> {
        self.layout.triangle_indices()
    }

    pub fn interleaved(&self) -> Vec<TerrainVertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .zip(&self.normals)
            .map(|((&position, &color), &normal)| TerrainVertex {
                position,
                color,
                normal,
            })
            .collect()
    }

    /// Returns the position data as a byte slice for GPU upload (zero-copy).
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Returns the color data as a byte slice for GPU upload (zero-copy).
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Returns the normal data as a byte slice for GPU upload (zero-copy).
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }
}

/// Per-vertex normals of the height field `z(x, y)`; one-sided differences on
/// the border.
fn grid_normals(layout: &GridLayout, elevations: &[f64]) -> Vec<[f32; 3]> {
    let n = layout.per_side;
    let spacing = layout.spacing();
    let z = |row: usize, col: usize| elevations[row * n + col];

    (0..layout.vertex_count())
        .map(|i| {
            let (row, col) = (i / n, i % n);
            let (c0, c1) = (col.saturating_sub(1), (col + 1).min(n - 1));
            let (r0, r1) = (row.saturating_sub(1), (row + 1).min(n - 1));
            let dzdx = if c1 > c0 {
                (z(row, c1) - z(row, c0)) / ((c1 - c0) as f64 * spacing.x)
            } else {
                0.0
            };
            let dzdy = if r1 > r0 {
                (z(r1, col) - z(r0, col)) / ((r1 - r0) as f64 * spacing.y)
            } else {
                0.0
            };
            let normal = DVec3::new(-dzdx, -dzdy, 1.0).normalize();
            normal.as_vec3().to_array()
        })
        .collect()
}
