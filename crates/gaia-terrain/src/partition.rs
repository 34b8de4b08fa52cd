//! Nearest-seed (Voronoi) partition of the terrain domain and the biome
//! neighbor graph.
//!
//! Cells are built by clipping the margin-expanded domain rectangle against
//! the perpendicular bisector of every other seed, so border cells are always
//! bounded. The neighbor graph comes from the Delaunay triangulation of the
//! seeds, which is symmetric and duplicate-free by construction.

use glam::DVec2;
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::error::TerrainError;
use crate::geometry::{Bounds, LabeledVertex, clip_half_plane, polygon_contains};
use crate::placement::SeedPlacement;

/// A placed biome: catalog kind, seed position, Voronoi cell and neighbors.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeInstance {
    /// Index into the [`BiomeCatalog`](crate::BiomeCatalog).
    pub kind: usize,
    pub position: DVec2,
    /// Counter-clockwise cell ring. Empty for a seed that coincides with an
    /// earlier one.
    pub cell: Vec<DVec2>,
    /// For each cell edge `cell[i] -> cell[i + 1]`, the instance on the other
    /// side, or `None` on the outer rectangle.
    pub edge_neighbors: Vec<Option<usize>>,
    /// Sorted indices of adjacent instances.
    pub neighbors: Vec<usize>,
}

impl BiomeInstance {
    /// Iterates the cell edges as `(start, end, neighbor)`.
    pub fn cell_edges(&self) -> impl Iterator<Item = (DVec2, DVec2, Option<usize>)> + '_ {
        let n = self.cell.len();
        (0..n).map(move |i| (self.cell[i], self.cell[(i + 1) % n], self.edge_neighbors[i]))
    }

    pub fn cell_contains(&self, p: DVec2) -> bool {
        polygon_contains(&self.cell, p)
    }
}

/// Biome instances arena plus the bounds their cells cover.
#[derive(Clone, Debug)]
pub struct Partition {
    instances: Vec<BiomeInstance>,
    domain: Bounds,
    sampling_bounds: Bounds,
}

impl Partition {
    /// Builds cells and the neighbor graph for `seeds`.
    ///
    /// `margin` expands `domain` so cells along the border stay bounded.
    /// Coincident seeds are accepted: the earliest one owns the location and
    /// the later ones get an empty cell and no neighbors.
    ///
    /// # Errors
    ///
    /// [`TerrainError::Configuration`] for an empty seed list, a negative
    /// margin, or a seed the triangulation cannot represent.
    pub fn build(
        seeds: &[SeedPlacement],
        domain: Bounds,
        margin: f64,
    ) -> Result<Self, TerrainError> {
        if seeds.is_empty() {
            return Err(TerrainError::Configuration(
                "partition needs at least one seed".into(),
            ));
        }
        if !(margin >= 0.0 && margin.is_finite()) {
            return Err(TerrainError::Configuration(format!(
                "partition margin must be non-negative, got {margin}"
            )));
        }

        let sampling_bounds = domain.expanded(margin);
        let positions: Vec<DVec2> = seeds.iter().map(|s| s.position).collect();
        let neighbors = delaunay_neighbors(&positions)?;

        let instances = seeds
            .iter()
            .zip(neighbors)
            .enumerate()
            .map(|(index, (seed, neighbors))| {
                let ring = voronoi_cell(index, &positions, &sampling_bounds);
                BiomeInstance {
                    kind: seed.kind,
                    position: seed.position,
                    cell: ring.iter().map(|v| v.point).collect(),
                    edge_neighbors: ring.iter().map(|v| v.edge_label).collect(),
                    neighbors,
                }
            })
            .collect();

        Ok(Self {
            instances,
            domain,
            sampling_bounds,
        })
    }

    pub fn instances(&self) -> &[BiomeInstance] {
        &self.instances
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn instance(&self, index: usize) -> &BiomeInstance {
        &self.instances[index]
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.instances[index].neighbors
    }

    /// The terrain domain seeds were drawn from.
    pub fn domain(&self) -> Bounds {
        self.domain
    }

    /// The margin-expanded rectangle the cells cover.
    pub fn sampling_bounds(&self) -> Bounds {
        self.sampling_bounds
    }

    /// Index of the nearest seed. Ties go to the lowest index, matching cell
    /// ownership of coincident seeds.
    pub fn home_of(&self, p: DVec2) -> usize {
        let mut best = 0;
        let mut best_dist_sq = f64::INFINITY;
        for (index, instance) in self.instances.iter().enumerate() {
            let dist_sq = instance.position.distance_squared(p);
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best = index;
            }
        }
        best
    }

    /// Index of the cell whose polygon contains `p`, if any.
    pub fn cell_containing(&self, p: DVec2) -> Option<usize> {
        self.instances.iter().position(|i| i.cell_contains(p))
    }
}

/// Clips the sampling rectangle down to the cell of seed `index`.
fn voronoi_cell(index: usize, positions: &[DVec2], bounds: &Bounds) -> Vec<LabeledVertex> {
    let site = positions[index];
    let mut ring: Vec<LabeledVertex> = bounds
        .corners()
        .into_iter()
        .map(|point| LabeledVertex {
            point,
            edge_label: None,
        })
        .collect();

    for (other, &other_pos) in positions.iter().enumerate() {
        if other == index {
            continue;
        }
        if other_pos == site {
            if other < index {
                return Vec::new();
            }
            continue;
        }
        let midpoint = (site + other_pos) * 0.5;
        ring = clip_half_plane(&ring, midpoint, other_pos - site, other);
        if ring.is_empty() {
            break;
        }
    }
    ring
}

/// Adjacency lists from the Delaunay triangulation of the seeds.
fn delaunay_neighbors(positions: &[DVec2]) -> Result<Vec<Vec<usize>>, TerrainError> {
    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    // Triangulation vertex index -> first seed inserted at that position.
    let mut owner: Vec<usize> = Vec::with_capacity(positions.len());

    for (index, p) in positions.iter().enumerate() {
        let handle = triangulation.insert(Point2::new(p.x, p.y)).map_err(|e| {
            TerrainError::Configuration(format!("seed {index} at {p} cannot be triangulated: {e:?}"))
        })?;
        if handle.index() == owner.len() {
            owner.push(index);
        }
    }

    let mut neighbors = vec![Vec::new(); positions.len()];
    for edge in triangulation.undirected_edges() {
        let [a, b] = edge.vertices();
        let a = owner[a.fix().index()];
        let b = owner[b.fix().index()];
        neighbors[a].push(b);
        neighbors[b].push(a);
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    Ok(neighbors)
}
