//! Coarse uniform grid over seed positions for radius queries.

use glam::DVec2;
use hashbrown::HashMap;

/// Buckets instance indices by the grid cell their seed falls in.
///
/// A query of radius `r <= cell_size` only has to scan the 3x3 block of cells
/// around the query point.
#[derive(Clone, Debug)]
pub struct SeedGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SeedGrid {
    /// Builds a grid with the given cell size. Non-positive sizes fall back to
    /// 1 so a zero blend radius still produces a valid grid.
    pub fn new(positions: impl IntoIterator<Item = DVec2>, cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            1.0
        };
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (index, p) in positions.into_iter().enumerate() {
            cells
                .entry(Self::key(p, cell_size))
                .or_default()
                .push(index);
        }
        Self { cell_size, cells }
    }

    fn key(p: DVec2, cell_size: f64) -> (i64, i64) {
        (
            (p.x / cell_size).floor() as i64,
            (p.y / cell_size).floor() as i64,
        )
    }

    /// Fills `out` with every index whose seed may lie within `radius` of `p`,
    /// in ascending index order.
    ///
    /// Candidates are a superset: callers still test the exact distance.
    pub fn candidates(&self, p: DVec2, radius: f64, out: &mut Vec<usize>) {
        out.clear();
        let reach = (radius / self.cell_size).ceil().max(1.0) as i64;
        let (cx, cy) = Self::key(p, self.cell_size);
        for gx in (cx - reach)..=(cx + reach) {
            for gy in (cy - reach)..=(cy + reach) {
                if let Some(indices) = self.cells.get(&(gx, gy)) {
                    out.extend_from_slice(indices);
                }
            }
        }
        out.sort_unstable();
    }
}
