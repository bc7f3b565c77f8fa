//! A uniform grid spatial index.

use super::{BroadPhase, BroadPhaseItem, LayerMatrix, AABB};
use crate::physics::bitmatrix::{BitMatrix, BitMatrixParams};
use std::ops::RangeInclusive;

/// Parameters for the spatial grid.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GridParams {
    /// Side length of a grid cell. If not set, the cell size is recomputed every rebuild
    /// to match the largest bounding box extent in the scene,
    /// which keeps every collider within at most 2x2 cells.
    ///
    /// A fixed size can be faster if most objects are small and a few are huge,
    /// e.g. a long ground plane with lots of little things on it.
    pub cell_size: Option<f64>,
    /// Maximum number of columns and rows. If the scene is so spread out that
    /// the cell size would produce more cells than this, cells are made bigger.
    pub max_cells_per_axis: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cell_size: None,
            max_cells_per_axis: 1024,
        }
    }
}

/// A uniform grid covering the bounding box of everything in the scene.
///
/// Rebuilt from scratch every time pairs are requested, so collider additions,
/// removals and movement are picked up lazily without any bookkeeping.
///
/// Cells aren't stored individually. Instead every column and every row has a bitset
/// with a bit per collider, and the contents of a cell are the intersection
/// of its column and row. This keeps memory linear in `columns + rows`
/// instead of `columns * rows`.
#[derive(Debug)]
pub struct SpatialGrid {
    params: GridParams,
    bounds: AABB,
    spacing: f64,
    column_count: usize,
    row_count: usize,
    column_bits: BitMatrix,
    row_bits: BitMatrix,
    // timestamping used to keep track of which colliders were already checked by a query.
    last_timestamp: u32,
    timestamps: Vec<u32>,
}

impl SpatialGrid {
    /// Create a new grid. See [`GridParams`][self::GridParams] for explanation.
    pub fn new(params: GridParams) -> Self {
        Self {
            params,
            bounds: AABB::zero(),
            spacing: 1.0,
            column_count: 0,
            row_count: 0,
            column_bits: BitMatrix::default(),
            row_bits: BitMatrix::default(),
            last_timestamp: 0,
            timestamps: Vec::new(),
        }
    }

    /// Cell side length used in the last rebuild.
    #[inline]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Number of columns and rows in the last rebuild.
    #[inline]
    pub fn cell_counts(&self) -> (usize, usize) {
        (self.column_count, self.row_count)
    }

    fn rebuild(&mut self, items: &[BroadPhaseItem]) {
        let mut aabbs = items.iter().map(|it| it.aabb);
        let bounds = match aabbs.next() {
            Some(first) => aabbs.fold(first, |acc, aabb| acc.union(&aabb)),
            None => AABB::zero(),
        };

        let mut spacing = match self.params.cell_size {
            Some(size) => size,
            None => items.iter().map(|it| it.aabb.extent()).fold(0.0, f64::max),
        };
        if !(spacing > 0.0) {
            // everything is a point (or nothing exists), any size works
            spacing = 1.0;
        }
        let max_cells = self.params.max_cells_per_axis.max(1) as f64;
        let min_spacing = (bounds.width() / max_cells).max(bounds.height() / max_cells);
        if spacing < min_spacing {
            log::debug!(
                "Scene spans {:.1}x{:.1}, growing grid cells from {:.3} to {:.3}",
                bounds.width(),
                bounds.height(),
                spacing,
                min_spacing
            );
            spacing = min_spacing;
        }

        self.bounds = bounds;
        self.spacing = spacing;
        self.column_count = (bounds.width() / spacing).floor() as usize + 1;
        self.row_count = (bounds.height() / spacing).floor() as usize + 1;
        self.column_bits.reset(BitMatrixParams {
            bits_per_row: items.len(),
            row_count: self.column_count,
        });
        self.row_bits.reset(BitMatrixParams {
            bits_per_row: items.len(),
            row_count: self.row_count,
        });

        self.last_timestamp = 0;
        self.timestamps.clear();
        self.timestamps.resize(items.len(), 0);

        for (id, item) in items.iter().enumerate() {
            let (cols, rows) = self.cell_ranges(&item.aabb);
            for col in cols {
                self.column_bits.set(col, id);
            }
            for row in rows {
                self.row_bits.set(row, id);
            }
        }
    }

    fn cell_ranges(&self, aabb: &AABB) -> (RangeInclusive<usize>, RangeInclusive<usize>) {
        let to_cell = |coord: f64, origin: f64, count: usize| -> usize {
            let cell = ((coord - origin) / self.spacing).floor();
            // clamp for rounding at the far edges and for queries outside the bounds
            (cell.max(0.0) as usize).min(count.saturating_sub(1))
        };
        let cols = to_cell(aabb.min.x, self.bounds.min.x, self.column_count)
            ..=to_cell(aabb.max.x, self.bounds.min.x, self.column_count);
        let rows = to_cell(aabb.min.y, self.bounds.min.y, self.row_count)
            ..=to_cell(aabb.max.y, self.bounds.min.y, self.row_count);
        (cols, rows)
    }

    /// Every item sharing at least one cell with the given box, each at most once.
    fn test_aabb(&mut self, aabb: AABB) -> impl '_ + Iterator<Item = usize> {
        let (cols, rows) = self.cell_ranges(&aabb);

        // destructuring needed to make lifetimes work by moving the right things
        let timestamps = &mut self.timestamps;
        let column_bits = &self.column_bits;
        let row_bits = &self.row_bits;

        self.last_timestamp += 1;
        let curr_timestamp = self.last_timestamp;

        cols.flat_map(move |col| {
            rows.clone().flat_map(move |row| {
                column_bits.row(col).and(row_bits.row(row))
            })
        })
        .filter(move |&id| {
            if timestamps[id] == curr_timestamp {
                return false;
            }
            timestamps[id] = curr_timestamp;
            true
        })
    }
}

impl BroadPhase for SpatialGrid {
    fn pairs(&mut self, items: &[BroadPhaseItem], layers: &LayerMatrix) -> Vec<[usize; 2]> {
        let _span = tracy_span!("grid broad phase", "pairs");

        self.rebuild(items);
        let mut pairs = Vec::new();
        for (id, item) in items.iter().enumerate() {
            // things that don't update only get found by things that do
            if !item.update_collisions {
                continue;
            }
            let candidates: Vec<usize> = self.test_aabb(item.aabb).collect();
            for other_id in candidates {
                if other_id == id {
                    continue;
                }
                let other = &items[other_id];
                // an updating item with a lower id already found this pair
                if other.update_collisions && other_id < id {
                    continue;
                }
                if !item.may_pair_with(other, layers) {
                    continue;
                }
                // sharing a cell doesn't mean the boxes touch
                if !item.aabb.overlaps(&other.aabb) {
                    continue;
                }
                pairs.push([id.min(other_id), id.max(other_id)]);
            }
        }
        // same order as brute force, so narrow phase results don't depend on the broad phase
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math as m, physics::collision::BruteForce};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::collections::HashSet;

    fn boxed(layers: &mut LayerMatrix, min: [f64; 2], size: f64) -> BroadPhaseItem {
        BroadPhaseItem {
            aabb: AABB {
                min: m::Vec2::new(min[0], min[1]),
                max: m::Vec2::new(min[0] + size, min[1] + size),
            },
            layer: layers.intern("default"),
            update_collisions: true,
        }
    }

    fn normalized(pairs: Vec<[usize; 2]>) -> HashSet<[usize; 2]> {
        pairs
            .into_iter()
            .map(|[a, b]| if a < b { [a, b] } else { [b, a] })
            .collect()
    }

    #[test]
    fn empty_scene_has_no_pairs() {
        let layers = LayerMatrix::allow_all();
        let mut grid = SpatialGrid::new(GridParams::default());
        assert!(grid.pairs(&[], &layers).is_empty());
    }

    #[test]
    fn disjoint_pair_is_never_a_candidate() {
        let mut layers = LayerMatrix::allow_all();
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<BroadPhaseItem> = (0..150)
            .map(|_| {
                let x = rng.gen_range(0.0..500.0);
                let y = rng.gen_range(0.0..500.0);
                let size = rng.gen_range(1.0..30.0);
                boxed(&mut layers, [x, y], size)
            })
            .collect();
        // same cell-sized neighborhood but not touching
        items.push(boxed(&mut layers, [1000.0, 1000.0], 10.0));
        items.push(boxed(&mut layers, [1010.5, 1000.0], 10.0));
        let (a, b) = (items.len() - 2, items.len() - 1);

        let mut grid = SpatialGrid::new(GridParams::default());
        let pairs = normalized(grid.pairs(&items, &layers));
        assert!(!pairs.contains(&[a, b]));

        for [i, j] in &pairs {
            assert_ne!(i, j);
            assert!(items[*i].aabb.overlaps(&items[*j].aabb));
        }
    }

    #[test]
    fn grid_finds_every_overlapping_pair() {
        let mut layers = LayerMatrix::allow_all();
        let mut rng = StdRng::seed_from_u64(1234);
        let items: Vec<BroadPhaseItem> = (0..200)
            .map(|i| {
                let x = rng.gen_range(-300.0..300.0);
                let y = rng.gen_range(-300.0..300.0);
                // a few big ones to make cells coarse
                let size = if i % 50 == 0 { 120.0 } else { rng.gen_range(0.5..20.0) };
                let mut item = boxed(&mut layers, [x, y], size);
                item.update_collisions = i % 3 != 0;
                item
            })
            .collect();

        let mut grid = SpatialGrid::new(GridParams::default());
        let grid_pairs = grid.pairs(&items, &layers);
        let unique = normalized(grid_pairs.clone());
        assert_eq!(unique.len(), grid_pairs.len(), "duplicate pairs");
        assert!(grid_pairs.iter().all(|[i, j]| i < j));
        assert!(grid_pairs.windows(2).all(|w| w[0] < w[1]), "pairs not sorted");

        let expected: HashSet<[usize; 2]> = normalized(BruteForce.pairs(&items, &layers))
            .into_iter()
            .filter(|[i, j]| items[*i].aabb.overlaps(&items[*j].aabb))
            .collect();
        assert_eq!(unique, expected);
    }

    #[test]
    fn cells_grow_to_respect_limit() {
        let mut layers = LayerMatrix::allow_all();
        let items = [
            boxed(&mut layers, [0.0, 0.0], 1.0),
            boxed(&mut layers, [10_000.0, 0.0], 1.0),
        ];
        let mut grid = SpatialGrid::new(GridParams {
            cell_size: None,
            max_cells_per_axis: 100,
        });
        assert!(grid.pairs(&items, &layers).is_empty());
        let (cols, rows) = grid.cell_counts();
        assert!(cols <= 101, "{cols} columns");
        assert_eq!(rows, 1);
        assert!(grid.spacing() >= 100.0);
    }
}
