//! Cell addressing: continuous coordinates to linear cell indices.

use std::fmt;

use crate::{Axis, Bbox3, GridError, GridResult, Point3};

/// Linear index of a grid cell, `z·R² + y·R + x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub u32);

impl CellId {
    /// Index into per-cell storage.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Integer cell coordinate, each component in `0..R`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl CellCoord {
    /// Coordinate from per-axis cell indices.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Maps points to cells of an `R × R × R` partition of a bounding box.
///
/// Each axis costs one subtract, one multiply and a clamp. Points outside
/// the box land in the nearest boundary cell.
#[derive(Clone, Debug)]
pub struct CellIndexer {
    bbox: Bbox3,
    resolution: u32,
    /// Cells per world unit, per axis.
    scale: [f64; 3],
}

impl CellIndexer {
    /// Build an indexer for `resolution` cells per axis.
    pub fn new(bbox: Bbox3, resolution: u32) -> GridResult<Self> {
        if resolution == 0 {
            return Err(GridError::ZeroResolution);
        }
        bbox.validate()?;

        let cells = u64::from(resolution).pow(3);
        if cells > u64::from(u32::MAX) {
            return Err(GridError::TooManyCells { resolution });
        }

        let n = f64::from(resolution);
        let scale = Axis::ALL.map(|axis| n / bbox.extent(axis));

        Ok(Self {
            bbox,
            resolution,
            scale,
        })
    }

    /// Cells per axis.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Total cell count, `R³`.
    #[must_use]
    pub const fn num_cells(&self) -> usize {
        let r = self.resolution as usize;
        r * r * r
    }

    /// Bounding box being partitioned.
    #[must_use]
    pub const fn bbox(&self) -> &Bbox3 {
        &self.bbox
    }

    /// Clamped cell index of `value` along `axis`.
    #[inline]
    fn axis_index(&self, axis: Axis, value: f64) -> u32 {
        let scaled = ((value - self.bbox.min(axis)) * self.scale[axis as usize]).floor();
        // Float-to-int casts saturate and map NaN to 0.
        (scaled as i64).clamp(0, i64::from(self.resolution - 1)) as u32
    }

    /// Cell coordinate containing `point`, clamped to the grid.
    #[inline]
    pub fn coord_of<P: Point3>(&self, point: &P) -> CellCoord {
        CellCoord {
            x: self.axis_index(Axis::X, point.x()),
            y: self.axis_index(Axis::Y, point.y()),
            z: self.axis_index(Axis::Z, point.z()),
        }
    }

    /// Linear cell containing `point`, clamped to the grid.
    #[inline]
    pub fn cell_of<P: Point3>(&self, point: &P) -> CellId {
        self.linearize(self.coord_of(point))
    }

    /// Linear index of a coordinate.
    #[inline]
    #[must_use]
    pub const fn linearize(&self, coord: CellCoord) -> CellId {
        let r = self.resolution;
        CellId(coord.z * r * r + coord.y * r + coord.x)
    }

    /// Coordinate of a linear index.
    #[inline]
    #[must_use]
    pub const fn delinearize(&self, cell: CellId) -> CellCoord {
        let r = self.resolution;
        CellCoord {
            x: cell.0 % r,
            y: (cell.0 / r) % r,
            z: cell.0 / (r * r),
        }
    }

    /// World-space bounds covered by `cell`.
    #[must_use]
    pub fn cell_bounds(&self, cell: CellId) -> Bbox3 {
        let coord = self.delinearize(cell);
        let lo = |axis: Axis, i: u32| self.bbox.min(axis) + f64::from(i) / self.scale[axis as usize];
        Bbox3::new(
            lo(Axis::X, coord.x),
            lo(Axis::Y, coord.y),
            lo(Axis::Z, coord.z),
            lo(Axis::X, coord.x + 1),
            lo(Axis::Y, coord.y + 1),
            lo(Axis::Z, coord.z + 1),
        )
    }

    /// Cells of the cube of half-width `radius` around `center`, clamped to
    /// the grid, in ascending linear order (z, then y, then x).
    ///
    /// A `center` outside the grid is first clamped to the nearest cell.
    #[must_use]
    pub fn region(&self, center: CellCoord, radius: u32) -> Region {
        let last = self.resolution - 1;
        let center = CellCoord::new(center.x.min(last), center.y.min(last), center.z.min(last));
        let lo = |c: u32| c.saturating_sub(radius);
        let hi = |c: u32| c.saturating_add(radius).min(last);
        let min = CellCoord::new(lo(center.x), lo(center.y), lo(center.z));
        let max = CellCoord::new(hi(center.x), hi(center.y), hi(center.z));
        Region {
            resolution: self.resolution,
            min,
            max,
            next: Some(min),
        }
    }
}

/// Iterator over the cells of a clamped cube, see [`CellIndexer::region`].
#[derive(Clone, Debug)]
pub struct Region {
    resolution: u32,
    min: CellCoord,
    max: CellCoord,
    next: Option<CellCoord>,
}

impl Region {
    /// Number of cells in the clamped cube.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let span = |lo: u32, hi: u32| (hi - lo + 1) as usize;
        span(self.min.x, self.max.x) * span(self.min.y, self.max.y) * span(self.min.z, self.max.z)
    }
}

impl Iterator for Region {
    type Item = CellId;

    fn next(&mut self) -> Option<CellId> {
        let cur = self.next?;
        let r = self.resolution;

        self.next = if cur.x < self.max.x {
            Some(CellCoord { x: cur.x + 1, ..cur })
        } else if cur.y < self.max.y {
            Some(CellCoord {
                x: self.min.x,
                y: cur.y + 1,
                ..cur
            })
        } else if cur.z < self.max.z {
            Some(CellCoord {
                x: self.min.x,
                y: self.min.y,
                z: cur.z + 1,
            })
        } else {
            None
        };

        Some(CellId(cur.z * r * r + cur.y * r + cur.x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer() -> CellIndexer {
        CellIndexer::new(Bbox3::cube(0.0, 10.0), 10).unwrap()
    }

    #[test]
    fn test_cell_of_point() {
        let idx = indexer();
        assert_eq!(idx.coord_of(&[5.5, 5.5, 5.5]), CellCoord::new(5, 5, 5));
        assert_eq!(idx.cell_of(&[5.5, 5.5, 5.5]), CellId(555));
        assert_eq!(idx.cell_of(&[0.0, 0.0, 0.0]), CellId(0));
        assert_eq!(idx.cell_of(&[1.0, 0.0, 0.0]), CellId(1));
        assert_eq!(idx.cell_of(&[0.0, 1.0, 0.0]), CellId(10));
        assert_eq!(idx.cell_of(&[0.0, 0.0, 1.0]), CellId(100));
    }

    #[test]
    fn test_out_of_box_clamps_to_boundary() {
        let idx = indexer();
        let near = idx.cell_of(&[-0.1, 5.5, 5.5]);
        let far = idx.cell_of(&[-1.0e9, 5.5, 5.5]);
        assert_eq!(near, far);
        assert_eq!(idx.coord_of(&[-0.1, 5.5, 5.5]).x, 0);

        // Upper face is closed: the max bound maps into the last cell.
        assert_eq!(idx.coord_of(&[10.0, 10.0, 10.0]), CellCoord::new(9, 9, 9));
        assert_eq!(idx.cell_of(&[10.5, 5.5, 5.5]), idx.cell_of(&[1.0e12, 5.5, 5.5]));

        assert_eq!(idx.coord_of(&[f64::NAN, 5.5, 5.5]).x, 0);
    }

    #[test]
    fn test_linearize_roundtrip() {
        let idx = CellIndexer::new(Bbox3::new(-1.0, 0.0, 2.0, 1.0, 3.0, 9.0), 7).unwrap();
        for i in 0..idx.num_cells() as u32 {
            assert_eq!(idx.linearize(idx.delinearize(CellId(i))), CellId(i));
        }
    }

    #[test]
    fn test_cell_bounds_contain_cell_center() {
        let idx = CellIndexer::new(Bbox3::new(-2.0, 0.0, 5.0, 2.0, 8.0, 6.0), 4).unwrap();
        let cell = idx.linearize(CellCoord::new(1, 2, 3));
        let b = idx.cell_bounds(cell);
        let center = [
            (b.xmin + b.xmax) / 2.0,
            (b.ymin + b.ymax) / 2.0,
            (b.zmin + b.zmax) / 2.0,
        ];
        assert_eq!(idx.cell_of(&center), cell);
        assert!((b.xmax - b.xmin - 1.0).abs() < 1e-12);
        assert!((b.ymax - b.ymin - 2.0).abs() < 1e-12);
        assert!((b.zmax - b.zmin - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            CellIndexer::new(Bbox3::cube(0.0, 1.0), 0).unwrap_err(),
            GridError::ZeroResolution
        );
        assert_eq!(
            CellIndexer::new(Bbox3::cube(0.0, 1.0), 2000).unwrap_err(),
            GridError::TooManyCells { resolution: 2000 }
        );
        assert!(CellIndexer::new(Bbox3::cube(1.0, 1.0), 4).is_err());
        assert!(CellIndexer::new(Bbox3::cube(0.0, 1.0), 1625).is_ok());
    }

    #[test]
    fn test_region_interior_scan_order() {
        let idx = indexer();
        let cells: Vec<_> = idx.region(CellCoord::new(5, 5, 5), 1).collect();
        assert_eq!(cells.len(), 27);
        assert!(cells.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(cells.first(), Some(&idx.linearize(CellCoord::new(4, 4, 4))));
        assert_eq!(cells.last(), Some(&idx.linearize(CellCoord::new(6, 6, 6))));
    }

    #[test]
    fn test_region_clamped_at_corner() {
        let idx = indexer();
        let region = idx.region(CellCoord::new(0, 0, 0), 2);
        assert_eq!(region.cell_count(), 27);
        let cells: Vec<_> = region.collect();
        assert_eq!(cells.len(), 27);
        assert_eq!(cells[0], CellId(0));

        let far = idx.region(CellCoord::new(9, 9, 9), 3);
        assert_eq!(far.cell_count(), 64);
        assert_eq!(far.last(), Some(CellId(999)));
    }

    #[test]
    fn test_region_center_outside_grid_is_clamped() {
        let idx = indexer();
        let region = idx.region(CellCoord::new(50, 3, u32::MAX), 1);
        assert_eq!(region.cell_count(), 2 * 3 * 2);

        let cells: Vec<_> = region.collect();
        assert_eq!(cells.len(), 12);
        assert!(cells.iter().all(|cell| cell.index() < idx.num_cells()));
        assert_eq!(cells.first(), Some(&idx.linearize(CellCoord::new(8, 2, 8))));
        assert_eq!(cells.last(), Some(&idx.linearize(CellCoord::new(9, 4, 9))));

        let single: Vec<_> = idx.region(CellCoord::new(10, 10, 10), 0).collect();
        assert_eq!(single, vec![CellId(999)]);
    }

    #[test]
    fn test_region_radius_covers_whole_grid() {
        let idx = CellIndexer::new(Bbox3::cube(0.0, 1.0), 3).unwrap();
        let cells: Vec<_> = idx.region(CellCoord::new(1, 1, 1), u32::MAX).collect();
        assert_eq!(cells, (0..27).map(CellId).collect::<Vec<_>>());
    }
}
