use std::iter::FusedIterator;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, CoordGeo};

// --------------------------------------------------------------------------
// GeoGridCell

/// One rectangle of a [`GeoGrid`], with its zero-based lattice position.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(into = "CellRecord")]
pub struct GeoGridCell {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub row: usize,
    pub column: usize,
}

impl GeoGridCell {
    pub fn center(&self) -> CoordGeo {
        CoordGeo {
            latitude: (self.top + self.bottom) / 2.0,
            longitude: (self.left + self.right) / 2.0,
        }
    }

    pub fn contains(&self, point: &CoordGeo) -> bool {
        (self.left..=self.right).contains(&point.longitude)
            && (self.bottom..=self.top).contains(&point.latitude)
    }

    pub fn to_record(&self) -> CellRecord {
        CellRecord::from(*self)
    }
}

/// Interchange shape of a cell: `{"bounds": {...}, "location": {...}}`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CellRecord {
    pub bounds: CellBounds,
    pub location: CellLocation,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CellBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CellLocation {
    pub row: usize,
    pub column: usize,
}

impl From<GeoGridCell> for CellRecord {
    fn from(cell: GeoGridCell) -> Self {
        CellRecord {
            bounds: CellBounds {
                left: cell.left,
                right: cell.right,
                top: cell.top,
                bottom: cell.bottom,
            },
            location: CellLocation {
                row: cell.row,
                column: cell.column,
            },
        }
    }
}

// --------------------------------------------------------------------------
// GeoGrid

/// Partition of a bounding box into `rows x columns` cells that are close
/// to square in meters.
///
/// The column count is chosen by the caller; the row count follows from the
/// box's real-world proportions, so a box that is wider in degrees than it
/// is tall may still get more rows than columns.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoGrid {
    bbox: BoundingBox,
    columns: usize,
    rows: usize,
    meter_width: f64,
    meter_height: f64,
}

impl GeoGrid {
    /// Fails with [`Error::DegenerateGrid`] if `columns` is zero or the box
    /// is so flat that no full row fits, and with [`Error::GridTooLarge`] if
    /// the cell count does not fit in a `usize`.
    pub fn new(bbox: BoundingBox, columns: usize) -> Result<Self> {
        if columns == 0 {
            return Err(Error::DegenerateGrid { columns, rows: 0 });
        }
        // Validates that both meter extents are positive.
        bbox.projection_aspect()?;
        let (meter_width, meter_height) = bbox.meter_extent()?;

        let rows = (columns as f64 * meter_height / meter_width).floor() as usize;
        if rows == 0 {
            return Err(Error::DegenerateGrid { columns, rows });
        }
        // Cell indices are `usize`, so the cell count must be too.
        if rows.checked_mul(columns).is_none() {
            return Err(Error::GridTooLarge { columns, rows });
        }

        Ok(Self {
            bbox,
            columns,
            rows,
            meter_width,
            meter_height,
        })
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows * self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn aspect(&self) -> f64 {
        self.meter_width / self.meter_height
    }

    pub fn cell_degree_width(&self) -> f64 {
        self.bbox.degree_width() / self.columns as f64
    }

    pub fn cell_degree_height(&self) -> f64 {
        self.bbox.degree_height() / self.rows as f64
    }

    /// Approximate cell size in meters, measured along the box's center
    /// lines.
    pub fn cell_meter_size(&self) -> (f64, f64) {
        (
            self.meter_width / self.columns as f64,
            self.meter_height / self.rows as f64,
        )
    }

    // Both neighbours of a lattice line compute it the same way, and the
    // outermost lines are the box edges themselves.
    fn column_edge(&self, column: usize) -> f64 {
        if column == self.columns {
            self.bbox.right()
        } else {
            self.bbox.left() + self.cell_degree_width() * column as f64
        }
    }

    fn row_edge(&self, row: usize) -> f64 {
        if row == self.rows {
            self.bbox.top()
        } else {
            self.bbox.bottom() + self.cell_degree_height() * row as f64
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<GeoGridCell> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        Some(GeoGridCell {
            left: self.column_edge(column),
            right: self.column_edge(column + 1),
            bottom: self.row_edge(row),
            top: self.row_edge(row + 1),
            row,
            column,
        })
    }

    /// Lazily enumerates every cell, all rows of column 0 first. Each call
    /// starts over and yields the same sequence.
    pub fn cells(&self) -> Cells<'_> {
        Cells {
            grid: self,
            front: 0,
            back: self.len(),
        }
    }

    /// `(row, column)` of the cell containing `point`. Points on the box's
    /// right or top edge belong to the last column or row.
    pub fn locate(&self, point: &CoordGeo) -> Option<(usize, usize)> {
        if !self.bbox.contains(point) {
            return None;
        }
        let fx = (point.longitude - self.bbox.left()) / self.bbox.degree_width();
        let fy = (point.latitude - self.bbox.bottom()) / self.bbox.degree_height();
        let column = ((fx * self.columns as f64).floor() as usize).min(self.columns - 1);
        let row = ((fy * self.rows as f64).floor() as usize).min(self.rows - 1);
        Some((row, column))
    }
}

impl<'a> IntoIterator for &'a GeoGrid {
    type Item = GeoGridCell;
    type IntoIter = Cells<'a>;

    fn into_iter(self) -> Cells<'a> {
        self.cells()
    }
}

/// Iterator over the cells of a [`GeoGrid`], see [`GeoGrid::cells`].
#[derive(Clone, Debug)]
pub struct Cells<'a> {
    grid: &'a GeoGrid,
    front: usize,
    back: usize,
}

impl Cells<'_> {
    fn cell_at(&self, index: usize) -> Option<GeoGridCell> {
        let rows = self.grid.rows;
        self.grid.cell(index % rows, index / rows)
    }
}

impl Iterator for Cells<'_> {
    type Item = GeoGridCell;

    fn next(&mut self) -> Option<GeoGridCell> {
        if self.front >= self.back {
            return None;
        }
        let cell = self.cell_at(self.front);
        self.front += 1;
        cell
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Cells<'_> {
    fn next_back(&mut self) -> Option<GeoGridCell> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.cell_at(self.back)
    }
}

impl ExactSizeIterator for Cells<'_> {}

impl FusedIterator for Cells<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn nyc() -> GeoGrid {
        let bbox = BoundingBox::new(-74.034805, -73.891296, 40.800296, 40.66866).unwrap();
        GeoGrid::new(bbox, 5).unwrap()
    }

    #[test]
    fn nyc_rows_follow_from_the_aspect() {
        let grid = nyc();
        assert_eq!(grid.columns(), 5);
        assert_eq!(grid.rows(), 6);
        assert!((grid.aspect() - 0.826_086_7).abs() < 1e-6);
    }

    #[test]
    fn enumerates_every_cell_exactly_once() {
        let grid = nyc();
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), grid.columns() * grid.rows());
        assert_eq!(grid.cells().len(), cells.len());

        let mut seen = vec![false; cells.len()];
        for cell in &cells {
            let idx = cell.column * grid.rows() + cell.row;
            assert!(!seen[idx], "cell ({}, {}) repeated", cell.row, cell.column);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn column_major_order() {
        let grid = nyc();
        let order: Vec<_> = grid.cells().take(7).map(|c| (c.row, c.column)).collect();
        assert_eq!(
            order,
            vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0), (0, 1)]
        );
    }

    #[test]
    fn cells_tile_the_box_without_gaps() {
        let grid = nyc();
        let bbox = *grid.bounding_box();
        for cell in grid.cells() {
            assert!(cell.left < cell.right);
            assert!(cell.bottom < cell.top);
            if let Some(east) = grid.cell(cell.row, cell.column + 1) {
                assert_eq!(cell.right, east.left);
            } else {
                assert_eq!(cell.right, bbox.right());
            }
            if let Some(north) = grid.cell(cell.row + 1, cell.column) {
                assert_eq!(cell.top, north.bottom);
            } else {
                assert_eq!(cell.top, bbox.top());
            }
            if cell.column == 0 {
                assert_eq!(cell.left, bbox.left());
            }
            if cell.row == 0 {
                assert_eq!(cell.bottom, bbox.bottom());
            }
        }

        let degree_area: f64 = grid
            .cells()
            .map(|c| (c.right - c.left) * (c.top - c.bottom))
            .sum();
        let expected = bbox.degree_width() * bbox.degree_height();
        assert!((degree_area - expected).abs() < 1e-12);
    }

    #[test]
    fn cells_are_roughly_square_in_meters() {
        let grid = nyc();
        let (w, h) = grid.cell_meter_size();
        assert!(w / h > 0.8 && w / h < 1.2, "cell is {} x {} m", w, h);
    }

    #[test]
    fn re_enumeration_is_identical() {
        let grid = nyc();
        let first: Vec<_> = grid.cells().collect();
        let second: Vec<_> = grid.cells().collect();
        assert_eq!(first, second);
        let reversed: Vec<_> = grid.cells().rev().collect();
        assert_eq!(reversed.first(), first.last());
    }

    #[test]
    fn zero_columns_is_degenerate() {
        let bbox = BoundingBox::new(0.0, 1.0, 1.0, 0.0).unwrap();
        assert_eq!(
            GeoGrid::new(bbox, 0),
            Err(Error::DegenerateGrid { columns: 0, rows: 0 })
        );
    }

    #[test]
    fn flat_box_with_few_columns_is_degenerate() {
        let bbox = BoundingBox::new(0.0, 10.0, 0.5, 0.0).unwrap();
        assert_eq!(
            GeoGrid::new(bbox, 1),
            Err(Error::DegenerateGrid { columns: 1, rows: 0 })
        );
        assert_eq!(GeoGrid::new(bbox, 40).unwrap().rows(), 2);
    }

    #[test]
    fn cell_count_overflow_is_rejected() {
        let bbox = BoundingBox::new(0.0, 1.0, 1.0, 0.0).unwrap();
        let columns = usize::MAX / 2;
        assert!(matches!(
            GeoGrid::new(bbox, columns),
            Err(Error::GridTooLarge { columns: c, .. }) if c == columns
        ));
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            GeoGrid::new(bbox, 1 << 40),
            Err(Error::GridTooLarge { .. })
        ));
    }

    #[test]
    fn locate_matches_cell_bounds() {
        let grid = nyc();
        for cell in grid.cells() {
            assert_eq!(grid.locate(&cell.center()), Some((cell.row, cell.column)));
        }
        let bbox = grid.bounding_box();
        let corner = CoordGeo::new(bbox.top(), bbox.right());
        assert_eq!(grid.locate(&corner), Some((grid.rows() - 1, grid.columns() - 1)));
        assert_eq!(grid.locate(&CoordGeo::new(0.0, 0.0)), None);
    }

    #[test]
    fn cell_serializes_as_bounds_and_location() {
        let grid = nyc();
        let cell = grid.cell(2, 3).unwrap();
        let value = serde_json::to_value(cell).unwrap();
        assert_eq!(value["location"]["row"], 2);
        assert_eq!(value["location"]["column"], 3);
        assert_eq!(value["bounds"]["left"], cell.left);
        assert_eq!(value["bounds"]["top"], cell.top);
    }

    #[test]
    fn center_is_the_midpoint() {
        let cell = GeoGridCell {
            left: 0.0,
            right: 2.0,
            top: 4.0,
            bottom: 2.0,
            row: 0,
            column: 0,
        };
        assert_eq!(cell.center(), CoordGeo::new(3.0, 1.0));
    }
}
