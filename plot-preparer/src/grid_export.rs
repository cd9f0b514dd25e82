use std::io::{self, Write};

use geoscatter::{CellRecord, Dataset, GeoGrid};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct CellOutput {
    #[serde(flatten)]
    record: CellRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<usize>,
}

/// Number of samples in each cell, indexed in enumeration order
/// (`column * rows + row`).
pub fn count_samples(grid: &GeoGrid, dataset: &Dataset) -> Vec<usize> {
    let mut counts = vec![0; grid.len()];
    let mut outside = 0;
    for sample in dataset.samples() {
        match grid.locate(&sample.location()) {
            Some((row, column)) => counts[column * grid.rows() + row] += 1,
            None => outside += 1,
        }
    }
    if outside > 0 {
        debug!("{} samples lie outside the grid", outside);
    }
    counts
}

/// Writes one JSON object per line and cell: `{"bounds": ..., "location": ...}`,
/// plus `"samples"` when per-cell counts are given.
pub fn write_cells<W: Write>(grid: &GeoGrid, counts: Option<&[usize]>, mut out: W) -> io::Result<usize> {
    let mut written = 0;
    for (index, cell) in grid.cells().enumerate() {
        let output = CellOutput {
            record: cell.to_record(),
            samples: counts.and_then(|c| c.get(index).copied()),
        };
        serde_json::to_writer(&mut out, &output)?;
        writeln!(out)?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// Writes each cell's center as `latitude,longitude`, one per line.
pub fn write_centers<W: Write>(grid: &GeoGrid, mut out: W) -> io::Result<usize> {
    let mut written = 0;
    for cell in grid {
        let center = cell.center();
        writeln!(out, "{},{}", center.latitude, center.longitude)?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}
