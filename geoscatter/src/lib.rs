//! Geodesy helpers for plotting geocoded samples.
//!
//! Distances are great-circle distances on a sphere of radius
//! [`EARTH_RADIUS_M`]. A bounding box's real-world aspect ratio (meters wide
//! per meter high, measured along its center lines) drives both consumers:
//! [`GeoGrid`] picks a row count so cells come out close to square, and
//! [`SampleProjector`] picks a raster height so plots are not stretched.

mod dataset;
mod envelope;
mod error;
mod geometry;
mod grid;
mod projection;
mod sample;

pub use dataset::Dataset;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use geometry::{
    distance_on_sphere, ok_projection_aspect, spherical_distance, BoundingBox, Coord2D, CoordGeo,
    EARTH_RADIUS_M,
};
pub use grid::{CellBounds, CellLocation, CellRecord, Cells, GeoGrid, GeoGridCell};
pub use projection::{project, FractionalProjection, PointSink, Projection, SampleProjector};
pub use sample::{dominant_index, Category, CategoryTable, Located, Sample};
