use std::convert::Infallible;

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Coord2D, CoordGeo};
use crate::sample::Located;

// --------------------------------------------------------------------------
// Projection

pub trait Projection<From, To> {
    fn project(&self, input: &From) -> To;
}

/// Lazily projects every point of `points`.
pub fn project<'a, A, B, I, P>(proj: &'a P, points: I) -> impl Iterator<Item = B> + 'a
where
    I: Iterator<Item = A> + 'a,
    P: Projection<A, B> + 'a,
{
    points.map(move |point| proj.project(&point))
}

/// Maps a point to its fractional position inside a box: (0, 0) at the
/// south-west corner, (1, 1) at the north-east corner. Points outside the
/// box land outside the unit square.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FractionalProjection {
    bbox: BoundingBox,
}

impl FractionalProjection {
    pub fn new(bbox: BoundingBox) -> Self {
        Self { bbox }
    }
}

impl Projection<CoordGeo, Coord2D> for FractionalProjection {
    fn project(&self, input: &CoordGeo) -> Coord2D {
        Coord2D {
            x: (input.longitude - self.bbox.left()) / self.bbox.degree_width(),
            y: (input.latitude - self.bbox.bottom()) / self.bbox.degree_height(),
        }
    }
}

// --------------------------------------------------------------------------
// Point sinks

/// Receives projected points, e.g. to draw them onto a raster. The item the
/// point was projected from is passed along so the sink can style it.
pub trait PointSink<T: ?Sized> {
    type Error;

    fn plot(&mut self, point: Coord2D, item: &T) -> std::result::Result<(), Self::Error>;
}

impl<T: ?Sized> PointSink<T> for Vec<Coord2D> {
    type Error = Infallible;

    fn plot(&mut self, point: Coord2D, _item: &T) -> std::result::Result<(), Infallible> {
        self.push(point);
        Ok(())
    }
}

// --------------------------------------------------------------------------
// SampleProjector

/// Maps geographic samples onto a raster whose height is chosen so the
/// raster keeps the real-world proportions of the envelope.
///
/// Raster row 0 is the top edge, so latitude is flipped: the envelope's
/// south-west corner lands on `(0, height)` and its north-east corner on
/// `(width, 0)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SampleProjector {
    fractional: FractionalProjection,
    width: u32,
    height: u32,
}

impl SampleProjector {
    pub fn new(envelope: BoundingBox, width: u32) -> Result<Self> {
        if width == 0 {
            return Err(Error::DegenerateRaster { width, height: 0 });
        }
        let aspect = envelope.projection_aspect()?;
        let height = (width as f64 / aspect).floor();
        if height < 1.0 || height > u32::MAX as f64 {
            return Err(Error::DegenerateRaster {
                width,
                height: height as u32,
            });
        }
        Ok(Self {
            fractional: FractionalProjection::new(envelope),
            width,
            height: height as u32,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn fractional(&self, point: &CoordGeo) -> Coord2D {
        self.fractional.project(point)
    }

    /// Projects every item and hands the pixel position to `sink`, stopping
    /// at the first sink error.
    pub fn plot<'a, T, I, S>(&self, items: I, sink: &mut S) -> std::result::Result<usize, S::Error>
    where
        T: Located + 'a,
        I: IntoIterator<Item = &'a T>,
        S: PointSink<T>,
    {
        let mut plotted = 0;
        for item in items {
            sink.plot(self.project(&item.location()), item)?;
            plotted += 1;
        }
        Ok(plotted)
    }
}

impl Projection<CoordGeo, Coord2D> for SampleProjector {
    fn project(&self, input: &CoordGeo) -> Coord2D {
        let Coord2D { x: fx, y: fy } = self.fractional.project(input);
        let width = self.width as f64;
        let height = self.height as f64;
        Coord2D {
            x: fx * width,
            y: height - fy * height,
        }
    }
}
