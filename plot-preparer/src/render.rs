use std::path::Path;

use geoscatter::{Coord2D, Dataset, PointSink, Sample, SampleProjector};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, warn};

/// Colour used for samples that have no dominant category.
const NO_CATEGORY: RGBColor = RGBColor(128, 128, 128);

/// Point colouring schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Mono,      // every point white
    Jet,       // Blue -> Cyan -> Green -> Yellow -> Red
    Viridis,   // Purple -> Blue -> Green -> Yellow
    Turbo,     // Blue -> Cyan -> Green -> Yellow -> Orange -> Red
}

impl Colormap {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mono" => Some(Colormap::Mono),
            "jet" => Some(Colormap::Jet),
            "viridis" => Some(Colormap::Viridis),
            "turbo" => Some(Colormap::Turbo),
            _ => None,
        }
    }

    /// Colour at `value` along the map, clamped to [0, 1].
    pub fn map(&self, value: f64) -> (u8, u8, u8) {
        let stops = match self {
            Colormap::Mono => return (255, 255, 255),
            Colormap::Jet => JET,
            Colormap::Viridis => VIRIDIS,
            Colormap::Turbo => TURBO,
        };
        interpolate(stops, value.clamp(0.0, 1.0))
    }

    /// Colour of a sample whose dominant category is `category`, spreading
    /// the `n_categories` categories evenly over the colormap.
    pub fn category_color(&self, category: Option<usize>, n_categories: usize) -> RGBColor {
        if *self == Colormap::Mono {
            return WHITE;
        }
        let Some(category) = category else {
            return NO_CATEGORY;
        };
        let value = if n_categories <= 1 {
            0.5
        } else {
            category as f64 / (n_categories - 1) as f64
        };
        let (r, g, b) = self.map(value);
        RGBColor(r, g, b)
    }
}

// (position, colour) stops, positions ascending from 0.0 to 1.0.
type Stops = &'static [(f64, [u8; 3])];

const JET: Stops = &[
    (0.0, [0, 0, 128]),
    (0.125, [0, 0, 255]),
    (0.375, [0, 255, 255]),
    (0.625, [255, 255, 0]),
    (0.875, [255, 0, 0]),
    (1.0, [128, 0, 0]),
];

const VIRIDIS: Stops = &[
    (0.0, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.5, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.0, [253, 231, 37]),
];

const TURBO: Stops = &[
    (0.0, [48, 18, 59]),
    (0.2, [70, 134, 251]),
    (0.4, [27, 207, 212]),
    (0.6, [97, 252, 108]),
    (0.8, [254, 155, 45]),
    (1.0, [122, 4, 3]),
];

/// Piecewise-linear interpolation between the two stops around `v`.
fn interpolate(stops: Stops, v: f64) -> (u8, u8, u8) {
    let upper = stops
        .iter()
        .position(|(at, _)| *at >= v)
        .unwrap_or(stops.len() - 1);
    if upper == 0 {
        let [r, g, b] = stops[0].1;
        return (r, g, b);
    }
    let (a, from) = stops[upper - 1];
    let (b, to) = stops[upper];
    let t = (v - a) / (b - a);
    let channel = |i: usize| (from[i] as f64 + t * (to[i] as f64 - from[i] as f64)).round() as u8;
    (channel(0), channel(1), channel(2))
}

/// Pixel containing `point` on a `width` x `height` raster. The far edges
/// (`x == width`, `y == height`) are pulled onto the last column/row so
/// samples on the envelope's boundary stay visible; anything further out is
/// dropped, as is everything on a raster too large for `i32` pixel
/// coordinates.
pub fn pixel_of(point: Coord2D, width: u32, height: u32) -> Option<(i32, i32)> {
    if !point.x.is_finite() || !point.y.is_finite() || width == 0 || height == 0 {
        return None;
    }
    if point.x < 0.0 || point.x > width as f64 || point.y < 0.0 || point.y > height as f64 {
        return None;
    }
    let last_x = i32::try_from(width).ok()? - 1;
    let last_y = i32::try_from(height).ok()? - 1;
    let x = (point.x.floor() as i32).min(last_x);
    let y = (point.y.floor() as i32).min(last_y);
    Some((x, y))
}

// --------------------------------------------------------------------------
// Raster sink

struct RasterSink<'a, DB: DrawingBackend> {
    area: &'a DrawingArea<DB, Shift>,
    width: u32,
    height: u32,
    colormap: Colormap,
    n_categories: usize,
    dropped: usize,
}

impl<DB: DrawingBackend> PointSink<Sample> for RasterSink<'_, DB> {
    type Error = DrawingAreaErrorKind<DB::ErrorType>;

    fn plot(&mut self, point: Coord2D, sample: &Sample) -> Result<(), Self::Error> {
        match pixel_of(point, self.width, self.height) {
            Some(pixel) => {
                let color = self
                    .colormap
                    .category_color(sample.dominant_category(), self.n_categories);
                self.area.draw_pixel(pixel, &color)
            }
            None => {
                self.dropped += 1;
                Ok(())
            }
        }
    }
}

/// Plot every sample of `dataset` as a single pixel onto `area`. Returns the
/// number of pixels drawn.
pub fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    projector: &SampleProjector,
    colormap: Colormap,
) -> Result<usize, DrawingAreaErrorKind<DB::ErrorType>> {
    let (width, height) = projector.dimensions();
    let mut sink = RasterSink {
        area,
        width,
        height,
        colormap,
        n_categories: dataset.categories().len(),
        dropped: 0,
    };
    let plotted = projector.plot(dataset.samples(), &mut sink)?;
    if sink.dropped > 0 {
        warn!("{} samples fell outside the {}x{} raster", sink.dropped, width, height);
    }
    Ok(plotted - sink.dropped)
}

/// Render the scatter plot on a black background and save it; the image
/// format follows the file extension.
pub fn save_scatter_to_image(
    dataset: &Dataset,
    projector: &SampleProjector,
    output_path: &Path,
    colormap: Colormap,
) -> Result<usize, Box<dyn std::error::Error>> {
    debug!("Rendering {}x{} raster", projector.width(), projector.height());
    let root = BitMapBackend::new(output_path, projector.dimensions()).into_drawing_area();
    root.fill(&BLACK)?;
    let drawn = draw_scatter(&root, dataset, projector, colormap)?;
    root.present()?;
    Ok(drawn)
}
