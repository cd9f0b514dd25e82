use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, CoordGeo};

/// Tightest latitude/longitude extent of a set of points, folded in one
/// point at a time.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    extent: Option<Extent>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Extent {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, point: &CoordGeo) {
        self.extent = Some(match self.extent {
            None => Extent {
                min_lat: point.latitude,
                max_lat: point.latitude,
                min_lng: point.longitude,
                max_lng: point.longitude,
            },
            Some(e) => Extent {
                min_lat: e.min_lat.min(point.latitude),
                max_lat: e.max_lat.max(point.latitude),
                min_lng: e.min_lng.min(point.longitude),
                max_lng: e.max_lng.max(point.longitude),
            },
        });
    }

    pub fn is_empty(&self) -> bool {
        self.extent.is_none()
    }

    pub fn min_lat(&self) -> Option<f64> {
        self.extent.map(|e| e.min_lat)
    }

    pub fn max_lat(&self) -> Option<f64> {
        self.extent.map(|e| e.max_lat)
    }

    pub fn min_lng(&self) -> Option<f64> {
        self.extent.map(|e| e.min_lng)
    }

    pub fn max_lng(&self) -> Option<f64> {
        self.extent.map(|e| e.max_lng)
    }

    /// The envelope as a bounding box. Fails when no point has been folded
    /// in, or when all points share a latitude or a longitude.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        match self.extent {
            Some(e) => BoundingBox::new(e.min_lng, e.max_lng, e.max_lat, e.min_lat),
            None => Err(Error::InvalidBoundingBox {
                left: f64::NAN,
                right: f64::NAN,
                top: f64::NAN,
                bottom: f64::NAN,
                reason: "envelope of an empty point set",
            }),
        }
    }
}

impl Extend<CoordGeo> for Envelope {
    fn extend<I: IntoIterator<Item = CoordGeo>>(&mut self, iter: I) {
        for point in iter {
            self.include(&point);
        }
    }
}

impl FromIterator<CoordGeo> for Envelope {
    fn from_iter<I: IntoIterator<Item = CoordGeo>>(iter: I) -> Self {
        let mut envelope = Envelope::new();
        envelope.extend(iter);
        envelope
    }
}
