use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Radius of the spherical Earth model, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

// --------------------------------------------------------------------------
// CoordGeo

/// A point on the globe in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordGeo {
    pub latitude: f64,
    pub longitude: f64,
}

impl CoordGeo {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Checks that the latitude lies in [-90, 90] and both values are finite.
    pub fn validate(&self) -> Result<()> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        if lat_ok && self.longitude.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl fmt::Display for CoordGeo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ latitude: {}, longitude: {} }}", self.latitude, self.longitude)
    }
}

// --------------------------------------------------------------------------
// Coord2D

/// A point on the output plane; x grows rightwards, y grows downwards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coord2D {
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for Coord2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ x: {}, y: {} }}", self.x, self.y)
    }
}

// --------------------------------------------------------------------------
// Great-circle distance

/// Great-circle distance in meters between two points, using the spherical
/// law of cosines on a sphere of radius [`EARTH_RADIUS_M`].
pub fn distance_on_sphere(a: &CoordGeo, b: &CoordGeo) -> Result<f64> {
    a.validate()?;
    b.validate()?;
    // The law of cosines is badly conditioned at zero separation.
    if a == b {
        return Ok(0.0);
    }

    // Spherical coordinates on the unit sphere: phi is the colatitude,
    // theta the azimuth.
    let phi1 = (90.0 - a.latitude).to_radians();
    let phi2 = (90.0 - b.latitude).to_radians();
    let theta1 = a.longitude.to_radians();
    let theta2 = b.longitude.to_radians();

    let cos = f64::sin(phi1) * f64::sin(phi2) * f64::cos(theta1 - theta2)
        + f64::cos(phi1) * f64::cos(phi2);
    // Rounding can push the argument just past +-1 for nearly identical or
    // antipodal points.
    let arc = cos.clamp(-1.0, 1.0).acos();

    Ok(arc * EARTH_RADIUS_M)
}

/// Same as [`distance_on_sphere`], taking raw degree values.
pub fn spherical_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Result<f64> {
    distance_on_sphere(&CoordGeo::new(lat1, lng1), &CoordGeo::new(lat2, lng2))
}

// --------------------------------------------------------------------------
// BoundingBox

/// Axis-aligned box in latitude/longitude space.
///
/// `left < right` and `bottom < top` always hold; the box cannot be built
/// otherwise. Serializes as a plain `{left, right, top, bottom}` record.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl BoundingBox {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Result<Self> {
        let invalid = |reason| Error::InvalidBoundingBox {
            left,
            right,
            top,
            bottom,
            reason,
        };
        if ![left, right, top, bottom].iter().all(|v| v.is_finite()) {
            return Err(invalid("bounds must be finite"));
        }
        if right <= left {
            return Err(invalid("width must be positive"));
        }
        if top <= bottom {
            return Err(invalid("height must be positive"));
        }
        if bottom < -90.0 || top > 90.0 {
            return Err(invalid("latitudes must lie in [-90, 90]"));
        }
        Ok(Self { left, right, top, bottom })
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn degree_width(&self) -> f64 {
        self.right - self.left
    }

    pub fn degree_height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn center(&self) -> CoordGeo {
        CoordGeo {
            latitude: self.bottom + self.degree_height() / 2.0,
            longitude: self.left + self.degree_width() / 2.0,
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, point: &CoordGeo) -> bool {
        (self.left..=self.right).contains(&point.longitude)
            && (self.bottom..=self.top).contains(&point.latitude)
    }

    /// Width along the middle latitude and height along the middle
    /// longitude, both in meters.
    pub fn meter_extent(&self) -> Result<(f64, f64)> {
        let center = self.center();
        let meter_width = spherical_distance(center.latitude, self.left, center.latitude, self.right)?;
        let meter_height = spherical_distance(self.bottom, center.longitude, self.top, center.longitude)?;
        Ok((meter_width, meter_height))
    }

    /// Ratio of the box's real-world width to its height.
    ///
    /// A degree of longitude shrinks towards the poles while a degree of
    /// latitude does not, so this differs from the ratio of degree spans.
    pub fn projection_aspect(&self) -> Result<f64> {
        let (meter_width, meter_height) = self.meter_extent()?;
        let aspect = meter_width / meter_height;
        if meter_width > 0.0 && meter_height > 0.0 && aspect.is_finite() {
            Ok(aspect)
        } else {
            Err(Error::InvalidBoundingBox {
                left: self.left,
                right: self.right,
                top: self.top,
                bottom: self.bottom,
                reason: "box has no extent in meters",
            })
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ left: {}, right: {}, top: {}, bottom: {} }}",
            self.left, self.right, self.top, self.bottom
        )
    }
}

/// Aspect ratio (meters wide per meter high) of the box given in degrees.
pub fn ok_projection_aspect(left: f64, right: f64, top: f64, bottom: f64) -> Result<f64> {
    BoundingBox::new(left, right, top, bottom)?.projection_aspect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE_M: f64 = 1e-6;

    #[test]
    fn distance_to_self_is_zero() {
        let points = [
            CoordGeo::new(40.7128, -74.0060),
            CoordGeo::new(0.0, 0.0),
            CoordGeo::new(89.9, 10.0),
            CoordGeo::new(-33.8688, 151.2093),
            CoordGeo::new(-90.0, 0.0),
        ];
        for p in points {
            let d = distance_on_sphere(&p, &p).unwrap();
            assert!(d.abs() < TOLERANCE_M, "{} -> {}", p, d);
        }
    }

    #[test]
    fn nearly_identical_points_do_not_produce_nan() {
        let a = CoordGeo::new(40.800296, -74.034805);
        let b = CoordGeo::new(40.800296, -74.034805 + 1e-12);
        let d = distance_on_sphere(&a, &b).unwrap();
        assert!(d.is_finite());
        assert!(d >= 0.0);
    }

    #[test]
    fn cosine_past_one_is_clamped() {
        // Near the south pole these separations round the cosine above 1.
        let cases = [(-88.733, 1e-9), (-87.843, 1e-12), (-84.906, 1e-9)];
        for (lat, d) in cases {
            let meters = spherical_distance(lat, 10.0, lat + d, 10.0).unwrap();
            assert!(meters.is_finite(), "lat={} d={} -> {}", lat, d, meters);
            assert!(meters >= 0.0);
            assert!(meters < 1.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (CoordGeo::new(40.66866, -74.034805), CoordGeo::new(40.800296, -73.891296)),
            (CoordGeo::new(-12.5, 170.0), CoordGeo::new(33.0, -150.25)),
            (CoordGeo::new(89.0, 0.0), CoordGeo::new(-89.0, 180.0)),
        ];
        for (a, b) in pairs {
            let ab = distance_on_sphere(&a, &b).unwrap();
            let ba = distance_on_sphere(&b, &a).unwrap();
            assert!((ab - ba).abs() < TOLERANCE_M);
        }
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = spherical_distance(0.0, 0.0, 0.0, 1.0).unwrap();
        let reference = 111_319.0;
        assert!((d - reference).abs() / reference < 0.01, "got {}", d);
    }

    #[test]
    fn antipodal_points_are_half_a_circumference_apart() {
        let d = spherical_distance(0.0, 0.0, 0.0, 180.0).unwrap();
        let half = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d - half).abs() < 1.0);
    }

    #[test]
    fn latitude_out_of_range_is_rejected() {
        let err = spherical_distance(91.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinate { latitude, .. } if latitude == 91.0));
        assert!(spherical_distance(0.0, 0.0, -90.5, 0.0).is_err());
        assert!(spherical_distance(0.0, f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn degenerate_boxes_are_rejected() {
        assert!(matches!(
            BoundingBox::new(1.0, 1.0, 2.0, 0.0),
            Err(Error::InvalidBoundingBox { .. })
        ));
        assert!(BoundingBox::new(2.0, 1.0, 2.0, 0.0).is_err());
        assert!(BoundingBox::new(0.0, 1.0, 0.0, 0.0).is_err());
        assert!(BoundingBox::new(0.0, 1.0, 95.0, 0.0).is_err());
        assert!(BoundingBox::new(0.0, f64::INFINITY, 1.0, 0.0).is_err());
        assert!(ok_projection_aspect(0.0, 1.0, -1.0, 1.0).is_err());
    }

    #[test]
    fn full_turn_of_longitude_has_no_meter_width() {
        let bbox = BoundingBox::new(-180.0, 180.0, 1.0, -1.0).unwrap();
        assert!(bbox.projection_aspect().is_err());
    }

    #[test]
    fn aspect_is_one_at_the_equator() {
        let aspect = ok_projection_aspect(-0.5, 0.5, 0.5, -0.5).unwrap();
        assert!((aspect - 1.0).abs() < 1e-3, "got {}", aspect);
    }

    #[test]
    fn aspect_shrinks_at_high_latitudes() {
        let aspect = ok_projection_aspect(-0.5, 0.5, 60.5, 59.5).unwrap();
        assert!(aspect < 1.0);
        assert!((aspect - 0.5).abs() < 1e-3, "got {}", aspect);
    }

    #[test]
    fn center_and_contains() {
        let bbox = BoundingBox::new(-10.0, 10.0, 50.0, 40.0).unwrap();
        assert_eq!(bbox.center(), CoordGeo::new(45.0, 0.0));
        assert!(bbox.contains(&CoordGeo::new(40.0, -10.0)));
        assert!(bbox.contains(&CoordGeo::new(50.0, 10.0)));
        assert!(!bbox.contains(&CoordGeo::new(50.1, 0.0)));
    }
}
