//! Geographic helpers: validated coordinates, circular search regions and
//! great-circle distance.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Equatorial earth radius in metres (WGS84).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Segments used to approximate a circle when none is specified.
pub const DEFAULT_CIRCLE_SEGMENTS: u32 = 20;

/// Validation errors returned by [`Coordinates::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinatesValidationError {
    NotFinite,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl fmt::Display for CoordinatesValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite => write!(f, "coordinates must be finite numbers"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
        }
    }
}

impl std::error::Error for CoordinatesValidationError {}

/// WGS84 point.
///
/// Deserialisation goes through [`Coordinates::new`], so out-of-range input
/// is rejected rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinatesDto")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct CoordinatesDto {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<CoordinatesDto> for Coordinates {
    type Error = CoordinatesValidationError;

    fn try_from(value: CoordinatesDto) -> Result<Self, Self::Error> {
        Self::new(value.latitude, value.longitude)
    }
}

impl Coordinates {
    /// Validate and construct a point.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesValidationError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinatesValidationError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(self) -> f64 {
        self.latitude
    }

    pub fn longitude(self) -> f64 {
        self.longitude
    }
}

/// Closed polygon ring in WGS84, first point repeated last.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    ring: Vec<Coordinates>,
}

impl Region {
    /// Approximate a circle of `radius_m` around `center` with the default
    /// segment count.
    pub fn circle(center: Coordinates, radius_m: f64) -> Self {
        Self::circle_with_segments(center, radius_m, DEFAULT_CIRCLE_SEGMENTS)
    }

    /// Approximate a circle with `segments` vertices (at least three).
    pub fn circle_with_segments(center: Coordinates, radius_m: f64, segments: u32) -> Self {
        let segments = segments.max(3);
        let lat = center.latitude.to_radians();
        let lng = center.longitude.to_radians();
        let angular = radius_m / EARTH_RADIUS_M;
        let step = 2.0 * PI / f64::from(segments);

        let vertex = |bearing: f64| {
            let vertex_lat =
                (lat.sin() * angular.cos() + lat.cos() * angular.sin() * bearing.cos()).asin();
            let delta_lng = (bearing.sin() * angular.sin() * lat.cos())
                .atan2(angular.cos() - lat.sin() * vertex_lat.sin());
            let vertex_lng = (lng - delta_lng + PI) % (2.0 * PI) - PI;
            Coordinates {
                latitude: vertex_lat.to_degrees(),
                longitude: vertex_lng.to_degrees(),
            }
        };

        let mut ring: Vec<Coordinates> = (0..segments)
            .map(|index| vertex(-f64::from(index) * step))
            .collect();
        ring.push(vertex(0.0));
        Self { ring }
    }

    /// Vertices of the closed ring.
    pub fn ring(&self) -> &[Coordinates] {
        &self.ring
    }

    /// Even-odd point-in-polygon test in the longitude/latitude plane.
    ///
    /// Regions straddling the antimeridian are not supported.
    pub fn contains(&self, point: Coordinates) -> bool {
        let mut inside = false;
        for edge in self.ring.windows(2) {
            let [a, b] = edge else { continue };
            if (a.latitude > point.latitude) != (b.latitude > point.latitude) {
                let crossing = (b.longitude - a.longitude) * (point.latitude - a.latitude)
                    / (b.latitude - a.latitude)
                    + a.longitude;
                if point.longitude < crossing {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// Great-circle distance in metres.
pub fn haversine_m(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (to.longitude - from.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
