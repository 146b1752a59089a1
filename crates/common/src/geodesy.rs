//! Geographic primitives: WGS84 coordinates, axis-aligned bounding boxes and
//! great-circle distance.

use geo::{BoundingRect, MultiPoint, Point};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and inside the WGS84 degree ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Arithmetic midpoint. Adequate at city scale, not across the antimeridian.
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate {
            lat: (self.lat + other.lat) / 2.0,
            lon: (self.lon + other.lon) / 2.0,
        }
    }

    /// `[lat, lon]`, the order map frontends consume.
    pub fn to_lat_lon(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Great-circle distance in meters between two coordinates (haversine).
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_M * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Total great-circle length of a polyline in meters.
pub fn polyline_length(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Axis-aligned lat/lon rectangle. No antimeridian wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Smallest box containing every coordinate, or `None` for an empty input.
    pub fn enclosing<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let points: MultiPoint<f64> = coords
            .into_iter()
            .filter(|c| c.lat.is_finite() && c.lon.is_finite())
            .map(Coordinate::to_point)
            .collect::<Vec<_>>()
            .into();

        points.bounding_rect().map(|rect| BoundingBox {
            north: rect.max().y,
            south: rect.min().y,
            east: rect.max().x,
            west: rect.min().x,
        })
    }

    /// Inclusive containment on both axes.
    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.south <= coord.lat
            && coord.lat <= self.north
            && self.west <= coord.lon
            && coord.lon <= self.east
    }

    pub fn contains_both(&self, a: &Coordinate, b: &Coordinate) -> bool {
        self.contains(a) && self.contains(b)
    }

    /// Grows the box just enough to include `coord`.
    pub fn extend(&self, coord: &Coordinate) -> Self {
        BoundingBox {
            north: self.north.max(coord.lat),
            south: self.south.min(coord.lat),
            east: self.east.max(coord.lon),
            west: self.west.min(coord.lon),
        }
    }
}
