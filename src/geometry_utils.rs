use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Coord, Distance, Haversine, Line, Point};
use serde::Serialize;

// --- Earth constants ---

pub const EQUATORIAL_RADIUS: f64 = 6_378_137.0;
pub const POLAR_RADIUS: f64 = 6_356_752.314_245_179;
/// WGS84 authalic radius, used to turn spherical measures into meters
pub const AUTHALIC_RADIUS: f64 = 6_371_007.1809;

const TAU: f64 = std::f64::consts::TAU;

// --- Degree/Meter Conversion ---
// Valid over short distances only. Longitude spacing shrinks with latitude,
// latitude spacing does not.

pub fn meters_to_lat(m: f64) -> f64 {
    m / (TAU * POLAR_RADIUS / 360.0)
}

pub fn meters_to_lon(m: f64, at_lat: f64) -> f64 {
    if at_lat.abs() >= 90.0 {
        return 0.0;
    }
    m / (TAU * EQUATORIAL_RADIUS / 360.0) / at_lat.to_radians().cos().abs()
}

pub fn lat_to_meters(dlat: f64) -> f64 {
    dlat * (TAU * POLAR_RADIUS / 360.0)
}

pub fn lon_to_meters(dlon: f64, at_lat: f64) -> f64 {
    if at_lat.abs() >= 90.0 {
        return 0.0;
    }
    dlon * (TAU * EQUATORIAL_RADIUS / 360.0) * at_lat.to_radians().cos().abs()
}

// --- Spherical Measures ---

/// Great-circle distance in meters between two (lon, lat) coordinates.
pub fn spherical_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Great-circle length in meters of a polyline of (lon, lat) coordinates.
pub fn spherical_length(coords: &[Coord<f64>]) -> f64 {
    coords
        .windows(2)
        .map(|pair| spherical_distance(pair[0], pair[1]))
        .sum()
}

// --- Planar Helpers ---

/// Linear interpolation from `a` towards `b`. `t > 1` extrapolates past `b`.
pub fn vec_interp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

/// 2D intersection of two segments. Touching endpoints count. For collinear
/// overlap the start of the shared part is returned.
pub fn segment_intersection(a: Line<f64>, b: Line<f64>) -> Option<Coord<f64>> {
    match line_intersection(a, b)? {
        LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
        LineIntersection::Collinear { intersection } => Some(intersection.start),
    }
}

// --- Extent ---

/// Axis-aligned bounding rectangle in (lon, lat) degrees.
/// `Extent::default()` is empty and absorbs the first coordinate extended into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub min: Coord<f64>,
    pub max: Coord<f64>,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            min: Coord {
                x: f64::INFINITY,
                y: f64::INFINITY,
            },
            max: Coord {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
            },
        }
    }
}

impl Extent {
    pub fn new(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self {
            min: Coord {
                x: a.x.min(b.x),
                y: a.y.min(b.y),
            },
            max: Coord {
                x: a.x.max(b.x),
                y: a.y.max(b.y),
            },
        }
    }

    /// Square of `half_size_m` meters (each side of the center) around `center`.
    pub fn around(center: Coord<f64>, half_size_m: f64) -> Self {
        let lon_range = meters_to_lon(half_size_m, center.y);
        let lat_range = meters_to_lat(half_size_m);
        Self::new(
            Coord {
                x: center.x - lon_range,
                y: center.y - lat_range,
            },
            Coord {
                x: center.x + lon_range,
                y: center.y + lat_range,
            },
        )
    }

    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Self {
        coords.into_iter().fold(Self::default(), |mut ext, c| {
            ext.extend_coord(*c);
            ext
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn extend_coord(&mut self, c: Coord<f64>) {
        self.min.x = self.min.x.min(c.x);
        self.min.y = self.min.y.min(c.y);
        self.max.x = self.max.x.max(c.x);
        self.max.y = self.max.y.max(c.y);
    }

    pub fn extend(&mut self, other: &Extent) {
        if other.is_empty() {
            return;
        }
        self.extend_coord(other.min);
        self.extend_coord(other.max);
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    pub fn center(&self) -> Option<Coord<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(vec_interp(self.min, self.max, 0.5))
    }
}
