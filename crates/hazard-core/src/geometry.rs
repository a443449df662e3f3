//! Advanced geometries and bounding-box helpers

use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

/// Kind tag of an advanced geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    BufferedPolygon,
}

/// Geometry attached to a hazard event or visual feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdvancedGeometry {
    /// A single location
    Point(Coordinate),
    /// An open polyline
    Line(Vec<Coordinate>),
    /// A polygon: exterior ring plus optional holes
    Polygon {
        exterior: Vec<Coordinate>,
        #[serde(default)]
        holes: Vec<Vec<Coordinate>>,
    },
    /// A polygon grown outward by a buffer distance in degrees
    BufferedPolygon {
        exterior: Vec<Coordinate>,
        buffer: f64,
    },
}

impl AdvancedGeometry {
    /// Create a polygon without holes
    pub fn polygon(exterior: impl IntoIterator<Item = impl Into<Coordinate>>) -> Self {
        AdvancedGeometry::Polygon {
            exterior: exterior.into_iter().map(Into::into).collect(),
            holes: Vec::new(),
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            AdvancedGeometry::Point(_) => GeometryKind::Point,
            AdvancedGeometry::Line(_) => GeometryKind::Line,
            AdvancedGeometry::Polygon { .. } => GeometryKind::Polygon,
            AdvancedGeometry::BufferedPolygon { .. } => GeometryKind::BufferedPolygon,
        }
    }

    /// All coordinates of the outer shape
    pub fn coordinates(&self) -> Vec<Coordinate> {
        match self {
            AdvancedGeometry::Point(c) => vec![*c],
            AdvancedGeometry::Line(cs) => cs.clone(),
            AdvancedGeometry::Polygon { exterior, .. } => exterior.clone(),
            AdvancedGeometry::BufferedPolygon { exterior, .. } => exterior.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AdvancedGeometry::Point(_) => false,
            AdvancedGeometry::Line(cs) => cs.is_empty(),
            AdvancedGeometry::Polygon { exterior, .. } => exterior.is_empty(),
            AdvancedGeometry::BufferedPolygon { exterior, .. } => exterior.is_empty(),
        }
    }

    /// Bounding box, including any buffer
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let bbox = BoundingBox::from_coordinates(self.coordinates())?;
        match self {
            AdvancedGeometry::BufferedPolygon { buffer, .. } => Some(bbox.expanded(*buffer)),
            _ => Some(bbox),
        }
    }

    /// Point-in-shape test; lines and points only match exactly on a vertex
    pub fn contains(&self, point: Coordinate) -> bool {
        match self {
            AdvancedGeometry::Point(c) => *c == point,
            AdvancedGeometry::Line(cs) => cs.contains(&point),
            AdvancedGeometry::Polygon { exterior, holes } => {
                ring_contains(exterior, point) && !holes.iter().any(|h| ring_contains(h, point))
            }
            AdvancedGeometry::BufferedPolygon { exterior, buffer } => {
                ring_contains(exterior, point)
                    || self
                        .bounding_box()
                        .is_some_and(|b| b.contains(point) && *buffer > 0.0 && near_ring(exterior, point, *buffer))
            }
        }
    }
}

// Even-odd ray casting.
fn ring_contains(ring: &[Coordinate], p: Coordinate) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat)
            && p.lon < (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn near_ring(ring: &[Coordinate], p: Coordinate, distance: f64) -> bool {
    ring.iter().zip(ring.iter().cycle().skip(1)).any(|(a, b)| segment_distance(*a, *b, p) <= distance)
}

fn segment_distance(a: Coordinate, b: Coordinate, p: Coordinate) -> f64 {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.lon - a.lon) * dx + (p.lat - a.lat) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.lon + t * dx, a.lat + t * dy);
    ((p.lon - cx).powi(2) + (p.lat - cy).powi(2)).sqrt()
}

/// Axis-aligned lon/lat bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box holding all coordinates; `None` when there are none
    pub fn from_coordinates(coords: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.lon, first.lat, first.lon, first.lat);
        for c in iter {
            bbox.min_lon = bbox.min_lon.min(c.lon);
            bbox.min_lat = bbox.min_lat.min(c.lat);
            bbox.max_lon = bbox.max_lon.max(c.lon);
            bbox.max_lat = bbox.max_lat.max(c.lat);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Edges are inclusive
    pub fn contains(&self, c: Coordinate) -> bool {
        c.lon >= self.min_lon && c.lon <= self.max_lon && c.lat >= self.min_lat && c.lat <= self.max_lat
    }

    /// Touching boxes intersect
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_lon.min(other.min_lon),
            self.min_lat.min(other.min_lat),
            self.max_lon.max(other.max_lon),
            self.max_lat.max(other.max_lat),
        )
    }

    /// Grow every edge outward by `margin` degrees
    pub fn expanded(&self, margin: f64) -> BoundingBox {
        BoundingBox::new(
            self.min_lon - margin,
            self.min_lat - margin,
            self.max_lon + margin,
            self.max_lat + margin,
        )
    }

    /// Closed polygon ring tracing this box
    pub fn to_polygon(&self) -> AdvancedGeometry {
        AdvancedGeometry::polygon([
            (self.min_lon, self.min_lat),
            (self.max_lon, self.min_lat),
            (self.max_lon, self.max_lat),
            (self.min_lon, self.max_lat),
            (self.min_lon, self.min_lat),
        ])
    }
}
