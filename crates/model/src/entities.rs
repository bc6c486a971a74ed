use crate::geometry::MapPoint;

/// Which vertex-bearing collection an identifier refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Region,
    Line,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Region => write!(f, "region"),
            EntityKind::Line => write!(f, "line"),
        }
    }
}

/// A named marker placed at a single map-space coordinate.
///
/// `summary` is the short popup text and is authored independently of the
/// optional long-form `description` — it is never derived by truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub category: String,
    pub summary: String,
    pub description: Option<String>,
    pub position: MapPoint,
}

/// A polygonal overlay. The vertex sequence is an open ring; the closing
/// edge is implied, never stored.
///
/// `name` doubles as the identifier and is unique among regions and lines.
/// `kind` is the filter group tag (e.g. "Political"), `value` the subgroup
/// tag within it (e.g. "Kingdom").
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub kind: String,
    pub value: String,
    pub vertices: Vec<MapPoint>,
}

/// A polyline overlay. `style` is the line's filterable tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub name: String,
    pub style: String,
    pub vertices: Vec<MapPoint>,
}
