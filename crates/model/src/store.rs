use crate::entities::{EntityKind, Line, PointOfInterest, Region};
use crate::geometry::{LINE_MIN_VERTICES, MapPoint, REGION_MIN_VERTICES};

/// A user-input error surfaced directly to the caller. The store is left
/// unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    TooFewVertices {
        kind: EntityKind,
        required: usize,
        actual: usize,
    },
    DuplicateName(String),
    NonFiniteCoordinate,
    UnknownEntity(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "required field is empty: {field}"),
            ValidationError::TooFewVertices {
                kind,
                required,
                actual,
            } => write!(f, "a {kind} needs at least {required} vertices, got {actual}"),
            ValidationError::DuplicateName(name) => {
                write!(f, "an annotation named {name:?} already exists")
            }
            ValidationError::NonFiniteCoordinate => write!(f, "coordinate is not a finite number"),
            ValidationError::UnknownEntity(id) => write!(f, "no annotation with id {id:?}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// In-memory collections of annotations for the currently loaded map.
///
/// Construction is all-or-nothing: an entity that fails validation is never
/// partially visible to readers. Insertion order is preserved per collection.
///
/// Region and line names double as identifiers and share one namespace, so
/// that `replace_geometry` and `remove` are unambiguous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryStore {
    points: Vec<PointOfInterest>,
    regions: Vec<Region>,
    lines: Vec<Line>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: PointOfInterest) -> Result<(), ValidationError> {
        if point.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id"));
        }
        if point.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if point.summary.trim().is_empty() {
            return Err(ValidationError::MissingField("summary"));
        }
        if !point.position.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        if self.points.iter().any(|p| p.id == point.id) {
            return Err(ValidationError::DuplicateName(point.id));
        }
        self.points.push(point);
        Ok(())
    }

    pub fn add_region(&mut self, region: Region) -> Result<(), ValidationError> {
        if region.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if region.kind.trim().is_empty() {
            return Err(ValidationError::MissingField("type"));
        }
        if region.value.trim().is_empty() {
            return Err(ValidationError::MissingField("value"));
        }
        validate_vertices(EntityKind::Region, &region.vertices)?;
        if self.has_geometry_name(&region.name) {
            return Err(ValidationError::DuplicateName(region.name));
        }
        self.regions.push(region);
        Ok(())
    }

    pub fn add_line(&mut self, line: Line) -> Result<(), ValidationError> {
        if line.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if line.style.trim().is_empty() {
            return Err(ValidationError::MissingField("style"));
        }
        validate_vertices(EntityKind::Line, &line.vertices)?;
        if self.has_geometry_name(&line.name) {
            return Err(ValidationError::DuplicateName(line.name));
        }
        self.lines.push(line);
        Ok(())
    }

    /// Atomically swaps a region or line's vertex sequence.
    ///
    /// This is the only mutation path for a committed edit session. The
    /// existing sequence stays in place if the replacement fails validation.
    pub fn replace_geometry(
        &mut self,
        id: &str,
        vertices: Vec<MapPoint>,
    ) -> Result<(), ValidationError> {
        if let Some(region) = self.regions.iter_mut().find(|r| r.name == id) {
            validate_vertices(EntityKind::Region, &vertices)?;
            region.vertices = vertices;
            return Ok(());
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.name == id) {
            validate_vertices(EntityKind::Line, &vertices)?;
            line.vertices = vertices;
            return Ok(());
        }
        Err(ValidationError::UnknownEntity(id.to_string()))
    }

    /// Deletes an annotation by id.
    ///
    /// Idempotent: removing an absent id is a no-op. Returns `true` if the
    /// store changed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.points.len() + self.regions.len() + self.lines.len();
        self.points.retain(|p| p.id != id);
        self.regions.retain(|r| r.name != id);
        self.lines.retain(|l| l.name != id);
        before != self.points.len() + self.regions.len() + self.lines.len()
    }

    pub fn point(&self, id: &str) -> Option<&PointOfInterest> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.name == name)
    }

    /// Resolves a region/line id to its kind and current vertex sequence.
    pub fn vertices_of(&self, id: &str) -> Option<(EntityKind, &[MapPoint])> {
        if let Some(region) = self.region(id) {
            return Some((EntityKind::Region, &region.vertices));
        }
        self.line(id).map(|l| (EntityKind::Line, &l.vertices[..]))
    }

    pub fn points(&self) -> &[PointOfInterest] {
        &self.points
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.regions.is_empty() && self.lines.is_empty()
    }

    fn has_geometry_name(&self, name: &str) -> bool {
        self.regions.iter().any(|r| r.name == name) || self.lines.iter().any(|l| l.name == name)
    }
}

/// Required vertex count for each kind of vertex-bearing annotation.
pub fn min_vertices(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Region => REGION_MIN_VERTICES,
        EntityKind::Line => LINE_MIN_VERTICES,
    }
}

fn validate_vertices(kind: EntityKind, vertices: &[MapPoint]) -> Result<(), ValidationError> {
    let required = min_vertices(kind);
    if vertices.len() < required {
        return Err(ValidationError::TooFewVertices {
            kind,
            required,
            actual: vertices.len(),
        });
    }
    if vertices.iter().any(|v| !v.is_finite()) {
        return Err(ValidationError::NonFiniteCoordinate);
    }
    Ok(())
}
