use std::collections::BTreeMap;

use filters::{FilterTree, LINE_GROUP, POI_GROUP};
use model::{GeometryStore, Line, MapPoint, PointOfInterest, Region};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level fields a document cannot be loaded without.
const REQUIRED_FIELDS: [&str; 4] = ["id", "name", "width", "height"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    Malformed(String),
    MissingField(&'static str),
    InvalidEntity {
        section: &'static str,
        index: usize,
        reason: String,
    },
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Malformed(reason) => write!(f, "malformed map document: {reason}"),
            FormatError::MissingField(field) => {
                write!(f, "map document is missing required field {field:?}")
            }
            FormatError::InvalidEntity {
                section,
                index,
                reason,
            } => write!(f, "invalid entry in {section} at index {index}: {reason}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// Map metadata carried alongside the annotation collections.
#[derive(Debug, Clone, PartialEq)]
pub struct MapInfo {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub width: f64,
    pub height: f64,
}

/// The canonical JSON document exchanged between editor and viewer.
///
/// Coordinates serialize as `[y, x]` pairs: index 0 ranges over the raster
/// image's height, index 1 over its width, matching what the viewer feeds
/// its rendering surface.
///
/// Unknown top-level fields are preserved through a round-trip but never
/// interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub points_of_interest: Vec<PoiEntry>,
    #[serde(default)]
    pub regions: Vec<RegionEntry>,
    #[serde(default)]
    pub lines: Vec<LineEntry>,
    /// Derived filter metadata. Regenerated from current data at export
    /// time; whatever a loaded document carried is ignored.
    #[serde(default)]
    pub filter_groups: FilterGroups,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Derived filter metadata the viewer consumes.
///
/// The viewer builds its hierarchical region filter UI from the `Regions`
/// object (group → sorted value list); line and point filters it derives
/// from the entity arrays directly, so only region families are carried.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterGroups {
    #[serde(rename = "Regions", default)]
    pub regions: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoiEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub coords: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub coords: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub style: String,
    pub coords: Vec<[f64; 2]>,
}

impl Document {
    /// Parses a document, checking the required top-level fields before
    /// anything else so the error names the missing field. Missing arrays
    /// default to empty.
    ///
    /// The imported `filterGroups` value is dropped here; it is derived
    /// data and is recomputed from the entities whenever needed.
    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        let mut value: Value =
            serde_json::from_str(text).map_err(|e| FormatError::Malformed(e.to_string()))?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| FormatError::Malformed("document must be a JSON object".to_string()))?;
        for field in REQUIRED_FIELDS {
            if !obj.contains_key(field) {
                return Err(FormatError::MissingField(field));
            }
        }
        // Derived data: dropped unread, whatever shape it arrived in.
        obj.remove("filterGroups");
        serde_json::from_value(value).map_err(|e| FormatError::Malformed(e.to_string()))
    }

    /// Serializes for export. Callers regenerate `filter_groups` first
    /// (or go through [`Document::from_store`], which does).
    pub fn to_json(&self) -> Result<String, FormatError> {
        serde_json::to_string(self).map_err(|e| FormatError::Malformed(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, FormatError> {
        serde_json::to_string_pretty(self).map_err(|e| FormatError::Malformed(e.to_string()))
    }

    /// Export path: snapshots a geometry store with freshly derived filter
    /// groups.
    pub fn from_store(info: MapInfo, store: &GeometryStore) -> Self {
        Self {
            id: info.id,
            name: info.name,
            image_url: info.image_url,
            width: info.width,
            height: info.height,
            points_of_interest: store.points().iter().map(PoiEntry::from_model).collect(),
            regions: store.regions().iter().map(RegionEntry::from_model).collect(),
            lines: store.lines().iter().map(LineEntry::from_model).collect(),
            filter_groups: derive_filter_groups(store),
            extra: Map::new(),
        }
    }

    /// Import path: builds a validated store from the document's entities.
    ///
    /// Nothing is committed on failure — the caller's previous store stays
    /// as it was, fully consistent.
    pub fn build_store(&self) -> Result<GeometryStore, FormatError> {
        let mut store = GeometryStore::new();
        for (index, entry) in self.points_of_interest.iter().enumerate() {
            store
                .add_point(entry.to_model())
                .map_err(|e| FormatError::InvalidEntity {
                    section: "pointsOfInterest",
                    index,
                    reason: e.to_string(),
                })?;
        }
        for (index, entry) in self.regions.iter().enumerate() {
            store
                .add_region(entry.to_model())
                .map_err(|e| FormatError::InvalidEntity {
                    section: "regions",
                    index,
                    reason: e.to_string(),
                })?;
        }
        for (index, entry) in self.lines.iter().enumerate() {
            store
                .add_line(entry.to_model())
                .map_err(|e| FormatError::InvalidEntity {
                    section: "lines",
                    index,
                    reason: e.to_string(),
                })?;
        }
        Ok(store)
    }

    pub fn regenerate_filter_groups(&mut self, store: &GeometryStore) {
        self.filter_groups = derive_filter_groups(store);
    }

    pub fn info(&self) -> MapInfo {
        MapInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl PoiEntry {
    fn from_model(point: &PointOfInterest) -> Self {
        Self {
            id: point.id.clone(),
            name: point.name.clone(),
            category: point.category.clone(),
            summary: point.summary.clone(),
            description: point.description.clone(),
            coords: to_coords(point.position),
        }
    }

    fn to_model(&self) -> PointOfInterest {
        PointOfInterest {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            position: from_coords(self.coords),
        }
    }
}

impl RegionEntry {
    fn from_model(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            kind: region.kind.clone(),
            value: region.value.clone(),
            coords: region.vertices.iter().copied().map(to_coords).collect(),
        }
    }

    fn to_model(&self) -> Region {
        Region {
            name: self.name.clone(),
            kind: self.kind.clone(),
            value: self.value.clone(),
            vertices: self.coords.iter().copied().map(from_coords).collect(),
        }
    }
}

impl LineEntry {
    fn from_model(line: &Line) -> Self {
        Self {
            name: line.name.clone(),
            style: line.style.clone(),
            coords: line.vertices.iter().copied().map(to_coords).collect(),
        }
    }

    fn to_model(&self) -> Line {
        Line {
            name: self.name.clone(),
            style: self.style.clone(),
            vertices: self.coords.iter().copied().map(from_coords).collect(),
        }
    }
}

fn derive_filter_groups(store: &GeometryStore) -> FilterGroups {
    let tree = FilterTree::from_store(store);
    let regions = tree
        .groups()
        .filter(|(name, _)| *name != LINE_GROUP && *name != POI_GROUP)
        .map(|(name, group)| {
            let values = group.leaves().map(|(value, _)| value.to_string()).collect();
            (name.to_string(), values)
        })
        .collect();
    FilterGroups { regions }
}

fn to_coords(p: MapPoint) -> [f64; 2] {
    [p.y, p.x]
}

fn from_coords(c: [f64; 2]) -> MapPoint {
    MapPoint::new(c[1], c[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor::MapEditor;
    use pretty_assertions::assert_eq;

    fn sample_store() -> GeometryStore {
        let mut store = GeometryStore::new();
        store
            .add_point(PointOfInterest {
                id: "castle".to_string(),
                name: "Castle".to_string(),
                category: "City".to_string(),
                summary: "Seat of the crown.".to_string(),
                description: Some("<p>Long-form lore.</p>".to_string()),
                position: MapPoint::new(10.0, 20.0),
            })
            .unwrap();
        store
            .add_region(Region {
                name: "Avaria".to_string(),
                kind: "Political".to_string(),
                value: "Kingdom".to_string(),
                vertices: vec![
                    MapPoint::new(0.0, 0.0),
                    MapPoint::new(4.0, 0.0),
                    MapPoint::new(2.0, 3.0),
                ],
            })
            .unwrap();
        store
            .add_line(Line {
                name: "King's Road".to_string(),
                style: "road".to_string(),
                vertices: vec![MapPoint::new(0.0, 0.0), MapPoint::new(9.0, 9.0)],
            })
            .unwrap();
        store
    }

    fn sample_info() -> MapInfo {
        MapInfo {
            id: "world-1".to_string(),
            name: "The Known World".to_string(),
            image_url: "maps/world-1.png".to_string(),
            width: 4096.0,
            height: 2048.0,
        }
    }

    #[test]
    fn round_trip_preserves_store_and_regenerates_identical_groups() {
        let store = sample_store();
        let exported = Document::from_store(sample_info(), &store);
        let json = exported.to_json().unwrap();

        let imported = Document::from_json(&json).unwrap();
        let rebuilt = imported.build_store().unwrap();
        assert_eq!(rebuilt, store);

        let reexported = Document::from_store(imported.info(), &rebuilt);
        assert_eq!(reexported, exported);
    }

    #[test]
    fn missing_required_fields_fail() {
        let err = Document::from_json(r#"{"id": "world-1", "name": "World", "width": 10}"#)
            .unwrap_err();
        assert_eq!(err, FormatError::MissingField("height"));

        let err = Document::from_json(r#"{"name": "World", "width": 10, "height": 10}"#)
            .unwrap_err();
        assert_eq!(err, FormatError::MissingField("id"));
    }

    #[test]
    fn missing_arrays_default_to_empty() {
        let doc = Document::from_json(
            r#"{"id": "world-1", "name": "World", "width": 10, "height": 10}"#,
        )
        .unwrap();
        assert!(doc.points_of_interest.is_empty());
        assert!(doc.regions.is_empty());
        assert!(doc.lines.is_empty());
        assert!(doc.build_store().unwrap().is_empty());
    }

    #[test]
    fn imported_filter_groups_are_ignored() {
        // Even a garbage-typed filterGroups must not fail the import; the
        // field is derived data and is never read.
        let json = r#"{
            "id": "world-1", "name": "World", "width": 10, "height": 10,
            "regions": [
                {"name": "Avaria", "type": "Political", "value": "Kingdom",
                 "coords": [[0,0],[0,4],[3,2]]}
            ],
            "filterGroups": "stale nonsense"
        }"#;
        let mut doc = Document::from_json(json).unwrap();
        assert!(doc.filter_groups.regions.is_empty());

        let store = doc.build_store().unwrap();
        doc.regenerate_filter_groups(&store);
        assert_eq!(
            doc.filter_groups.regions,
            BTreeMap::from([("Political".to_string(), vec!["Kingdom".to_string()])])
        );
    }

    #[test]
    fn region_families_nest_under_the_regions_key() {
        let doc = Document::from_store(sample_info(), &sample_store());
        assert_eq!(
            doc.filter_groups.regions,
            BTreeMap::from([("Political".to_string(), vec!["Kingdom".to_string()])])
        );

        // The viewer reads filterGroups.Regions; lines and points it
        // derives from the entity arrays, so they must not appear here.
        let value: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(
            value["filterGroups"]["Regions"]["Political"],
            serde_json::json!(["Kingdom"])
        );
        assert!(value["filterGroups"].get("Lines").is_none());
        assert!(value["filterGroups"].get("Points of Interest").is_none());
    }

    #[test]
    fn unknown_top_level_fields_round_trip() {
        let json = r#"{
            "id": "world-1", "name": "World", "width": 10, "height": 10,
            "ambience": {"track": "tavern.ogg", "volume": 0.4}
        }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(
            doc.extra.get("ambience").and_then(|v| v.get("track")),
            Some(&Value::String("tavern.ogg".to_string()))
        );

        let reparsed = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(reparsed.extra, doc.extra);
    }

    #[test]
    fn invalid_entity_aborts_import() {
        let json = r#"{
            "id": "world-1", "name": "World", "width": 10, "height": 10,
            "pointsOfInterest": [
                {"id": "castle", "name": "Castle", "category": "City",
                 "summary": "", "coords": [1, 2]}
            ]
        }"#;
        let doc = Document::from_json(json).unwrap();
        let err = doc.build_store().unwrap_err();
        assert_eq!(
            err,
            FormatError::InvalidEntity {
                section: "pointsOfInterest",
                index: 0,
                reason: "required field is empty: summary".to_string(),
            }
        );
    }

    #[test]
    fn failed_import_leaves_previous_store_intact() {
        fn try_import(editor: &mut MapEditor, text: &str) -> Result<(), FormatError> {
            let doc = Document::from_json(text)?;
            let store = doc.build_store()?;
            editor.load_document(store);
            Ok(())
        }

        let mut editor = MapEditor::with_store(sample_store());
        let before = editor.store().clone();

        let err = try_import(
            &mut editor,
            r#"{
                "id": "world-2", "name": "Bad World", "width": 10, "height": 10,
                "regions": [
                    {"name": "Thin", "type": "Political", "value": "Kingdom",
                     "coords": [[0,0],[1,1]]}
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::InvalidEntity { .. }));
        assert_eq!(editor.store(), &before);

        // The same path replaces the store once the document is valid.
        try_import(
            &mut editor,
            r#"{"id": "world-3", "name": "Blank", "width": 10, "height": 10}"#,
        )
        .unwrap();
        assert!(editor.store().is_empty());
    }

    #[test]
    fn coords_serialize_row_major() {
        // A point at x=10 (width axis), y=20 (height axis) stores [20, 10].
        let doc = Document::from_store(sample_info(), &sample_store());
        assert_eq!(doc.points_of_interest[0].coords, [20.0, 10.0]);
    }

    #[test]
    fn description_is_omitted_when_absent() {
        let mut store = GeometryStore::new();
        store
            .add_point(PointOfInterest {
                id: "cairn".to_string(),
                name: "Old Cairn".to_string(),
                category: "Ruin".to_string(),
                summary: "A weathered marker.".to_string(),
                description: None,
                position: MapPoint::new(1.0, 1.0),
            })
            .unwrap();
        let json = Document::from_store(sample_info(), &store).to_json().unwrap();
        assert!(!json.contains("description"));
    }
}
