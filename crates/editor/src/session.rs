use model::{EntityKind, MapPoint};

/// Observable mode of the editor, one per state of the machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Idle,
    Drawing,
    Loaded,
    VertexEditing,
}

impl std::fmt::Display for EditorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorMode::Idle => write!(f, "idle"),
            EditorMode::Drawing => write!(f, "drawing"),
            EditorMode::Loaded => write!(f, "loaded"),
            EditorMode::VertexEditing => write!(f, "vertex-editing"),
        }
    }
}

/// Metadata for a brand-new annotation being drawn, collected and validated
/// before the first vertex is placed.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Region {
        name: String,
        kind: String,
        value: String,
    },
    Line {
        name: String,
        style: String,
    },
}

impl Draft {
    pub fn name(&self) -> &str {
        match self {
            Draft::Region { name, .. } | Draft::Line { name, .. } => name,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Draft::Region { .. } => EntityKind::Region,
            Draft::Line { .. } => EntityKind::Line,
        }
    }
}

/// The singleton edit session, a tagged variant rather than ambient flags.
///
/// Every variant owns its scratch vertex sequence; the store's live
/// sequence is never aliased, so discarding a session can never mutate the
/// store.
#[derive(Debug, Clone, PartialEq)]
pub enum EditSession {
    /// Building a new region or line vertex-by-vertex from map clicks.
    Drawing { draft: Draft, scratch: Vec<MapPoint> },
    /// An existing entity is selected; its vertices are frozen for display.
    Loaded {
        id: String,
        kind: EntityKind,
        scratch: Vec<MapPoint>,
        dirty: bool,
    },
    /// The loaded entity's vertices are individually editable.
    VertexEditing {
        id: String,
        kind: EntityKind,
        scratch: Vec<MapPoint>,
        dirty: bool,
    },
}

impl EditSession {
    pub fn mode(&self) -> EditorMode {
        match self {
            EditSession::Drawing { .. } => EditorMode::Drawing,
            EditSession::Loaded { .. } => EditorMode::Loaded,
            EditSession::VertexEditing { .. } => EditorMode::VertexEditing,
        }
    }

    pub fn scratch(&self) -> &[MapPoint] {
        match self {
            EditSession::Drawing { scratch, .. }
            | EditSession::Loaded { scratch, .. }
            | EditSession::VertexEditing { scratch, .. } => scratch,
        }
    }

    /// Identifier of the session's target: the committed entity's id, or
    /// the draft name while drawing.
    pub fn target_id(&self) -> &str {
        match self {
            EditSession::Drawing { draft, .. } => draft.name(),
            EditSession::Loaded { id, .. } | EditSession::VertexEditing { id, .. } => id,
        }
    }
}
