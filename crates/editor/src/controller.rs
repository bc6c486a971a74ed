use model::{
    GeometryStore, Line, MapPoint, PointOfInterest, Region, ValidationError, min_vertices,
};
use tracing::debug;

use crate::mapper::CoordinateMapper;
use crate::session::{Draft, EditSession, EditorMode};

/// Toggle label shown while an entity is loaded with frozen vertices.
pub const LABEL_EDIT_VERTICES: &str = "Edit Vertices";

/// Toggle label shown while vertices are editable; the control is now a
/// stop action.
pub const LABEL_STOP_EDITING: &str = "Stop Editing Vertices";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A drawing or edit session is already active; at most one may live at
    /// a time.
    SessionActive,
    WrongMode {
        expected: EditorMode,
        actual: EditorMode,
    },
    UnknownEntity(String),
    VertexOutOfRange {
        index: usize,
        len: usize,
    },
    Validation(ValidationError),
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::SessionActive => write!(f, "another edit session is already active"),
            EditError::WrongMode { expected, actual } => {
                write!(f, "operation needs {expected} mode, editor is {actual}")
            }
            EditError::UnknownEntity(id) => write!(f, "no region or line named {id:?}"),
            EditError::VertexOutOfRange { index, len } => {
                write!(f, "vertex index {index} out of range (length {len})")
            }
            EditError::Validation(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for EditError {
    fn from(err: ValidationError) -> Self {
        EditError::Validation(err)
    }
}

/// Owns the geometry store and the singleton edit session, and enforces the
/// drawing/editing state machine.
///
/// All mutation happens on discrete input events, in arrival order; nothing
/// here blocks or spawns.
#[derive(Debug, Default)]
pub struct MapEditor {
    store: GeometryStore,
    session: Option<EditSession>,
}

impl MapEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: GeometryStore) -> Self {
        Self {
            store,
            session: None,
        }
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn mode(&self) -> EditorMode {
        self.session
            .as_ref()
            .map_or(EditorMode::Idle, EditSession::mode)
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Label for the vertex-edit toggle, reflecting the *next* action.
    /// Absent outside `Loaded`/`VertexEditing`, where the toggle is hidden.
    pub fn toggle_label(&self) -> Option<&'static str> {
        match self.mode() {
            EditorMode::Loaded => Some(LABEL_EDIT_VERTICES),
            EditorMode::VertexEditing => Some(LABEL_STOP_EDITING),
            EditorMode::Idle | EditorMode::Drawing => None,
        }
    }

    /// Save/cancel affordances are visible iff the mode is `Loaded`.
    /// Mid vertex-edit, committing or discarding the whole entity is
    /// meaningless, so both are hidden until the toggle stops the edit.
    pub fn save_cancel_visible(&self) -> bool {
        self.mode() == EditorMode::Loaded
    }

    /// Adds a point of interest directly; points never go through a session,
    /// their coordinate was already chosen via a prior map click.
    pub fn add_point(&mut self, point: PointOfInterest) -> Result<(), ValidationError> {
        self.store.add_point(point)
    }

    /// Deletes an annotation. A session targeting the removed entity is
    /// abandoned, since its reference no longer resolves.
    pub fn remove(&mut self, id: &str) -> bool {
        let changed = self.store.remove(id);
        if changed
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.target_id() == id)
        {
            debug!(id, "abandoning session for removed entity");
            self.session = None;
        }
        changed
    }

    /// `Idle → Drawing` for a new region. Name, type and value must already
    /// be filled; a failed validation keeps the editor idle and reports the
    /// missing field.
    pub fn start_region(&mut self, name: &str, kind: &str, value: &str) -> Result<(), EditError> {
        self.require_idle()?;
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        if kind.trim().is_empty() {
            return Err(ValidationError::MissingField("type").into());
        }
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField("value").into());
        }
        if self.store.vertices_of(name).is_some() {
            return Err(ValidationError::DuplicateName(name.to_string()).into());
        }
        debug!(name, "start drawing region");
        self.session = Some(EditSession::Drawing {
            draft: Draft::Region {
                name: name.to_string(),
                kind: kind.to_string(),
                value: value.to_string(),
            },
            scratch: Vec::new(),
        });
        Ok(())
    }

    /// `Idle → Drawing` for a new line.
    pub fn start_line(&mut self, name: &str, style: &str) -> Result<(), EditError> {
        self.require_idle()?;
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        if style.trim().is_empty() {
            return Err(ValidationError::MissingField("style").into());
        }
        if self.store.vertices_of(name).is_some() {
            return Err(ValidationError::DuplicateName(name.to_string()).into());
        }
        debug!(name, "start drawing line");
        self.session = Some(EditSession::Drawing {
            draft: Draft::Line {
                name: name.to_string(),
                style: style.to_string(),
            },
            scratch: Vec::new(),
        });
        Ok(())
    }

    /// A map click while drawing: `Drawing → Drawing`, appending a vertex.
    pub fn click<M: CoordinateMapper>(
        &mut self,
        mapper: &M,
        screen_x: f64,
        screen_y: f64,
    ) -> Result<(), EditError> {
        let point = mapper.screen_to_map(screen_x, screen_y);
        self.add_vertex(point)
    }

    pub fn add_vertex(&mut self, point: MapPoint) -> Result<(), EditError> {
        if !point.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate.into());
        }
        match self.session.as_mut() {
            Some(EditSession::Drawing { scratch, .. }) => {
                scratch.push(point);
                Ok(())
            }
            _ => Err(self.wrong_mode(EditorMode::Drawing)),
        }
    }

    /// `Drawing → Loaded`: commits the scratch sequence as a new store
    /// entity. Below the minimum vertex count the commit is rejected and
    /// the session stays in `Drawing`.
    pub fn finish_drawing(&mut self) -> Result<(), EditError> {
        let Some(EditSession::Drawing { draft, scratch }) = self.session.as_ref() else {
            return Err(self.wrong_mode(EditorMode::Drawing));
        };
        let kind = draft.entity_kind();
        let required = min_vertices(kind);
        if scratch.len() < required {
            return Err(ValidationError::TooFewVertices {
                kind,
                required,
                actual: scratch.len(),
            }
            .into());
        }

        // Validated; now take the session apart and commit.
        let Some(EditSession::Drawing { draft, scratch }) = self.session.take() else {
            unreachable!("session variant checked above");
        };
        let id = draft.name().to_string();
        let commit = match draft.clone() {
            Draft::Region { name, kind, value } => self.store.add_region(Region {
                name,
                kind,
                value,
                vertices: scratch.clone(),
            }),
            Draft::Line { name, style } => self.store.add_line(Line {
                name,
                style,
                vertices: scratch.clone(),
            }),
        };
        match commit {
            Ok(()) => {
                debug!(%id, "finished drawing");
                self.session = Some(EditSession::Loaded {
                    id,
                    kind,
                    scratch,
                    dirty: false,
                });
                Ok(())
            }
            Err(err) => {
                // Store refused (e.g. the name was taken by an import); the
                // drawing survives so the user can correct and retry.
                self.session = Some(EditSession::Drawing { draft, scratch });
                Err(err.into())
            }
        }
    }

    /// `Idle → Loaded`: selects an existing region or line for editing.
    pub fn load_entity(&mut self, id: &str) -> Result<(), EditError> {
        self.require_idle()?;
        let (kind, vertices) = self
            .store
            .vertices_of(id)
            .ok_or_else(|| EditError::UnknownEntity(id.to_string()))?;
        debug!(id, "loaded entity for editing");
        self.session = Some(EditSession::Loaded {
            id: id.to_string(),
            kind,
            scratch: vertices.to_vec(),
            dirty: false,
        });
        Ok(())
    }

    /// The "Edit Vertices" / "Stop Editing Vertices" toggle:
    /// `Loaded ⇄ VertexEditing`.
    pub fn toggle_vertex_edit(&mut self) -> Result<(), EditError> {
        match self.session.take() {
            Some(EditSession::Loaded {
                id,
                kind,
                scratch,
                dirty,
            }) => {
                debug!(%id, "vertex editing started");
                self.session = Some(EditSession::VertexEditing {
                    id,
                    kind,
                    scratch,
                    dirty,
                });
                Ok(())
            }
            Some(EditSession::VertexEditing {
                id,
                kind,
                scratch,
                dirty,
            }) => {
                debug!(%id, "vertex editing stopped");
                self.session = Some(EditSession::Loaded {
                    id,
                    kind,
                    scratch,
                    dirty,
                });
                Ok(())
            }
            other => {
                self.session = other;
                Err(self.wrong_mode(EditorMode::Loaded))
            }
        }
    }

    pub fn move_vertex(&mut self, index: usize, point: MapPoint) -> Result<(), EditError> {
        if !point.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate.into());
        }
        let (scratch, dirty) = self.editing_scratch()?;
        if index >= scratch.len() {
            return Err(EditError::VertexOutOfRange {
                index,
                len: scratch.len(),
            });
        }
        scratch[index] = point;
        *dirty = true;
        Ok(())
    }

    /// A vertex drag from the rendering surface, routed through the
    /// coordinate mapping contract.
    pub fn drag_vertex<M: CoordinateMapper>(
        &mut self,
        mapper: &M,
        index: usize,
        screen_x: f64,
        screen_y: f64,
    ) -> Result<(), EditError> {
        let point = mapper.screen_to_map(screen_x, screen_y);
        self.move_vertex(index, point)
    }

    /// Inserts a vertex before `index`; `index == len` appends.
    pub fn insert_vertex(&mut self, index: usize, point: MapPoint) -> Result<(), EditError> {
        if !point.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate.into());
        }
        let (scratch, dirty) = self.editing_scratch()?;
        if index > scratch.len() {
            return Err(EditError::VertexOutOfRange {
                index,
                len: scratch.len(),
            });
        }
        scratch.insert(index, point);
        *dirty = true;
        Ok(())
    }

    /// Deletes a vertex. Refused once the sequence is at its minimum count,
    /// so the scratch can always be committed.
    pub fn remove_vertex(&mut self, index: usize) -> Result<(), EditError> {
        let kind = match self.session.as_ref() {
            Some(EditSession::VertexEditing { kind, .. }) => *kind,
            _ => return Err(self.wrong_mode(EditorMode::VertexEditing)),
        };
        let required = min_vertices(kind);
        let (scratch, dirty) = self.editing_scratch()?;
        if index >= scratch.len() {
            return Err(EditError::VertexOutOfRange {
                index,
                len: scratch.len(),
            });
        }
        if scratch.len() <= required {
            return Err(ValidationError::TooFewVertices {
                kind,
                required,
                actual: scratch.len() - 1,
            }
            .into());
        }
        scratch.remove(index);
        *dirty = true;
        Ok(())
    }

    /// `Loaded → Idle` via "Save": swaps the scratch into the store iff it
    /// was mutated, then clears the session.
    ///
    /// A refused swap puts the session back; the user's edits stay live.
    pub fn save(&mut self) -> Result<(), EditError> {
        match self.session.take() {
            Some(EditSession::Loaded {
                id,
                kind,
                scratch,
                dirty: true,
            }) => {
                if let Err(err) = self.store.replace_geometry(&id, scratch.clone()) {
                    self.session = Some(EditSession::Loaded {
                        id,
                        kind,
                        scratch,
                        dirty: true,
                    });
                    return Err(err.into());
                }
                debug!(%id, "saved edited geometry");
                Ok(())
            }
            Some(EditSession::Loaded { id, .. }) => {
                debug!(%id, "saved with no geometry change");
                Ok(())
            }
            other => {
                self.session = other;
                Err(self.wrong_mode(EditorMode::Loaded))
            }
        }
    }

    /// `Loaded → Idle` via "Cancel": discards the scratch copy; the store
    /// is observably unchanged.
    pub fn cancel(&mut self) -> Result<(), EditError> {
        match self.session.take() {
            Some(EditSession::Loaded { id, .. }) => {
                debug!(%id, "cancelled edit session");
                Ok(())
            }
            other => {
                self.session = other;
                Err(self.wrong_mode(EditorMode::Loaded))
            }
        }
    }

    /// Forcibly discards any in-progress session without committing; the
    /// "load a different map" path. Returns `true` if a session was dropped.
    pub fn abandon_session(&mut self) -> bool {
        if let Some(session) = self.session.take() {
            debug!(id = session.target_id(), "abandoned session");
            true
        } else {
            false
        }
    }

    /// Replaces the whole store (a map switch or document import) and
    /// abandons any in-progress session.
    pub fn load_document(&mut self, store: GeometryStore) {
        self.abandon_session();
        self.store = store;
    }

    fn require_idle(&self) -> Result<(), EditError> {
        if self.session.is_some() {
            Err(EditError::SessionActive)
        } else {
            Ok(())
        }
    }

    fn editing_scratch(&mut self) -> Result<(&mut Vec<MapPoint>, &mut bool), EditError> {
        let actual = self.mode();
        match self.session.as_mut() {
            Some(EditSession::VertexEditing { scratch, dirty, .. }) => Ok((scratch, dirty)),
            _ => Err(EditError::WrongMode {
                expected: EditorMode::VertexEditing,
                actual,
            }),
        }
    }

    fn wrong_mode(&self, expected: EditorMode) -> EditError {
        EditError::WrongMode {
            expected,
            actual: self.mode(),
        }
    }
}
