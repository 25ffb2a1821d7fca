//! Editing session: one open document and its history.
//!
//! The session is the only owner of the scene. Edits go through
//! [`EditorSession::edit`] (or [`EditorSession::apply`] for canvases),
//! which drains the scene's change notifications and records one history
//! entry per logical mutation, so tool code never calls `commit` itself.
//!
//! Gestures that produce many intermediate changes (dragging, a brush
//! stroke) are wrapped in `begin_batch` / `end_batch` and land in the log
//! as a single entry.

use crate::error::HistoryError;
use crate::history::HistoryEngine;
use crate::shortcuts::ShortcutAction;
use std::collections::{HashMap, HashSet};
use vc_core::snapshot::EntityRecord;
use vc_core::{Axis, Canvas, EntityId, Scene, SceneDocument, SceneMutation, ZOrder};

/// Label of the first entry of every document's history.
pub const OPEN_DOCUMENT: &str = "Open Document";

/// How far pasted and duplicated objects are shifted from their source.
pub const PASTE_OFFSET: f32 = 10.0;

#[derive(Debug)]
struct Batch {
    label: String,
    /// Nesting depth; the batch closes when this returns to zero.
    depth: usize,
    /// Whether any change notification arrived while open.
    dirty: bool,
}

/// One open document: the scene, its history, and the editor state that
/// sits around them (selection, clipboard, open gesture).
pub struct EditorSession<S: Scene> {
    scene: S,
    history: HistoryEngine,
    batch: Option<Batch>,
    selection: Vec<EntityId>,
    /// One entry per copied object: its subtree in pre-order.
    clipboard: Vec<Vec<EntityRecord>>,
}

impl<S: Scene> EditorSession<S> {
    /// Open `scene` with a history of at most `max_steps` entries. The
    /// initial state is recorded as entry 0.
    ///
    /// # Errors
    /// [`HistoryError::SerializationFailed`] if the initial scene cannot
    /// be captured.
    pub fn new(scene: S, max_steps: usize) -> Result<Self, HistoryError> {
        let mut session = Self {
            scene,
            history: HistoryEngine::new(max_steps),
            batch: None,
            selection: Vec::new(),
            clipboard: Vec::new(),
        };
        session.record_initial_state()?;
        Ok(session)
    }

    fn record_initial_state(&mut self) -> Result<(), HistoryError> {
        // Whatever built the scene is part of its initial state.
        self.scene.take_changes();
        self.history.commit(&self.scene, OPEN_DOCUMENT)?;
        Ok(())
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    // ─── Recording ───────────────────────────────────────────────────────

    /// Run `f` against the scene, then record whatever it changed.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> Result<R, HistoryError> {
        let out = f(&mut self.scene);
        self.flush()?;
        Ok(out)
    }

    /// Drain pending notifications and commit once for all of them,
    /// labelled by the last. Inside a batch the changes are only noted.
    /// Returns whether an entry was recorded.
    pub fn flush(&mut self) -> Result<bool, HistoryError> {
        let changes = self.scene.take_changes();
        let Some(last) = changes.last() else {
            return Ok(false);
        };
        if let Some(batch) = self.batch.as_mut() {
            log::trace!("{} change(s) absorbed into {:?}", changes.len(), batch.label);
            batch.dirty = true;
            return Ok(false);
        }
        self.history.on_scene_change(&self.scene, last)
    }

    /// Record the current state under `label`, regardless of pending
    /// notifications (which this entry covers). An open batch is closed
    /// without its own entry; this one covers its changes too.
    pub fn commit(&mut self, label: &str) -> Result<bool, HistoryError> {
        if let Some(batch) = self.batch.take() {
            log::debug!("batch {:?} closed by commit {label:?}", batch.label);
        }
        self.scene.take_changes();
        self.history.commit(&self.scene, label)
    }

    /// Open a gesture. Changes made until the matching `end_batch` are
    /// recorded as one entry named `label`. Nested calls only deepen the
    /// current batch; the outermost label wins.
    pub fn begin_batch(&mut self, label: impl Into<String>) -> Result<(), HistoryError> {
        match self.batch.as_mut() {
            Some(batch) => batch.depth += 1,
            None => {
                // Changes made before the gesture get their own entry.
                self.flush()?;
                self.batch = Some(Batch {
                    label: label.into(),
                    depth: 1,
                    dirty: false,
                });
            }
        }
        Ok(())
    }

    /// Close a gesture. When the outermost batch closes and the scene
    /// actually changed, one entry is committed. Returns whether it was.
    pub fn end_batch(&mut self) -> Result<bool, HistoryError> {
        let Some(batch) = self.batch.as_mut() else {
            return Ok(false);
        };
        batch.depth -= 1;
        if batch.depth > 0 {
            return Ok(false);
        }
        self.close_batch()
    }

    fn close_batch(&mut self) -> Result<bool, HistoryError> {
        let Some(mut batch) = self.batch.take() else {
            return Ok(false);
        };
        if !self.scene.take_changes().is_empty() {
            batch.dirty = true;
        }
        if !batch.dirty || self.matches_current_entry() {
            log::debug!("batch {:?} left the scene unchanged", batch.label);
            return Ok(false);
        }
        self.history.commit(&self.scene, batch.label)
    }

    /// Whether the scene is byte-identical to the entry under the pointer.
    fn matches_current_entry(&self) -> bool {
        let current = self.history.pointer().and_then(|p| self.history.snapshot(p));
        match (current, self.scene.serialize()) {
            (Some(current), Ok(now)) => *current == now,
            _ => false,
        }
    }

    /// Record anything still pending before the pointer moves. A state
    /// that cannot be captured is logged and dropped; it does not block
    /// navigation.
    fn settle(&mut self) {
        let settled = if self.batch.is_some() {
            self.close_batch()
        } else {
            self.flush()
        };
        if let Err(err) = settled {
            log::warn!("pending edits dropped: {err}");
        }
    }

    // ─── Navigation ──────────────────────────────────────────────────────

    /// Undo one step. See [`HistoryEngine::undo`].
    pub fn undo(&mut self) -> Result<Option<String>, HistoryError> {
        self.settle();
        self.history.undo(&mut self.scene)
    }

    /// Redo one step. See [`HistoryEngine::redo`].
    pub fn redo(&mut self) -> Result<Option<String>, HistoryError> {
        self.settle();
        self.history.redo(&mut self.scene)
    }

    /// Restore the entry at `index`, as listed by
    /// [`HistoryEngine::entries`]. See [`HistoryEngine::jump_to`].
    pub fn jump_to(&mut self, index: usize) -> Result<(), HistoryError> {
        self.settle();
        self.history.jump_to(&mut self.scene, index)
    }

    /// Open another document in this session. The history is discarded and
    /// restarted from the new scene; the previous scene is handed back.
    ///
    /// # Errors
    /// [`HistoryError::SerializationFailed`] if the new scene cannot be
    /// captured. The session keeps its current document and history.
    pub fn replace_document(&mut self, mut scene: S) -> Result<S, HistoryError> {
        scene.take_changes();
        let snapshot = scene.serialize().map_err(|err| {
            log::warn!("document rejected: {err}");
            HistoryError::SerializationFailed(err)
        })?;

        let previous = std::mem::replace(&mut self.scene, scene);
        self.batch = None;
        self.selection.clear();
        self.history.reset(snapshot, OPEN_DOCUMENT);
        Ok(previous)
    }
}

// ─── Canvas operations ───────────────────────────────────────────────────

impl EditorSession<Canvas> {
    /// Apply one mutation and record it.
    pub fn apply(&mut self, mutation: SceneMutation) -> Result<bool, HistoryError> {
        self.edit(|canvas| canvas.apply(mutation))
    }

    /// Make `id` the selection. Returns `false` if there is no such entity.
    pub fn select(&mut self, id: EntityId) -> bool {
        if !self.scene.contains(id) {
            return false;
        }
        self.selection = vec![id];
        true
    }

    /// Select every top-level entity. Returns how many were selected.
    pub fn select_all(&mut self) -> usize {
        self.selection = self
            .scene
            .document()
            .entities
            .into_iter()
            .filter(|record| record.parent.is_none())
            .map(|record| record.entity.id)
            .collect();
        self.selection.len()
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn deselect(&mut self) -> bool {
        let had_selection = !self.selected().is_empty();
        self.selection.clear();
        had_selection
    }

    /// Selected entities that still exist. Undo can remove an entity out
    /// from under the selection.
    pub fn selected(&self) -> Vec<EntityId> {
        self.selection
            .iter()
            .copied()
            .filter(|id| self.scene.contains(*id))
            .collect()
    }

    /// Copy the selection (with descendants) to the clipboard.
    /// Returns how many objects were copied.
    pub fn copy(&mut self) -> usize {
        let ids = self.selected();
        if ids.is_empty() {
            return 0;
        }
        let document = self.scene.document();
        self.clipboard = ids
            .into_iter()
            .map(|id| subtree_records(&document, id))
            .filter(|records| !records.is_empty())
            .collect();
        self.clipboard.len()
    }

    /// Copy the selection, then delete it.
    pub fn cut(&mut self) -> Result<bool, HistoryError> {
        if self.copy() == 0 {
            return Ok(false);
        }
        self.delete_selected()
    }

    /// Insert the clipboard contents, offset from where they were copied.
    /// The pasted objects become the selection.
    pub fn paste(&mut self) -> Result<bool, HistoryError> {
        if self.clipboard.is_empty() {
            return Ok(false);
        }
        let groups = self.clipboard.clone();
        self.insert_copies(&groups)
    }

    /// Paste a copy of the selection without touching the clipboard.
    pub fn duplicate(&mut self) -> Result<bool, HistoryError> {
        let ids = self.selected();
        if ids.is_empty() {
            return Ok(false);
        }
        let document = self.scene.document();
        let groups: Vec<_> = ids
            .into_iter()
            .map(|id| subtree_records(&document, id))
            .collect();
        self.insert_copies(&groups)
    }

    fn insert_copies(&mut self, groups: &[Vec<EntityRecord>]) -> Result<bool, HistoryError> {
        let roots = self.edit(|canvas| {
            let mut roots = Vec::with_capacity(groups.len());
            for records in groups {
                let mut renamed: HashMap<EntityId, EntityId> = HashMap::new();
                for (i, record) in records.iter().enumerate() {
                    let mut entity = record.entity.clone();
                    let fresh = EntityId::with_prefix(entity.kind.type_name());
                    renamed.insert(entity.id, fresh);
                    entity.id = fresh;

                    // The copied object lands at top level; its descendants
                    // follow it under their renamed parents.
                    let parent = if i == 0 {
                        entity.transform.x += PASTE_OFFSET;
                        entity.transform.y += PASTE_OFFSET;
                        None
                    } else {
                        record.parent.and_then(|p| renamed.get(&p).copied())
                    };
                    let added = canvas.apply(SceneMutation::AddEntity {
                        parent,
                        entity: Box::new(entity),
                    });
                    if added && i == 0 {
                        roots.push(fresh);
                    }
                }
            }
            roots
        })?;

        if roots.is_empty() {
            return Ok(false);
        }
        self.selection = roots;
        Ok(true)
    }

    /// Remove the selected entities (and their descendants).
    pub fn delete_selected(&mut self) -> Result<bool, HistoryError> {
        let changed = self.apply_to_selection(|_, id| Some(SceneMutation::RemoveEntity { id }))?;
        self.selection.clear();
        Ok(changed)
    }

    /// Rotate every selected entity by `degrees` on top of its current angle.
    pub fn rotate_selected(&mut self, degrees: f32) -> Result<bool, HistoryError> {
        self.apply_to_selection(|canvas, id| {
            let angle = canvas.get(id)?.transform.angle + degrees;
            Some(SceneMutation::RotateEntity { id, angle })
        })
    }

    pub fn flip_selected(&mut self, axis: Axis) -> Result<bool, HistoryError> {
        self.apply_to_selection(|_, id| Some(SceneMutation::FlipEntity { id, axis }))
    }

    pub fn reorder_selected(&mut self, order: ZOrder) -> Result<bool, HistoryError> {
        self.apply_to_selection(|_, id| Some(SceneMutation::Reorder { id, order }))
    }

    /// Apply one mutation per selected entity as a single history entry.
    fn apply_to_selection(
        &mut self,
        mutation_for: impl Fn(&Canvas, EntityId) -> Option<SceneMutation>,
    ) -> Result<bool, HistoryError> {
        let ids = self.selected();
        if ids.is_empty() {
            return Ok(false);
        }
        self.edit(|canvas| {
            let mut changed = false;
            for id in ids {
                if let Some(mutation) = mutation_for(canvas, id) {
                    changed |= canvas.apply(mutation);
                }
            }
            changed
        })
    }

    /// Execute a resolved keyboard shortcut. Returns whether it did anything.
    pub fn dispatch(&mut self, action: ShortcutAction) -> Result<bool, HistoryError> {
        log::debug!("dispatch {action:?}");
        match action {
            ShortcutAction::Undo => Ok(self.undo()?.is_some()),
            ShortcutAction::Redo => Ok(self.redo()?.is_some()),
            ShortcutAction::Copy => Ok(self.copy() > 0),
            ShortcutAction::Cut => self.cut(),
            ShortcutAction::Paste => self.paste(),
            ShortcutAction::Duplicate => self.duplicate(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::SelectAll => Ok(self.select_all() > 0),
            ShortcutAction::Deselect => Ok(self.deselect()),
            ShortcutAction::SendBackward => self.reorder_selected(ZOrder::Backward),
            ShortcutAction::BringForward => self.reorder_selected(ZOrder::Forward),
            ShortcutAction::SendToBack => self.reorder_selected(ZOrder::ToBack),
            ShortcutAction::BringToFront => self.reorder_selected(ZOrder::ToFront),
        }
    }
}

/// `id` and all its descendants, in document (pre-)order.
fn subtree_records(document: &SceneDocument, id: EntityId) -> Vec<EntityRecord> {
    let mut members = HashSet::new();
    let mut records = Vec::new();
    for record in &document.entities {
        let inside = record.entity.id == id || record.parent.is_some_and(|p| members.contains(&p));
        if inside {
            members.insert(record.entity.id);
            records.push(record.clone());
        }
    }
    records
}
