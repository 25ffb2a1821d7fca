//! Snapshot-based undo/redo history.
//!
//! Every commit captures the full scene as a [`Snapshot`]; undo and redo
//! move a cursor through the log and restore the scene from the entry it
//! lands on. There is no inverse-mutation chain: a step is always a whole
//! scene state, so any mutation the scene supports is undoable.
//!
//! The log is linear. Committing after an undo discards the redo-able
//! future, and once the log holds `max_steps` entries the oldest one is
//! evicted on every commit.

use crate::error::HistoryError;
use std::collections::VecDeque;
use vc_core::{Scene, SceneChange, Snapshot};

/// Default capacity of the history log.
pub const DEFAULT_MAX_STEPS: usize = 50;

/// Whether the engine is currently restoring the scene.
///
/// Commits are only effective in `Idle`. While `Restoring`, notifications
/// raised by the scene's own restore are absorbed instead of recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Restoring,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    snapshot: Snapshot,
    label: String,
}

/// Read-only view of one log entry, for rendering a history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryView<'a> {
    pub index: usize,
    pub label: &'a str,
    pub is_current: bool,
}

/// Bounded log of scene snapshots plus a cursor into it.
#[derive(Debug)]
pub struct HistoryEngine {
    entries: VecDeque<HistoryEntry>,
    /// `None` only while the log is empty.
    pointer: Option<usize>,
    max_steps: usize,
    mode: Mode,
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl HistoryEngine {
    /// Create an empty log holding at most `max_steps` entries.
    /// A capacity of zero is raised to one.
    pub fn new(max_steps: usize) -> Self {
        let max_steps = if max_steps == 0 {
            log::warn!("history capacity 0 is not usable, using 1");
            1
        } else {
            max_steps
        };
        Self {
            entries: VecDeque::with_capacity(max_steps.min(DEFAULT_MAX_STEPS) + 1),
            pointer: None,
            max_steps,
            mode: Mode::Idle,
        }
    }

    // ─── Recording ───────────────────────────────────────────────────────

    /// Capture the current scene as a new entry.
    ///
    /// Drops every entry after the pointer, appends the snapshot, and evicts
    /// the oldest entry if the log is over capacity. Returns `Ok(false)`
    /// without touching the log while a restore is in progress.
    ///
    /// # Errors
    /// [`HistoryError::SerializationFailed`] if the scene cannot be
    /// captured. The log is left exactly as it was.
    pub fn commit<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        label: impl Into<String>,
    ) -> Result<bool, HistoryError> {
        let label = label.into();
        if self.mode == Mode::Restoring {
            log::trace!("commit {label:?} suppressed while restoring");
            return Ok(false);
        }

        let snapshot = scene.serialize().map_err(|err| {
            log::warn!("commit {label:?} failed: {err}");
            HistoryError::SerializationFailed(err)
        })?;
        self.push(snapshot, label);
        Ok(true)
    }

    /// Discard the log and start it again from `snapshot`, already captured
    /// by the caller.
    pub fn reset(&mut self, snapshot: Snapshot, label: impl Into<String>) {
        self.clear();
        self.push(snapshot, label.into());
    }

    fn push(&mut self, snapshot: Snapshot, label: String) {
        let keep = self.pointer.map_or(0, |p| p + 1);
        if keep < self.entries.len() {
            log::debug!("discarding {} redo entries", self.entries.len() - keep);
            self.entries.truncate(keep);
        }

        log::debug!("commit {label:?} ({} bytes)", snapshot.len());
        self.entries.push_back(HistoryEntry { snapshot, label });
        if self.entries.len() > self.max_steps {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("evicted oldest entry {:?}", evicted.label);
            }
        }
        self.pointer = Some(self.entries.len() - 1);
    }

    /// Handle one scene change notification: commit it under the change's
    /// label unless a restore is in progress.
    pub fn on_scene_change<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        change: &SceneChange,
    ) -> Result<bool, HistoryError> {
        if self.mode == Mode::Restoring {
            log::trace!("ignoring {change:?} raised by restore");
            return Ok(false);
        }
        self.commit(scene, change.label())
    }

    // ─── Navigation ──────────────────────────────────────────────────────

    /// Step back one entry. Returns the label of the step that was undone,
    /// or `None` when already at the oldest entry.
    ///
    /// # Errors
    /// [`HistoryError::RestoreFailed`] if the older snapshot cannot be
    /// applied. The pointer does not move.
    pub fn undo<S: Scene + ?Sized>(&mut self, scene: &mut S) -> Result<Option<String>, HistoryError> {
        let Some(current) = self.pointer.filter(|&p| p > 0) else {
            log::debug!("nothing to undo");
            return Ok(None);
        };
        let label = self.entries[current].label.clone();
        self.restore_to(scene, current - 1)?;
        log::debug!("undo {label:?}");
        Ok(Some(label))
    }

    /// Step forward one entry. Returns the label of the step that was
    /// redone, or `None` when already at the newest entry.
    ///
    /// # Errors
    /// [`HistoryError::RestoreFailed`] if the newer snapshot cannot be
    /// applied. The pointer does not move.
    pub fn redo<S: Scene + ?Sized>(&mut self, scene: &mut S) -> Result<Option<String>, HistoryError> {
        let Some(next) = self
            .pointer
            .map(|p| p + 1)
            .filter(|&n| n < self.entries.len())
        else {
            log::debug!("nothing to redo");
            return Ok(None);
        };
        let label = self.entries[next].label.clone();
        self.restore_to(scene, next)?;
        log::debug!("redo {label:?}");
        Ok(Some(label))
    }

    /// Restore the scene to the entry at `index`.
    ///
    /// # Errors
    /// [`HistoryError::InvalidHistoryIndex`] when `index` is out of range
    /// (nothing changes), or [`HistoryError::RestoreFailed`].
    pub fn jump_to<S: Scene + ?Sized>(&mut self, scene: &mut S, index: usize) -> Result<(), HistoryError> {
        if index >= self.entries.len() {
            return Err(HistoryError::InvalidHistoryIndex {
                index,
                len: self.entries.len(),
            });
        }
        self.restore_to(scene, index)?;
        log::debug!("jumped to entry {index}");
        Ok(())
    }

    /// Apply the snapshot at `target` with commits suppressed, and move the
    /// pointer only once the restore succeeded.
    fn restore_to<S: Scene + ?Sized>(&mut self, scene: &mut S, target: usize) -> Result<(), HistoryError> {
        let snapshot = self.entries[target].snapshot.clone();

        self.mode = Mode::Restoring;
        let result = scene.restore(&snapshot);
        // Changes raised by the restore itself are never recorded.
        let raised = scene.take_changes();
        if !raised.is_empty() {
            log::trace!("dropped {} change(s) raised by restore", raised.len());
        }
        self.mode = Mode::Idle;

        result.map_err(|source| {
            log::warn!("restore of entry {target} failed: {source}");
            HistoryError::RestoreFailed {
                index: target,
                source,
            }
        })?;
        self.pointer = Some(target);
        Ok(())
    }

    /// Discard the whole log, e.g. when another document is opened.
    pub fn clear(&mut self) {
        log::debug!("history cleared ({} entries)", self.entries.len());
        self.entries.clear();
        self.pointer = None;
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.pointer.is_some_and(|p| p > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.pointer.is_some_and(|p| p + 1 < self.entries.len())
    }

    /// Index of the current entry; `None` while the log is empty.
    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Label of the entry the pointer is on.
    pub fn current_label(&self) -> Option<&str> {
        self.pointer.map(|p| self.entries[p].label.as_str())
    }

    /// Snapshot stored at `index`.
    pub fn snapshot(&self, index: usize) -> Option<&Snapshot> {
        self.entries.get(index).map(|entry| &entry.snapshot)
    }

    /// Entries oldest first, for the history list.
    pub fn entries(&self) -> impl Iterator<Item = EntryView<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(move |(index, entry)| EntryView {
                index,
                label: &entry.label,
                is_current: self.pointer == Some(index),
            })
    }
}
