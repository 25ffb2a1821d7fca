//! The contract between a mutable scene and whoever records its history.

use crate::error::SceneError;
use crate::id::EntityId;
use crate::snapshot::Snapshot;
use smallvec::SmallVec;

/// A structural change notification queued by a scene after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Added(EntityId),
    Removed(EntityId),
    Modified(EntityId),
    Reordered(EntityId),
    CanvasResized,
    BackgroundChanged,
    LayersChanged,
    /// The whole scene was replaced from a snapshot.
    Restored,
}

impl SceneChange {
    /// Human-readable label for a history list entry.
    pub fn label(&self) -> &'static str {
        match self {
            SceneChange::Added(_) => "Object Added",
            SceneChange::Removed(_) => "Object Removed",
            SceneChange::Modified(_) => "Object Modified",
            SceneChange::Reordered(_) => "Object Reordered",
            SceneChange::CanvasResized => "Canvas Resized",
            SceneChange::BackgroundChanged => "Background Changed",
            SceneChange::LayersChanged => "Layers Changed",
            SceneChange::Restored => "Scene Restored",
        }
    }

    /// The entity this change concerns, if any.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            SceneChange::Added(id)
            | SceneChange::Removed(id)
            | SceneChange::Modified(id)
            | SceneChange::Reordered(id) => Some(*id),
            _ => None,
        }
    }
}

/// A mutable object graph whose full state can be captured and restored.
///
/// Implementors queue a [`SceneChange`] for every structural mutation,
/// including the replacement performed by [`Scene::restore`]; consumers
/// drain the queue with [`Scene::take_changes`].
pub trait Scene {
    /// Capture the complete current state.
    fn serialize(&self) -> Result<Snapshot, SceneError>;

    /// Replace the complete current state with the one in `snapshot`.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SceneError>;

    /// Drain pending change notifications, oldest first.
    fn take_changes(&mut self) -> SmallVec<[SceneChange; 4]>;
}
