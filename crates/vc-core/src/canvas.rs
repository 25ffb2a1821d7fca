//! The canvas scene graph.
//!
//! Entities live in a `StableDiGraph` with edges going parent → child.
//! Sibling order is kept explicitly per parent (back to front), which is
//! the z-order the renderer paints in. All mutation goes through
//! [`Canvas::apply`](crate::mutation), which queues the `SceneChange`
//! notifications consumed by the history engine.

use crate::error::SceneError;
use crate::id::EntityId;
use crate::model::{Color, Entity, EntityKind, Layer};
use crate::scene::{Scene, SceneChange};
use crate::snapshot::{self, EntityRecord, SNAPSHOT_VERSION, SceneDocument, Snapshot, SnapshotFormat};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// A drawable document: entities, z-order, dimensions, background, layers.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The underlying directed graph.
    graph: StableDiGraph<Entity, ()>,

    /// The root node index.
    root: NodeIndex,

    /// Index from EntityId → NodeIndex for fast lookup.
    id_index: HashMap<EntityId, NodeIndex>,

    /// Children of each parent, back to front.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,

    width: u32,
    height: u32,
    background: Color,
    layers: Vec<Layer>,

    /// Encoding used by `serialize`.
    format: SnapshotFormat,

    /// Notifications not yet drained by `take_changes`.
    pending: SmallVec<[SceneChange; 4]>,
}

impl Canvas {
    /// Create an empty canvas with a root node.
    #[must_use]
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Entity::new(EntityId::root(), EntityKind::Root));

        let mut id_index = HashMap::new();
        id_index.insert(EntityId::root(), root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
            width,
            height,
            background,
            layers: Vec::new(),
            format: SnapshotFormat::default(),
            pending: SmallVec::new(),
        }
    }

    /// Use `format` for every snapshot this canvas produces.
    #[must_use]
    pub fn with_format(mut self, format: SnapshotFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of entities, not counting the root.
    pub fn entity_count(&self) -> usize {
        self.graph.node_count() - 1
    }

    /// Look up an entity by id. The root is not an entity.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id)
            .filter(|idx| *idx != self.root)
            .map(|idx| &self.graph[idx])
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn index_of(&self, id: EntityId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Parent of an entity; `None` for top-level entities and unknown ids.
    pub fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.index_of(id)
            .and_then(|idx| self.parent(idx))
            .filter(|pidx| *pidx != self.root)
            .map(|pidx| self.graph[pidx].id)
    }

    /// Children of a node, back to front.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order
            .get(&idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every entity id in paint order (pre-order, back to front).
    pub fn z_order(&self) -> Vec<EntityId> {
        self.document()
            .entities
            .into_iter()
            .map(|record| record.entity.id)
            .collect()
    }

    /// Flatten the canvas into its snapshot document.
    pub fn document(&self) -> SceneDocument {
        let mut entities = Vec::with_capacity(self.entity_count());
        self.collect_records(self.root, None, &mut entities);
        SceneDocument {
            version: SNAPSHOT_VERSION,
            width: self.width,
            height: self.height,
            background: self.background,
            layers: self.layers.clone(),
            entities,
        }
    }

    fn collect_records(&self, idx: NodeIndex, parent: Option<EntityId>, out: &mut Vec<EntityRecord>) {
        for &child in self.children(idx) {
            let entity = &self.graph[child];
            out.push(EntityRecord {
                parent,
                entity: entity.clone(),
            });
            self.collect_records(child, Some(entity.id), out);
        }
    }

    /// Rebuild a canvas from a decoded document.
    ///
    /// # Errors
    /// Returns [`SceneError::Malformed`] when the document lists a root
    /// entity, repeats an id, or references a parent that is missing or
    /// cannot hold children.
    pub fn from_document(document: SceneDocument) -> Result<Self, SceneError> {
        let mut canvas = Canvas::new(document.width, document.height, document.background);
        canvas.layers = document.layers;

        for record in document.entities {
            let id = record.entity.id;
            if matches!(record.entity.kind, EntityKind::Root) {
                return Err(SceneError::Malformed(format!("{id} is a second root")));
            }
            if canvas.id_index.contains_key(&id) {
                return Err(SceneError::Malformed(format!("duplicate entity {id}")));
            }
            let parent = match record.parent {
                None => canvas.root,
                Some(pid) => canvas.index_of(pid).ok_or_else(|| {
                    SceneError::Malformed(format!("{id} references unknown parent {pid}"))
                })?,
            };
            if !canvas.can_hold_children(parent) {
                return Err(SceneError::Malformed(format!(
                    "{id} is nested under non-group {}",
                    canvas.graph[parent].id
                )));
            }
            canvas.insert(parent, record.entity);
        }

        Ok(canvas)
    }

    /// Remove every entity. Queues one `Removed` per top-level entity.
    pub fn clear(&mut self) {
        let top_level = self.children(self.root).to_vec();
        for idx in top_level {
            let id = self.graph[idx].id;
            self.remove_subtree(idx);
            self.notify(SceneChange::Removed(id));
        }
    }

    // ─── Internal graph maintenance ──────────────────────────────────────

    pub(crate) fn can_hold_children(&self, idx: NodeIndex) -> bool {
        matches!(self.graph[idx].kind, EntityKind::Root | EntityKind::Group)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let idx = self.index_of(id).filter(|idx| *idx != self.root)?;
        Some(&mut self.graph[idx])
    }

    pub(crate) fn layers_mut(&mut self) -> &mut Vec<Layer> {
        &mut self.layers
    }

    pub(crate) fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub(crate) fn set_background_color(&mut self, color: Color) {
        self.background = color;
    }

    pub(crate) fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.graph
            .node_weights_mut()
            .filter(|e| !matches!(e.kind, EntityKind::Root))
    }

    /// Add `entity` as the front-most child of `parent`.
    pub(crate) fn insert(&mut self, parent: NodeIndex, entity: Entity) -> NodeIndex {
        let id = entity.id;
        let idx = self.graph.add_node(entity);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        self.child_order.entry(parent).or_default().push(idx);
        idx
    }

    /// Remove a node and all its descendants, keeping indices in sync.
    /// Returns the removed ids, the node itself first.
    pub(crate) fn remove_subtree(&mut self, idx: NodeIndex) -> Vec<EntityId> {
        if let Some(parent) = self.parent(idx)
            && let Some(siblings) = self.child_order.get_mut(&parent)
        {
            siblings.retain(|&s| s != idx);
        }

        let mut removed = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(children) = self.child_order.remove(&current) {
                stack.extend(children);
            }
            if let Some(entity) = self.graph.remove_node(current) {
                self.id_index.remove(&entity.id);
                removed.push(entity.id);
            }
        }
        removed
    }

    /// Move a node within its sibling list. Returns true if the order changed.
    pub(crate) fn move_in_siblings(&mut self, idx: NodeIndex, order: ZOrder) -> bool {
        let Some(parent) = self.parent(idx) else {
            return false;
        };
        let Some(siblings) = self.child_order.get_mut(&parent) else {
            return false;
        };
        let Some(pos) = siblings.iter().position(|&s| s == idx) else {
            return false;
        };
        shift(siblings, pos, order)
    }

    pub(crate) fn notify(&mut self, change: SceneChange) {
        log::trace!("scene change: {change:?}");
        self.pending.push(change);
    }
}

/// Move `items[pos]` one step or to an end. `false` if it is already there.
pub(crate) fn shift<T>(items: &mut Vec<T>, pos: usize, order: ZOrder) -> bool {
    let last = items.len().saturating_sub(1);
    let target = match order {
        ZOrder::Backward if pos > 0 => pos - 1,
        ZOrder::Forward if pos < last => pos + 1,
        ZOrder::ToBack if pos > 0 => 0,
        ZOrder::ToFront if pos < last => last,
        _ => return false, // already at that end
    };
    let item = items.remove(pos);
    items.insert(target, item);
    true
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, Color::WHITE)
    }
}

/// Z-order moves within a parent's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    /// One step toward the back (swap with previous sibling).
    Backward,
    /// One step toward the front (swap with next sibling).
    Forward,
    ToBack,
    ToFront,
}

impl Scene for Canvas {
    fn serialize(&self) -> Result<Snapshot, SceneError> {
        if !self.background.is_finite() {
            return Err(SceneError::CorruptEntity {
                id: EntityId::root(),
                reason: "background color is not finite".into(),
            });
        }
        let document = self.document();
        if let Some(bad) = document.entities.iter().find(|r| !r.entity.is_finite()) {
            log::warn!("refusing to serialize {}: non-finite attribute", bad.entity.id);
            return Err(SceneError::CorruptEntity {
                id: bad.entity.id,
                reason: "numeric attribute is NaN or infinite".into(),
            });
        }
        snapshot::encode(&document, self.format)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SceneError> {
        // Build the replacement completely before touching `self`, so a
        // bad snapshot leaves the canvas as it was.
        let document = snapshot::decode(snapshot)?;
        let mut rebuilt = Canvas::from_document(document)?;
        rebuilt.format = self.format;
        rebuilt.pending = std::mem::take(&mut self.pending);
        *self = rebuilt;
        self.notify(SceneChange::Restored);
        Ok(())
    }

    fn take_changes(&mut self) -> SmallVec<[SceneChange; 4]> {
        std::mem::take(&mut self.pending)
    }
}
