//! Canvas mutations: the tool layer's only way to change a scene.
//!
//! Each applied mutation queues the `SceneChange` a history recorder needs
//! to see. Mutations that name a missing entity or layer, or that would
//! not change anything (reordering an entity already at the front), are
//! no-ops: `apply` returns `false` and nothing is queued. Geometry edits
//! (move, resize, rotate, flip) are also refused on locked entities.

use crate::canvas::{Canvas, ZOrder, shift};
use crate::id::EntityId;
use crate::model::{Color, Entity, EntityKind, Layer, PathCmd, Style};
use crate::scene::SceneChange;

/// Mirror axis for [`SceneMutation::FlipEntity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A change to the canvas, as issued by tools and panels.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneMutation {
    /// Add an entity in front of its new siblings. `parent: None` = top level.
    AddEntity {
        parent: Option<EntityId>,
        entity: Box<Entity>,
    },
    /// Remove an entity together with its descendants.
    RemoveEntity { id: EntityId },
    MoveEntity { id: EntityId, dx: f32, dy: f32 },
    ResizeEntity {
        id: EntityId,
        width: f32,
        height: f32,
    },
    /// Set the absolute rotation in degrees.
    RotateEntity { id: EntityId, angle: f32 },
    FlipEntity { id: EntityId, axis: Axis },
    /// Set opacity, clamped to `[0, 1]`.
    SetOpacity { id: EntityId, opacity: f32 },
    SetStyle { id: EntityId, style: Style },
    SetText { id: EntityId, content: String },
    UpdatePath {
        id: EntityId,
        commands: Vec<PathCmd>,
    },
    SetVisibility { id: EntityId, visible: bool },
    SetLocked { id: EntityId, locked: bool },
    Reorder { id: EntityId, order: ZOrder },
    ResizeCanvas { width: u32, height: u32 },
    SetBackground { color: Color },
    AddLayer { layer: Layer },
    /// Remove a layer; its entities stay on the canvas, unassigned.
    /// The last remaining layer cannot be removed.
    RemoveLayer { id: EntityId },
    /// Replace a layer's name and flags, matched by id.
    UpdateLayer { layer: Layer },
    /// Move a layer within the layer list. The end of the list is the top.
    MoveLayer { id: EntityId, order: ZOrder },
    /// Insert a visible, unlocked copy named "<name> Copy" right above the
    /// layer. Entities keep their own layer; the copy starts empty.
    DuplicateLayer { id: EntityId },
}

impl Canvas {
    /// Apply a mutation and queue its notifications.
    /// Returns whether the canvas changed.
    pub fn apply(&mut self, mutation: SceneMutation) -> bool {
        log::trace!("apply {mutation:?}");
        match mutation {
            SceneMutation::AddEntity { parent, entity } => self.add_entity(parent, *entity),
            SceneMutation::RemoveEntity { id } => {
                let Some(idx) = self.index_of(id).filter(|idx| *idx != self.root()) else {
                    return false;
                };
                self.remove_subtree(idx);
                self.notify(SceneChange::Removed(id));
                true
            }
            SceneMutation::MoveEntity { id, dx, dy } => self.modify_geometry(id, |e| {
                e.transform.x += dx;
                e.transform.y += dy;
                true
            }),
            SceneMutation::ResizeEntity { id, width, height } => {
                self.modify_geometry(id, |e| match &mut e.kind {
                    EntityKind::Rect {
                        width: w,
                        height: h,
                        ..
                    }
                    | EntityKind::Image {
                        width: w,
                        height: h,
                        ..
                    } => {
                        *w = width;
                        *h = height;
                        true
                    }
                    EntityKind::Ellipse { rx, ry } => {
                        *rx = width / 2.0;
                        *ry = height / 2.0;
                        true
                    }
                    EntityKind::Line { x2, y2 } => {
                        *x2 = width;
                        *y2 = height;
                        true
                    }
                    _ => false,
                })
            }
            SceneMutation::RotateEntity { id, angle } => self.modify_geometry(id, |e| {
                e.transform.angle = angle.rem_euclid(360.0);
                true
            }),
            SceneMutation::FlipEntity { id, axis } => self.modify_geometry(id, |e| {
                match axis {
                    Axis::Horizontal => e.transform.flip_x = !e.transform.flip_x,
                    Axis::Vertical => e.transform.flip_y = !e.transform.flip_y,
                }
                true
            }),
            SceneMutation::SetOpacity { id, opacity } => self.modify(id, |e| {
                e.opacity = opacity.clamp(0.0, 1.0);
                true
            }),
            SceneMutation::SetStyle { id, style } => self.modify(id, |e| {
                e.style = style;
                true
            }),
            SceneMutation::SetText { id, content } => self.modify(id, |e| match &mut e.kind {
                EntityKind::Text { content: c, .. } => {
                    *c = content;
                    true
                }
                _ => false,
            }),
            SceneMutation::UpdatePath { id, commands } => self.modify(id, |e| match &mut e.kind {
                EntityKind::Path { commands: cmds } => {
                    *cmds = commands;
                    true
                }
                _ => false,
            }),
            SceneMutation::SetVisibility { id, visible } => self.modify(id, |e| {
                e.visible = visible;
                true
            }),
            SceneMutation::SetLocked { id, locked } => self.modify(id, |e| {
                e.locked = locked;
                true
            }),
            SceneMutation::Reorder { id, order } => {
                let Some(idx) = self.index_of(id).filter(|idx| *idx != self.root()) else {
                    return false;
                };
                let changed = self.move_in_siblings(idx, order);
                if changed {
                    self.notify(SceneChange::Reordered(id));
                }
                changed
            }
            SceneMutation::ResizeCanvas { width, height } => {
                self.set_size(width, height);
                self.notify(SceneChange::CanvasResized);
                true
            }
            SceneMutation::SetBackground { color } => {
                self.set_background_color(color);
                self.notify(SceneChange::BackgroundChanged);
                true
            }
            SceneMutation::AddLayer { layer } => {
                if self.layers().iter().any(|l| l.id == layer.id) {
                    return false;
                }
                self.layers_mut().push(layer);
                self.notify(SceneChange::LayersChanged);
                true
            }
            SceneMutation::RemoveLayer { id } => {
                if self.layers().len() <= 1 {
                    log::debug!("refusing to remove the last layer");
                    return false;
                }
                let before = self.layers().len();
                self.layers_mut().retain(|l| l.id != id);
                if self.layers().len() == before {
                    return false;
                }
                let mut orphaned = Vec::new();
                for entity in self.entities_mut() {
                    if entity.layer == Some(id) {
                        entity.layer = None;
                        orphaned.push(entity.id);
                    }
                }
                for entity_id in orphaned {
                    self.notify(SceneChange::Modified(entity_id));
                }
                self.notify(SceneChange::LayersChanged);
                true
            }
            SceneMutation::UpdateLayer { layer } => {
                let Some(slot) = self.layers_mut().iter_mut().find(|l| l.id == layer.id) else {
                    return false;
                };
                *slot = layer;
                self.notify(SceneChange::LayersChanged);
                true
            }
            SceneMutation::MoveLayer { id, order } => {
                let Some(pos) = self.layers().iter().position(|l| l.id == id) else {
                    return false;
                };
                let changed = shift(self.layers_mut(), pos, order);
                if changed {
                    self.notify(SceneChange::LayersChanged);
                }
                changed
            }
            SceneMutation::DuplicateLayer { id } => {
                let Some(pos) = self.layers().iter().position(|l| l.id == id) else {
                    return false;
                };
                let copy = Layer::new(&format!("{} Copy", self.layers()[pos].name));
                self.layers_mut().insert(pos + 1, copy);
                self.notify(SceneChange::LayersChanged);
                true
            }
        }
    }

    fn add_entity(&mut self, parent: Option<EntityId>, entity: Entity) -> bool {
        let id = entity.id;
        if self.index_of(id).is_some() || matches!(entity.kind, EntityKind::Root) {
            log::warn!("cannot add {id}: id already in use or reserved");
            return false;
        }
        let parent_idx = match parent {
            None => self.root(),
            Some(pid) => match self.index_of(pid) {
                Some(idx) => idx,
                None => return false,
            },
        };
        if !self.can_hold_children(parent_idx) {
            log::warn!("cannot add {id}: parent is not a group");
            return false;
        }
        self.insert(parent_idx, entity);
        self.notify(SceneChange::Added(id));
        true
    }

    /// Run `f` on an entity; queue `Modified` if it reports a change.
    fn modify(&mut self, id: EntityId, f: impl FnOnce(&mut Entity) -> bool) -> bool {
        let changed = self.get_mut(id).is_some_and(f);
        if changed {
            self.notify(SceneChange::Modified(id));
        }
        changed
    }

    /// Like `modify`, but refuses locked entities.
    fn modify_geometry(&mut self, id: EntityId, f: impl FnOnce(&mut Entity) -> bool) -> bool {
        if self.get(id).is_some_and(|e| e.locked) {
            log::debug!("{id} is locked; ignoring geometry edit");
            return false;
        }
        self.modify(id, f)
    }
}
