//! Integration tests: history engine driving a real canvas (vc-editor).
//!
//! Covers the worked scenarios of the history log, failure semantics for
//! capture and restore, and the guarantee that restores are never
//! recorded as new entries.

use pretty_assertions::assert_eq;
use vc_core::*;
use vc_editor::{EditorConfig, EditorSession, HistoryEngine, HistoryError, Mode, ShortcutMap};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn add(canvas: &mut Canvas, entity: Entity) -> EntityId {
    let id = entity.id;
    assert!(canvas.apply(SceneMutation::AddEntity {
        parent: None,
        entity: Box::new(entity),
    }));
    id
}

fn labels(history: &HistoryEngine) -> Vec<String> {
    history.entries().map(|e| e.label.to_string()).collect()
}

// ─── Worked scenarios ───────────────────────────────────────────────────

#[test]
fn commit_then_undo_and_redo() {
    init_logger();
    let mut canvas = Canvas::default();
    let mut history = HistoryEngine::new(50);
    assert_eq!(history.pointer(), None);

    let rect = add(&mut canvas, Entity::rect("a_rect", 100.0, 50.0));
    history.commit(&canvas, "rect added").unwrap();
    assert_eq!((history.len(), history.pointer()), (1, Some(0)));

    let circle = add(&mut canvas, Entity::ellipse("a_circle", 25.0, 25.0));
    history.commit(&canvas, "circle added").unwrap();
    assert_eq!((history.len(), history.pointer()), (2, Some(1)));

    history.undo(&mut canvas).unwrap();
    assert_eq!(history.pointer(), Some(0));
    assert_eq!(canvas.z_order(), vec![rect]);

    history.redo(&mut canvas).unwrap();
    assert_eq!(history.pointer(), Some(1));
    assert_eq!(canvas.z_order(), vec![rect, circle]);
}

#[test]
fn commit_after_undo_discards_future() {
    init_logger();
    let mut canvas = Canvas::default();
    let mut history = HistoryEngine::new(50);

    history.commit(&canvas, "S0").unwrap();
    add(&mut canvas, Entity::rect("b_one", 10.0, 10.0));
    history.commit(&canvas, "S1").unwrap();
    add(&mut canvas, Entity::rect("b_two", 10.0, 10.0));
    history.commit(&canvas, "S2").unwrap();
    assert_eq!((history.len(), history.pointer()), (3, Some(2)));

    history.undo(&mut canvas).unwrap();
    history.undo(&mut canvas).unwrap();
    assert_eq!(history.pointer(), Some(0));
    assert_eq!(canvas.entity_count(), 0);

    let text = add(&mut canvas, Entity::text("b_text", "hello"));
    history.commit(&canvas, "text added").unwrap();
    assert_eq!(labels(&history), vec!["S0", "text added"]);
    assert_eq!((history.len(), history.pointer()), (2, Some(1)));
    assert!(!history.can_redo());
    assert_eq!(canvas.z_order(), vec![text]);
}

#[test]
fn oldest_entry_evicted_at_capacity() {
    init_logger();
    let mut canvas = Canvas::default();
    let mut history = HistoryEngine::new(2);

    history.commit(&canvas, "S0").unwrap();
    assert_eq!((history.len(), history.pointer()), (1, Some(0)));

    add(&mut canvas, Entity::rect("c_one", 10.0, 10.0));
    history.commit(&canvas, "S1").unwrap();
    assert_eq!((history.len(), history.pointer()), (2, Some(1)));

    add(&mut canvas, Entity::rect("c_two", 10.0, 10.0));
    history.commit(&canvas, "S2").unwrap();
    assert_eq!(labels(&history), vec!["S1", "S2"]);
    assert_eq!(history.pointer(), Some(1));

    // The oldest reachable state is now S1.
    history.undo(&mut canvas).unwrap();
    assert_eq!(canvas.z_order(), vec![EntityId::intern("c_one")]);
    assert_eq!(history.undo(&mut canvas).unwrap(), None);
}

#[test]
fn jump_out_of_range_changes_nothing() {
    init_logger();
    let mut canvas = Canvas::default();
    let mut history = HistoryEngine::new(50);
    for name in ["d_one", "d_two", "d_three"] {
        add(&mut canvas, Entity::rect(name, 10.0, 10.0));
        history.commit(&canvas, name).unwrap();
    }
    let before = canvas.document();

    let err = history.jump_to(&mut canvas, 5).unwrap_err();
    assert!(matches!(err, HistoryError::InvalidHistoryIndex { index: 5, len: 3 }));
    assert_eq!(history.pointer(), Some(2));
    assert_eq!(canvas.document(), before);
}

#[test]
fn jump_to_restores_any_entry() {
    let mut canvas = Canvas::default();
    let mut history = HistoryEngine::new(50);
    let mut states = Vec::new();
    for name in ["j_one", "j_two", "j_three"] {
        add(&mut canvas, Entity::rect(name, 10.0, 10.0));
        history.commit(&canvas, name).unwrap();
        states.push(canvas.document());
    }

    for index in [0, 2, 1] {
        history.jump_to(&mut canvas, index).unwrap();
        assert_eq!(history.pointer(), Some(index));
        assert_eq!(canvas.document(), states[index]);
    }
    assert!(history.can_undo() && history.can_redo());
}

// ─── Re-entrancy ────────────────────────────────────────────────────────

#[test]
fn restores_are_never_recorded() {
    init_logger();
    let mut session = EditorSession::new(Canvas::default(), 50).unwrap();
    for name in ["r_one", "r_two", "r_three"] {
        session
            .apply(SceneMutation::AddEntity {
                parent: None,
                entity: Box::new(Entity::rect(name, 10.0, 10.0)),
            })
            .unwrap();
    }
    assert_eq!(session.history().len(), 4);

    for _ in 0..3 {
        session.undo().unwrap();
    }
    for _ in 0..3 {
        session.redo().unwrap();
    }
    session.jump_to(1).unwrap();

    // Nothing the restores queued is left for the next flush to pick up.
    assert!(!session.flush().unwrap());
    assert_eq!(session.history().len(), 4);
    assert_eq!(session.history().pointer(), Some(1));
    assert_eq!(session.history().mode(), Mode::Idle);
}

/// Wraps a canvas and floods the notification queue on every restore,
/// the way a scene library that re-adds each object would.
struct NoisyScene {
    canvas: Canvas,
    extra: SmallVec<[SceneChange; 4]>,
}

impl Scene for NoisyScene {
    fn serialize(&self) -> Result<Snapshot, SceneError> {
        self.canvas.serialize()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SceneError> {
        self.canvas.restore(snapshot)?;
        for id in self.canvas.z_order() {
            self.extra.push(SceneChange::Added(id));
        }
        Ok(())
    }

    fn take_changes(&mut self) -> SmallVec<[SceneChange; 4]> {
        let mut changes = self.canvas.take_changes();
        changes.extend(self.extra.drain(..));
        changes
    }
}

#[test]
fn restore_notifications_are_suppressed() {
    let mut canvas = Canvas::default();
    add(&mut canvas, Entity::rect("n_one", 10.0, 10.0));
    add(&mut canvas, Entity::rect("n_two", 10.0, 10.0));
    let mut scene = NoisyScene {
        canvas,
        extra: SmallVec::new(),
    };

    let mut history = HistoryEngine::new(50);
    history.commit(&scene, "two rects").unwrap();
    scene.canvas.apply(SceneMutation::RemoveEntity {
        id: EntityId::intern("n_one"),
    });
    history.commit(&scene, "one removed").unwrap();

    history.undo(&mut scene).unwrap();
    assert_eq!(history.len(), 2);
    assert!(scene.take_changes().is_empty(), "restore notifications drained");

    // Once idle again, the same notifications commit normally.
    assert!(history.on_scene_change(&scene, &SceneChange::Added(EntityId::intern("n_one"))).unwrap());
    assert_eq!(history.len(), 2, "redo future replaced by the new entry");
    assert_eq!(history.current_label(), Some("Object Added"));
}

// ─── Failure semantics ──────────────────────────────────────────────────

#[test]
fn corrupt_entity_aborts_commit() {
    init_logger();
    let mut session = EditorSession::new(Canvas::default(), 50).unwrap();
    let id = EntityId::intern("f_box");
    session
        .apply(SceneMutation::AddEntity {
            parent: None,
            entity: Box::new(Entity::rect("f_box", 10.0, 10.0)),
        })
        .unwrap();
    let before = labels(session.history());

    let err = session
        .apply(SceneMutation::MoveEntity {
            id,
            dx: f32::NAN,
            dy: 0.0,
        })
        .unwrap_err();
    match err {
        HistoryError::SerializationFailed(SceneError::CorruptEntity { id: bad, .. }) => {
            assert_eq!(bad, id)
        }
        other => panic!("expected SerializationFailed, got {other:?}"),
    }
    assert_eq!(labels(session.history()), before);
    assert_eq!(session.history().pointer(), Some(1));

    // Undo still works and brings back the last good state.
    session.undo().unwrap();
    session.redo().unwrap();
    assert_eq!(session.scene().get(id).unwrap().transform.x, 0.0);
}

/// A canvas whose restores can be made to fail half way through.
struct FlakyScene {
    canvas: Canvas,
    fail_restore: bool,
}

impl Scene for FlakyScene {
    fn serialize(&self) -> Result<Snapshot, SceneError> {
        self.canvas.serialize()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SceneError> {
        if self.fail_restore {
            // Partial application: the old entities are gone, nothing new arrived.
            self.canvas.clear();
            return Err(SceneError::Decode("connection to image store lost".into()));
        }
        self.canvas.restore(snapshot)
    }

    fn take_changes(&mut self) -> SmallVec<[SceneChange; 4]> {
        self.canvas.take_changes()
    }
}

#[test]
fn failed_restore_keeps_pointer_and_reports_index() {
    init_logger();
    let mut scene = FlakyScene {
        canvas: Canvas::default(),
        fail_restore: false,
    };
    let mut history = HistoryEngine::new(50);
    history.commit(&scene, "empty").unwrap();
    add(&mut scene.canvas, Entity::rect("fr_box", 10.0, 10.0));
    history.commit(&scene, "box added").unwrap();

    scene.fail_restore = true;
    let err = history.undo(&mut scene).unwrap_err();
    assert!(matches!(err, HistoryError::RestoreFailed { index: 0, .. }));
    assert_eq!(history.pointer(), Some(1));
    assert_eq!(history.mode(), Mode::Idle);
    assert_eq!(history.len(), 2, "clear() notifications were not recorded");
    // No rollback: the scene is left as the failed restore left it.
    assert_eq!(scene.canvas.entity_count(), 0);

    let err = history.jump_to(&mut scene, 0).unwrap_err();
    assert!(matches!(err, HistoryError::RestoreFailed { index: 0, .. }));

    scene.fail_restore = false;
    history.jump_to(&mut scene, 1).unwrap();
    assert_eq!(scene.canvas.entity_count(), 1);
}

#[test]
fn corrupt_snapshot_fails_restore_without_touching_canvas() {
    let mut canvas = Canvas::default();
    add(&mut canvas, Entity::rect("cs_box", 10.0, 10.0));

    // A snapshot written by a different codec version.
    let mut document = canvas.document();
    document.version = SNAPSHOT_VERSION + 1;
    let foreign = vc_core::snapshot::encode(&document, SnapshotFormat::MessagePack).unwrap();
    let err = canvas.restore(&foreign).unwrap_err();
    assert!(matches!(err, SceneError::UnsupportedVersion { .. }));
    assert_eq!(canvas.z_order(), vec![EntityId::intern("cs_box")]);
}

// ─── End to end ─────────────────────────────────────────────────────────

#[test]
fn keyboard_driven_session() {
    init_logger();
    let config = EditorConfig::from_json(r##"{ "max_steps": 10, "background": "#F0F0F0" }"##).unwrap();
    let mut session = EditorSession::new(config.new_canvas().unwrap(), config.max_steps).unwrap();

    let logo = EntityId::intern("kb_logo");
    session
        .apply(SceneMutation::AddEntity {
            parent: None,
            entity: Box::new(Entity::rect("kb_logo", 64.0, 64.0).at(20.0, 20.0)),
        })
        .unwrap();
    session.select(logo);

    let press = |key: &str, ctrl: bool, shift: bool| {
        ShortcutMap::resolve(key, ctrl, shift, false, false).expect("unbound key")
    };

    assert!(session.dispatch(press("d", true, false)).unwrap());
    assert_eq!(session.scene().entity_count(), 2);
    let copy = session.selected()[0];
    let copied = session.scene().get(copy).unwrap();
    assert_eq!((copied.transform.x, copied.transform.y), (30.0, 30.0));

    assert!(session.dispatch(press("Delete", false, false)).unwrap());
    assert_eq!(session.scene().z_order(), vec![logo]);

    assert!(session.dispatch(press("z", true, false)).unwrap());
    assert_eq!(session.scene().entity_count(), 2);
    assert!(session.dispatch(press("Z", true, true)).unwrap());
    assert_eq!(session.scene().entity_count(), 1);
    assert!(!session.dispatch(press("y", true, false)).unwrap(), "nothing left to redo");

    let history: Vec<_> = session
        .history()
        .entries()
        .map(|e| (e.label.to_string(), e.is_current))
        .collect();
    assert_eq!(
        history,
        vec![
            ("Open Document".to_string(), false),
            ("Object Added".to_string(), false),
            ("Object Added".to_string(), false),
            ("Object Removed".to_string(), true),
        ]
    );
}
