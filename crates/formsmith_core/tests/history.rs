use formsmith_core::{
    EditorError, EditorSession, ElementKind, ElementPatch, EngineConfig, FormDefinition,
    HistoryError,
};
use std::sync::Arc;

#[test]
fn undo_after_n_adds_yields_snapshot_before_nth_add() {
    let mut session = EditorSession::default();
    let mut snapshots = vec![session.snapshot()];
    for kind in [ElementKind::Title, ElementKind::Text, ElementKind::Button] {
        session.add(kind).unwrap();
        snapshots.push(session.snapshot());
    }

    session.undo().unwrap();
    assert_eq!(*session.snapshot(), *snapshots[2]);
    session.undo().unwrap();
    assert_eq!(*session.snapshot(), *snapshots[1]);
}

#[test]
fn redo_after_undo_restores_deep_equal_snapshot_for_every_op() {
    let mut session = EditorSession::default();
    let first = session.add(ElementKind::Text).unwrap();
    let second = session.add(ElementKind::Number).unwrap();

    let ops: Vec<Box<dyn Fn(&mut EditorSession)>> = vec![
        Box::new(move |s| {
            s.update(
                first,
                &ElementPatch {
                    required: Some(true),
                    ..ElementPatch::default()
                },
            )
            .unwrap()
        }),
        Box::new(move |s| {
            s.duplicate(second).unwrap();
        }),
        Box::new(|s| s.reorder(0, 1).unwrap()),
        Box::new(move |s| {
            s.apply_drag(first, 12.0, 3.0).unwrap();
            s.drag_end(first).unwrap();
        }),
        Box::new(move |s| s.delete(second).unwrap()),
        Box::new(|s| {
            s.add(ElementKind::Checkbox).unwrap();
        }),
    ];

    for op in ops {
        op(&mut session);
        let after = session.snapshot();
        session.undo().unwrap();
        session.redo().unwrap();
        assert_eq!(*session.snapshot(), *after);
    }
}

#[test]
fn undo_and_redo_report_empty_stacks() {
    let mut session = EditorSession::default();
    assert_eq!(
        session.undo(),
        Err(EditorError::History(HistoryError::NothingToUndo))
    );
    assert_eq!(
        session.redo(),
        Err(EditorError::History(HistoryError::NothingToRedo))
    );
}

#[test]
fn new_commit_after_undo_discards_redo_branch() {
    let mut session = EditorSession::default();
    session.add(ElementKind::Text).unwrap();
    session.add(ElementKind::Text).unwrap();
    session.undo().unwrap();
    assert!(session.can_redo());
    session.add(ElementKind::Heading).unwrap();
    assert!(!session.can_redo());
}

#[test]
fn history_depth_is_bounded() {
    let config = EngineConfig {
        history_depth: 5,
        ..EngineConfig::default()
    };
    let mut session = EditorSession::new(FormDefinition::new("bounded"), config);
    for _ in 0..20 {
        session.add(ElementKind::Text).unwrap();
    }
    assert_eq!(session.history_len(), 5);

    let mut undone = 0;
    while session.undo().is_ok() {
        undone += 1;
    }
    assert_eq!(undone, 4);
    assert_eq!(session.snapshot().len(), 16);
}

#[test]
fn fifty_drag_moves_commit_one_history_entry() {
    let mut session = EditorSession::default();
    let id = session.add(ElementKind::Text).unwrap();
    let before = session.history_len();
    let committed = session.snapshot();

    for _ in 0..50 {
        session.apply_drag(id, 1.0, 2.0).unwrap();
    }
    assert!(Arc::ptr_eq(&session.snapshot(), &committed));
    assert_eq!(session.history_len(), before);

    session.drag_end(id).unwrap();
    assert_eq!(session.history_len(), before + 1);
    let snapshot = session.snapshot();
    let position = &snapshot.element(id).unwrap().position;
    assert_eq!((position.x, position.y), (50.0, 100.0));

    session.undo().unwrap();
    assert_eq!(session.snapshot().element(id).unwrap().position.x, 0.0);
}

#[test]
fn undo_during_drag_commits_then_reverts_it() {
    let mut session = EditorSession::default();
    let id = session.add(ElementKind::Text).unwrap();
    session.apply_drag(id, 5.0, 5.0).unwrap();
    session.undo().unwrap();
    assert!(session.active_drag().is_none());
    assert_eq!(session.snapshot().element(id).unwrap().position.x, 0.0);
    session.redo().unwrap();
    assert_eq!(session.snapshot().element(id).unwrap().position.x, 5.0);
}

#[test]
fn deleting_dragged_element_discards_the_drag() {
    let mut session = EditorSession::default();
    let id = session.add(ElementKind::Text).unwrap();
    let before = session.history_len();
    session.apply_drag(id, 5.0, 5.0).unwrap();
    session.delete(id).unwrap();
    assert_eq!(session.history_len(), before + 1);
    session.undo().unwrap();
    assert_eq!(session.snapshot().element(id).unwrap().position.x, 0.0);
}
