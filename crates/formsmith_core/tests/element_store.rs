use formsmith_core::model::element::Align;
use formsmith_core::{
    ElementKind, ElementPatch, ElementStore, FieldValue, FormDefinition, PositionPatch,
    StoreError, StylePatch,
};
use std::collections::BTreeSet;
use uuid::Uuid;

fn store_with(kinds: &[ElementKind]) -> (ElementStore, Vec<Uuid>) {
    let mut store = ElementStore::default();
    let ids: Vec<Uuid> = kinds.iter().map(|kind| store.add(*kind).1).collect();
    (store, ids)
}

fn lock(store: &mut ElementStore, id: Uuid) {
    let patch = ElementPatch {
        locked: Some(true),
        ..ElementPatch::default()
    };
    store.update(id, &patch).unwrap();
}

#[test]
fn add_appends_and_bumps_revision() {
    let (store, ids) = store_with(&[ElementKind::Heading, ElementKind::Text]);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.element_ids(), ids);
    assert_eq!(store.revision(), 2);
}

#[test]
fn add_named_rejects_unknown_kind() {
    let mut store = ElementStore::default();
    assert_eq!(
        store.add_named("hologram").unwrap_err(),
        StoreError::UnknownKind("hologram".to_string())
    );
    assert_eq!(store.revision(), 0);
}

#[test]
fn update_missing_element_is_an_error() {
    let mut store = ElementStore::default();
    let missing = Uuid::new_v4();
    let patch = ElementPatch {
        content: Some("x".to_string()),
        ..ElementPatch::default()
    };
    assert_eq!(
        store.update(missing, &patch),
        Err(StoreError::ElementNotFound(missing))
    );
}

#[test]
fn update_merges_style_and_refreshes_updated_at() {
    let (mut store, ids) = store_with(&[ElementKind::Text]);
    let before = store.snapshot();
    let patch = ElementPatch {
        style: Some(StylePatch {
            font_size: Some(Some("2rem".to_string())),
            ..StylePatch::default()
        }),
        default_value: Some(Some(FieldValue::Text("hello".to_string()))),
        ..ElementPatch::default()
    };
    let after = store.update(ids[0], &patch).unwrap();
    let element = after.element(ids[0]).unwrap();
    assert_eq!(element.style.font_size.as_deref(), Some("2rem"));
    assert_eq!(element.style.padding.as_deref(), Some("0.5rem"));
    assert_eq!(element.value(), FieldValue::Text("hello".to_string()));
    assert!(after.updated_at >= before.updated_at);
}

#[test]
fn locked_element_accepts_content_but_not_layout_changes() {
    let (mut store, ids) = store_with(&[ElementKind::Text]);
    let id = ids[0];
    lock(&mut store, id);

    let content = ElementPatch {
        content: Some("Renamed".to_string()),
        ..ElementPatch::default()
    };
    store.update(id, &content).unwrap();
    assert_eq!(store.snapshot().element(id).unwrap().content, "Renamed");

    let moved = ElementPatch {
        position: Some(PositionPatch {
            x: Some(300.0),
            ..PositionPatch::default()
        }),
        ..ElementPatch::default()
    };
    assert_eq!(store.update(id, &moved), Err(StoreError::ElementLocked(id)));
    assert_eq!(store.delete(id), Err(StoreError::ElementLocked(id)));
    assert_eq!(store.reorder(0, 0), Err(StoreError::ElementLocked(id)));

    let snapshot = store.snapshot();
    assert!(matches!(
        store.apply_drag(&snapshot, id, 1.0, 1.0),
        Err(StoreError::ElementLocked(_))
    ));

    let unlock = ElementPatch {
        locked: Some(false),
        ..ElementPatch::default()
    };
    store.update(id, &unlock).unwrap();
    store.delete(id).unwrap();
    assert!(store.snapshot().is_empty());
}

#[test]
fn duplicate_offsets_copy_and_leaves_original_untouched() {
    let (mut store, ids) = store_with(&[ElementKind::Button]);
    let original_before = store.snapshot().element(ids[0]).unwrap().clone();
    lock(&mut store, ids[0]);

    let (snapshot, clone_id) = store.duplicate(ids[0]).unwrap();
    assert_ne!(clone_id, ids[0]);
    let original = snapshot.element(ids[0]).unwrap();
    let clone = snapshot.element(clone_id).unwrap();
    assert_eq!(original.content, original_before.content);
    assert_eq!(clone.content, "Button (copy)");
    assert_eq!(clone.position.x - original.position.x, 20.0);
    assert_eq!(clone.position.y - original.position.y, 20.0);
    assert!(!clone.locked);
    assert_eq!(snapshot.index_of(clone_id), Some(1));
}

#[test]
fn duplicate_offset_is_configurable() {
    let mut store = ElementStore::default().with_duplicate_offset(8.0);
    let (_, id) = store.add(ElementKind::Text);
    let (snapshot, clone_id) = store.duplicate(id).unwrap();
    assert_eq!(snapshot.element(clone_id).unwrap().position.x, 8.0);
}

#[test]
fn reorder_is_a_permutation() {
    let (mut store, ids) = store_with(&[
        ElementKind::Title,
        ElementKind::Text,
        ElementKind::Number,
        ElementKind::Button,
    ]);
    let snapshot = store.reorder(0, 3).unwrap();
    let order = snapshot.element_ids();
    assert_eq!(order, vec![ids[1], ids[2], ids[3], ids[0]]);
    let before: BTreeSet<_> = ids.iter().copied().collect();
    let after: BTreeSet<_> = order.into_iter().collect();
    assert_eq!(before, after);
}

#[test]
fn reorder_out_of_range_is_rejected() {
    let (mut store, _) = store_with(&[ElementKind::Title, ElementKind::Text]);
    let revision = store.revision();
    assert_eq!(
        store.reorder(0, 2),
        Err(StoreError::IndexOutOfRange {
            from: 0,
            to: 2,
            len: 2
        })
    );
    assert_eq!(store.revision(), revision);
}

#[test]
fn replace_installs_imported_definition() {
    let mut store = ElementStore::default();
    let mut definition = FormDefinition::new("Imported");
    definition.elements.push(formsmith_core::FormElement::create_default(ElementKind::Date));
    let snapshot = store.replace(definition.clone()).unwrap();
    assert_eq!(*snapshot, definition);
    assert_eq!(store.revision(), 1);
}

#[test]
fn partial_position_update_keeps_dragged_coordinates() {
    let (mut store, ids) = store_with(&[ElementKind::Text]);
    let id = ids[0];
    let snapshot = store.snapshot();
    let mut dragged = store.apply_drag(&snapshot, id, 120.0, 80.0).unwrap();
    let element = dragged.element_mut(id).unwrap();
    element.position.z_index = Some(4);
    element.position.align = Some(Align::Right);
    element.position.grid_column = Some("2 / 5".to_string());
    store.restore(std::sync::Arc::new(dragged));

    let patch = ElementPatch::from_json(r#"{"position": {"hideMobile": true}}"#).unwrap();
    let after = store.update(id, &patch).unwrap();
    let position = &after.element(id).unwrap().position;
    assert!(position.hide_mobile);
    assert_eq!((position.x, position.y), (120.0, 80.0));
    assert_eq!(position.z_index, Some(4));
    assert_eq!(position.align, Some(Align::Right));
    assert_eq!(position.grid_column.as_deref(), Some("2 / 5"));
}

#[test]
fn style_attribute_cleared_with_null_resolves_to_fallback() {
    let (mut store, ids) = store_with(&[ElementKind::Text]);
    let id = ids[0];
    let set = ElementPatch::from_json(r#"{"style": {"fontSize": "2rem"}}"#).unwrap();
    store.update(id, &set).unwrap();
    assert_eq!(
        store.snapshot().element(id).unwrap().style.resolved().font_size,
        "2rem"
    );

    let clear = ElementPatch::from_json(r#"{"style": {"fontSize": null}}"#).unwrap();
    let after = store.update(id, &clear).unwrap();
    let style = &after.element(id).unwrap().style;
    assert_eq!(style.font_size, None);
    assert_eq!(style.resolved().font_size, "1rem");
}
