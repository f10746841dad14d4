//! Integration tests: history publishing and the undo toolbar entry
//! (annota-editor).

mod common;

use annota_editor::annota_core::{EditorConfig, HistoryMessage, ToolbarItemConfig, UNDO_ITEM};
use common::*;
use pretty_assertions::assert_eq;

fn draw_two_rects(editor: &mut annota_editor::Editor) {
    editor.handle_plugin_change("rect", false).unwrap();
    drag(editor, (50.0, 50.0), (150.0, 150.0));
    drag(editor, (300.0, 300.0), (400.0, 380.0));
}

#[test]
fn first_push_enables_undo_once() {
    let (mut editor, notes) = mount_observed(EditorConfig::default(), vec![]);
    let before = notes.borrow().toolbar.len();

    draw_two_rects(&mut editor);

    assert_eq!(editor.history().len(), 2);
    assert_eq!(editor.scene().draw_layer.find_by_name("rect").len(), 2);
    let notes = notes.borrow();
    assert_eq!(notes.toolbar.len() - before, 1);
    assert_eq!(notes.toolbar.last().and_then(|t| t.is_disabled(UNDO_ITEM)), Some(false));
}

#[test]
fn repeal_removes_newest_rect_and_disables_at_empty() {
    let (mut editor, notes) = mount_observed(EditorConfig::default(), vec![]);
    draw_two_rects(&mut editor);
    let newest = editor.history().last().and_then(|s| s.node_id()).unwrap();

    editor.handle_plugin_change(UNDO_ITEM, false).unwrap();
    assert_eq!(editor.history().len(), 1);
    assert!(editor.scene().draw_layer.get(newest).is_none());
    assert_eq!(editor.scene().draw_layer.len(), 1);
    assert_eq!(editor.toolbar_item_config().is_disabled(UNDO_ITEM), Some(false));

    assert_eq!(editor.tick(), 1);
    assert!(editor.current_plugin().is_none());

    let seen = notes.borrow().toolbar.len();
    editor.handle_plugin_change(UNDO_ITEM, false).unwrap();
    editor.tick();
    assert!(editor.history().is_empty());
    assert!(editor.scene().draw_layer.is_empty());
    assert_eq!(editor.toolbar_item_config().is_disabled(UNDO_ITEM), Some(true));
    assert_eq!(notes.borrow().toolbar.len(), seen + 1);
}

#[test]
fn repeal_on_empty_history_is_quiet() {
    let (mut editor, notes) = mount_observed(EditorConfig::default(), vec![]);
    let before = notes.borrow().toolbar.len();
    editor.handle_plugin_change(UNDO_ITEM, false).unwrap();
    editor.tick();
    assert_eq!(notes.borrow().toolbar.len(), before);
    assert_eq!(editor.toolbar_item_config().is_disabled(UNDO_ITEM), Some(true));
}

#[test]
fn host_pop_announcement_is_idempotent() {
    let (mut editor, notes) = mount_observed(EditorConfig::default(), vec![]);
    let before = notes.borrow().toolbar.len();
    editor.publish_history(HistoryMessage::Pop { remaining: vec![] });
    editor.publish_history(HistoryMessage::Pop { remaining: vec![] });
    assert_eq!(notes.borrow().toolbar.len(), before);
    assert_eq!(editor.toolbar_item_config().is_disabled(UNDO_ITEM), Some(true));
}

#[test]
fn toolbar_without_undo_entry_is_left_alone() {
    let (mut editor, notes) = mount_observed(EditorConfig::default(), vec![]);
    editor.update_toolbar_item_config(ToolbarItemConfig::for_plugins(["rect", "crop"]));
    let before = notes.borrow().toolbar.len();

    draw_two_rects(&mut editor);

    assert_eq!(editor.history().len(), 2);
    assert_eq!(notes.borrow().toolbar.len(), before);
    assert_eq!(editor.toolbar_item_config().is_disabled(UNDO_ITEM), None);
}

#[test]
fn tiny_rect_is_discarded_unrecorded() {
    let (mut editor, notes) = mount_observed(EditorConfig::default(), vec![]);
    let before = notes.borrow().toolbar.len();
    editor.handle_plugin_change("rect", false).unwrap();
    drag(&mut editor, (100.0, 100.0), (101.0, 150.0));

    assert!(editor.history().is_empty());
    assert!(editor.scene().draw_layer.is_empty());
    assert_eq!(notes.borrow().toolbar.len(), before);
}
