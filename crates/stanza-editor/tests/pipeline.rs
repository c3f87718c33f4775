//! End-to-end tests of the editing pipeline: interception, translation,
//! normalization, publication and history.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value, json};

use stanza_editor::{
    BlockedReason, ChangeEvent, Editor, EditorError, EditorOptions, MemorySurface, Operation,
    TextPoint,
};
use stanza_patch::{Patch, PatchBatch, Path};
use stanza_types::{
    Document, SchemaTypes, Selection, SelectionPoint, SequentialKeyGenerator, SmolStr,
};

fn doc(value: Value) -> Document {
    serde_json::from_value(value).unwrap()
}

fn hello_doc() -> Document {
    doc(json!([
        {
            "_key": "a",
            "_type": "block",
            "style": "normal",
            "children": [
                {"_key": "a1", "_type": "span", "text": "hello world", "marks": []}
            ],
            "markDefs": []
        }
    ]))
}

fn options() -> EditorOptions {
    EditorOptions {
        key_generator: Box::new(SequentialKeyGenerator::new()),
        ..EditorOptions::default()
    }
}

fn editor(doc: Document) -> Editor<MemorySurface> {
    editor_with(doc, options())
}

fn editor_with(doc: Document, options: EditorOptions) -> Editor<MemorySurface> {
    Editor::new(MemorySurface::new(doc), options).unwrap()
}

fn collect_batches(ed: &mut Editor<MemorySurface>) -> Rc<RefCell<Vec<PatchBatch>>> {
    let batches = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&batches);
    ed.on_patch(move |batch| sink.borrow_mut().push(batch.clone()));
    batches
}

fn collect_events(ed: &mut Editor<MemorySurface>) -> Rc<RefCell<Vec<ChangeEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    ed.on_change(move |event| sink.borrow_mut().push(event.clone()));
    events
}

fn all_keys(doc: &Document) -> Vec<SmolStr> {
    let mut keys = Vec::new();
    for block in &doc.blocks {
        keys.push(block.key().clone());
        if let Some(text) = block.as_text() {
            for child in &text.children {
                keys.push(child.key().clone());
            }
        }
    }
    keys
}

#[test]
fn test_install_assigns_missing_keys() {
    let ed = editor(doc(json!([
        {"_type": "block", "style": "normal", "children": [
            {"_type": "span", "text": "one", "marks": []}
        ], "markDefs": []},
        {"_type": "block", "style": "normal", "children": [
            {"_type": "span", "text": "two", "marks": []}
        ], "markDefs": []}
    ])));

    let keys = all_keys(ed.value());
    assert_eq!(keys.len(), 4);
    assert!(keys.iter().all(|k| !k.is_empty()));
    let unique: std::collections::HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());

    // Install repairs are not undoable.
    assert!(!ed.can_undo());
}

#[test]
fn test_install_repairs_duplicate_keys() {
    let ed = editor(doc(json!([
        {"_key": "dup", "_type": "block", "style": "normal", "children": [
            {"_key": "c1", "_type": "span", "text": "one", "marks": []}
        ], "markDefs": []},
        {"_key": "dup", "_type": "block", "style": "normal", "children": [
            {"_key": "c2", "_type": "span", "text": "two", "marks": []}
        ], "markDefs": []}
    ])));

    let keys = all_keys(ed.value());
    let unique: std::collections::HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
    assert_eq!(ed.value().blocks[0].key(), "dup");
    assert_ne!(ed.value().blocks[1].key(), "dup");
}

#[test]
fn test_child_keys_are_scoped_to_their_block() {
    let ed = editor(doc(json!([
        {"_key": "a", "_type": "block", "style": "normal", "children": [
            {"_key": "c1", "_type": "span", "text": "one", "marks": []}
        ], "markDefs": []},
        {"_key": "b", "_type": "block", "style": "normal", "children": [
            {"_key": "c1", "_type": "span", "text": "two", "marks": []}
        ], "markDefs": []},
        {"_key": "c", "_type": "block", "style": "normal", "children": [
            {"_key": "d1", "_type": "span", "text": "x", "marks": ["strong"]},
            {"_key": "d1", "_type": "span", "text": "y", "marks": []}
        ], "markDefs": []}
    ])));

    // The same child key in two different blocks is legal and untouched.
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().children[0].key(),
        "c1"
    );
    assert_eq!(
        ed.value().blocks[1].as_text().unwrap().children[0].key(),
        "c1"
    );

    // A duplicate within one block still gets a fresh key.
    let c = ed.value().blocks[2].as_text().unwrap();
    assert_eq!(c.children[0].key(), "d1");
    assert_ne!(c.children[1].key(), "d1");
}

#[test]
fn test_list_level_clamps_when_nesting_is_flat() {
    let ed = editor_with(
        doc(json!([
            {"_key": "a", "_type": "block", "style": "normal", "listItem": "bullet", "level": 5,
             "children": [{"_key": "a1", "_type": "span", "text": "x", "marks": []}], "markDefs": []}
        ])),
        EditorOptions {
            key_generator: Box::new(SequentialKeyGenerator::new()),
            schema: SchemaTypes {
                max_list_level: 0,
                ..SchemaTypes::default()
            },
            ..EditorOptions::default()
        },
    );

    let a = ed.value().blocks[0].as_text().unwrap();
    assert_eq!(a.list_item.as_deref(), Some("bullet"));
    assert_eq!(a.level, Some(1));
}

#[test]
fn test_empty_document_gets_placeholder_block() {
    let ed = editor(Document::default());
    assert_eq!(ed.value().len(), 1);
    let block = ed.value().blocks[0].as_text().unwrap();
    assert_eq!(block.key, "k0");
    assert_eq!(block.style, "normal");
    assert_eq!(block.plain_text(), "");
    assert_eq!(block.children.len(), 1);
}

#[test]
fn test_insert_text_publishes_single_full_set() {
    let mut ed = editor(hello_doc());
    let _set = ed.subscribe();
    let batches = collect_batches(&mut ed);

    let applied = ed
        .apply(Operation::InsertText {
            at: TextPoint::new(0, 0, 5),
            text: ",".into(),
        })
        .unwrap();
    assert!(applied);
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "hello, world"
    );

    let batches = batches.borrow();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].patches,
        vec![Patch::Set {
            path: Path::block("a").child("a1").attr("text"),
            value: json!("hello, world"),
        }]
    );
}

#[test]
fn test_undo_redo_round_trip() {
    let mut ed = editor(hello_doc());
    ed.apply(Operation::InsertText {
        at: TextPoint::new(0, 0, 5),
        text: ",".into(),
    })
    .unwrap();
    assert!(ed.can_undo());

    assert!(ed.undo().unwrap());
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "hello world"
    );
    assert!(ed.can_redo());

    assert!(ed.redo().unwrap());
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "hello, world"
    );

    // Nothing left to redo after a fresh edit.
    ed.apply(Operation::InsertText {
        at: TextPoint::new(0, 0, 0),
        text: "!".into(),
    })
    .unwrap();
    assert!(!ed.can_redo());
}

#[test]
fn test_split_and_undo_restores_document() {
    let mut ed = editor(hello_doc());
    ed.apply(Operation::SplitNode {
        at: TextPoint::new(0, 0, 5),
        new_block_key: None,
        new_child_key: None,
    })
    .unwrap();

    assert_eq!(ed.value().len(), 2);
    assert_eq!(ed.value().blocks[0].as_text().unwrap().plain_text(), "hello");
    assert_eq!(
        ed.value().blocks[1].as_text().unwrap().plain_text(),
        " world"
    );
    assert_eq!(ed.value().blocks[1].key(), "k0");

    assert!(ed.undo().unwrap());
    assert_eq!(ed.value().len(), 1);
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "hello world"
    );
}

#[test]
fn test_max_blocks_vetoes_growth() {
    let mut ed = editor_with(
        hello_doc(),
        EditorOptions {
            key_generator: Box::new(SequentialKeyGenerator::new()),
            max_blocks: Some(1),
            ..EditorOptions::default()
        },
    );
    let events = collect_events(&mut ed);

    let applied = ed
        .apply(Operation::SplitNode {
            at: TextPoint::new(0, 0, 5),
            new_block_key: None,
            new_child_key: None,
        })
        .unwrap();
    assert!(!applied);
    assert_eq!(ed.value().len(), 1);
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "hello world"
    );
    assert!(!ed.can_undo());
    assert!(events.borrow().contains(&ChangeEvent::Blocked {
        reason: BlockedReason::MaxBlocks
    }));

    // Edits inside existing blocks are still allowed at the limit.
    assert!(
        ed.apply(Operation::InsertText {
            at: TextPoint::new(0, 0, 0),
            text: "x".into(),
        })
        .unwrap()
    );
}

#[test]
fn test_unknown_type_is_vetoed() {
    let mut ed = editor(hello_doc());
    let events = collect_events(&mut ed);

    let inserted = ed.insert_block("carousel", Map::new()).unwrap();
    assert!(inserted.is_none());
    assert_eq!(ed.value().len(), 1);
    assert!(events.borrow().contains(&ChangeEvent::Blocked {
        reason: BlockedReason::UnknownType
    }));
}

#[test]
fn test_insert_block_object_from_schema() {
    let mut ed = editor_with(
        hello_doc(),
        EditorOptions {
            key_generator: Box::new(SequentialKeyGenerator::new()),
            schema: SchemaTypes {
                block_objects: vec![SmolStr::new_static("image")],
                ..SchemaTypes::default()
            },
            ..EditorOptions::default()
        },
    );

    let mut fields = Map::new();
    fields.insert("url".into(), json!("x.png"));
    let path = ed.insert_block("image", fields).unwrap().unwrap();
    assert_eq!(path, Path::block("k0"));
    assert_eq!(ed.value().len(), 2);
    let image = ed.value().blocks[1].as_object().unwrap();
    assert_eq!(image.type_name, "image");
    assert_eq!(image.fields.get("url"), Some(&json!("x.png")));
}

#[test]
fn test_read_only_drops_mutations_and_publishes_nothing() {
    let mut ed = editor_with(
        hello_doc(),
        EditorOptions {
            key_generator: Box::new(SequentialKeyGenerator::new()),
            read_only: true,
            ..EditorOptions::default()
        },
    );
    let _set = ed.subscribe();
    let batches = collect_batches(&mut ed);

    let applied = ed
        .apply(Operation::InsertText {
            at: TextPoint::new(0, 0, 0),
            text: "x".into(),
        })
        .unwrap();
    assert!(!applied);
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "hello world"
    );
    assert!(batches.borrow().is_empty());
    assert!(!ed.undo().unwrap());

    // Selection updates still go through.
    let caret = Selection::collapsed(SelectionPoint::new("a", "a1", 3));
    assert!(
        ed.apply(Operation::SetSelection {
            selection: Some(caret.clone()),
        })
        .unwrap()
    );
    assert_eq!(ed.selection(), Some(&caret));
    assert!(batches.borrow().is_empty());
}

#[test]
fn test_destroy_twice_is_an_error() {
    let mut ed = editor(hello_doc());
    ed.destroy().unwrap();
    assert!(matches!(ed.destroy(), Err(EditorError::MissingPristineState)));
}

#[test]
fn test_destroyed_editor_applies_unwrapped() {
    let mut ed = editor(hello_doc());
    ed.apply(Operation::InsertText {
        at: TextPoint::new(0, 0, 0),
        text: "x".into(),
    })
    .unwrap();
    assert!(ed.can_undo());

    ed.destroy().unwrap();
    assert!(!ed.can_undo());
    ed.apply(Operation::InsertText {
        at: TextPoint::new(0, 0, 0),
        text: "y".into(),
    })
    .unwrap();
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "yxhello world"
    );
    // No pipeline after destroy: nothing recorded.
    assert!(!ed.can_undo());
}

#[test]
fn test_reinstall_after_destroy() {
    let mut ed = editor(hello_doc());
    ed.destroy().unwrap();
    ed.reinstall(options()).unwrap();
    assert!(
        ed.apply(Operation::InsertText {
            at: TextPoint::new(0, 0, 0),
            text: "x".into(),
        })
        .unwrap()
    );
    assert!(ed.can_undo());
}

#[test]
fn test_unresolvable_marks_and_orphan_markdefs_are_stripped() {
    let ed = editor(doc(json!([
        {
            "_key": "a",
            "_type": "block",
            "style": "normal",
            "children": [
                {"_key": "a1", "_type": "span", "text": "hi", "marks": ["strong", "zzz", "m1"]}
            ],
            "markDefs": [
                {"_key": "m1", "_type": "link", "href": "https://example.com"},
                {"_key": "m2", "_type": "link", "href": "https://unused.example"}
            ]
        }
    ])));

    let block = ed.value().blocks[0].as_text().unwrap();
    let span = block.children[0].as_span().unwrap();
    assert_eq!(span.marks, vec!["strong", "m1"]);
    assert_eq!(block.mark_defs.len(), 1);
    assert_eq!(block.mark_defs[0].key, "m1");
}

#[test]
fn test_adjacent_same_mark_spans_merge() {
    let ed = editor(doc(json!([
        {
            "_key": "a",
            "_type": "block",
            "style": "normal",
            "children": [
                {"_key": "a1", "_type": "span", "text": "foo", "marks": []},
                {"_key": "a2", "_type": "span", "text": "bar", "marks": []}
            ],
            "markDefs": []
        },
        {
            "_key": "b",
            "_type": "block",
            "style": "normal",
            "children": [
                {"_key": "b1", "_type": "span", "text": "x", "marks": ["strong"]},
                {"_key": "b2", "_type": "span", "text": "y", "marks": []}
            ],
            "markDefs": []
        }
    ])));

    let a = ed.value().blocks[0].as_text().unwrap();
    assert_eq!(a.children.len(), 1);
    assert_eq!(a.plain_text(), "foobar");

    // Different marks stay separate.
    let b = ed.value().blocks[1].as_text().unwrap();
    assert_eq!(b.children.len(), 2);
}

#[test]
fn test_list_normalization() {
    let ed = editor(doc(json!([
        {"_key": "a", "_type": "block", "style": "normal", "listItem": "bullet", "level": 99,
         "children": [{"_key": "a1", "_type": "span", "text": "x", "marks": []}], "markDefs": []},
        {"_key": "b", "_type": "block", "style": "normal", "listItem": "fancy", "level": 2,
         "children": [{"_key": "b1", "_type": "span", "text": "y", "marks": []}], "markDefs": []},
        {"_key": "c", "_type": "block", "style": "normal", "level": 3,
         "children": [{"_key": "c1", "_type": "span", "text": "z", "marks": []}], "markDefs": []}
    ])));

    let a = ed.value().blocks[0].as_text().unwrap();
    assert_eq!(a.list_item.as_deref(), Some("bullet"));
    assert_eq!(a.level, Some(10));

    let b = ed.value().blocks[1].as_text().unwrap();
    assert_eq!(b.list_item, None);
    assert_eq!(b.level, None);

    let c = ed.value().blocks[2].as_text().unwrap();
    assert_eq!(c.level, None);
}

#[test]
fn test_unknown_style_falls_back_to_normal() {
    let ed = editor(doc(json!([
        {"_key": "a", "_type": "block", "style": "h9",
         "children": [{"_key": "a1", "_type": "span", "text": "x", "marks": []}], "markDefs": []}
    ])));
    assert_eq!(ed.value().blocks[0].as_text().unwrap().style, "normal");
}

#[test]
fn test_break_at_block_end_inserts_empty_block() {
    let mut ed = editor(hello_doc());
    ed.apply(Operation::SplitNode {
        at: TextPoint::new(0, 0, 11),
        new_block_key: None,
        new_child_key: None,
    })
    .unwrap();

    assert_eq!(ed.value().len(), 2);
    assert_eq!(
        ed.value().blocks[0].as_text().unwrap().plain_text(),
        "hello world"
    );
    assert_eq!(ed.value().blocks[1].as_text().unwrap().plain_text(), "");
    assert_eq!(ed.value().blocks[1].key(), "k0");

    // Caret lands at the start of the new block.
    let selection = ed.selection().unwrap();
    assert!(selection.is_collapsed());
    assert_eq!(selection.focus.block_key, "k0");
    assert_eq!(selection.focus.offset, 0);
}

#[test]
fn test_break_at_block_start_keeps_caret_block() {
    let mut ed = editor(hello_doc());
    ed.apply(Operation::SplitNode {
        at: TextPoint::new(0, 0, 0),
        new_block_key: None,
        new_child_key: None,
    })
    .unwrap();

    assert_eq!(ed.value().len(), 2);
    assert_eq!(ed.value().blocks[0].as_text().unwrap().plain_text(), "");
    assert_eq!(ed.value().blocks[0].key(), "k0");
    assert_eq!(ed.value().blocks[1].key(), "a");
}

#[test]
fn test_invalid_selection_is_vetoed() {
    let mut ed = editor(hello_doc());
    let applied = ed
        .apply(Operation::SetSelection {
            selection: Some(Selection::collapsed(SelectionPoint::new("gone", "x", 0))),
        })
        .unwrap();
    assert!(!applied);
    assert_eq!(ed.selection(), None);
}

#[test]
fn test_selection_change_event() {
    let mut ed = editor(hello_doc());
    let events = collect_events(&mut ed);
    let caret = Selection::collapsed(SelectionPoint::new("a", "a1", 3));
    ed.apply(Operation::SetSelection {
        selection: Some(caret.clone()),
    })
    .unwrap();
    assert!(events.borrow().contains(&ChangeEvent::SelectionChanged {
        selection: Some(caret)
    }));
}

#[test]
fn test_unsubscribe_stops_publication() {
    let mut ed = editor(hello_doc());
    let set = ed.subscribe();
    let batches = collect_batches(&mut ed);

    ed.apply(Operation::InsertText {
        at: TextPoint::new(0, 0, 0),
        text: "x".into(),
    })
    .unwrap();
    assert_eq!(batches.borrow().len(), 1);

    ed.unsubscribe(set);
    ed.apply(Operation::InsertText {
        at: TextPoint::new(0, 0, 0),
        text: "y".into(),
    })
    .unwrap();
    assert_eq!(batches.borrow().len(), 1);
}

#[test]
fn test_resolve_initial_value_merges_props() {
    let mut ed = editor_with(
        doc(json!([
            {"_key": "img1", "_type": "image"},
            {"_key": "a", "_type": "block", "style": "normal",
             "children": [{"_key": "a1", "_type": "span", "text": "x", "marks": []}], "markDefs": []}
        ])),
        EditorOptions {
            key_generator: Box::new(SequentialKeyGenerator::new()),
            schema: SchemaTypes {
                block_objects: vec![SmolStr::new_static("image")],
                ..SchemaTypes::default()
            },
            ..EditorOptions::default()
        },
    );
    let _set = ed.subscribe();
    let batches = collect_batches(&mut ed);

    let mut props = Map::new();
    props.insert("url".into(), json!("resolved.png"));
    assert!(ed.resolve_initial_value("img1", props).unwrap());

    let image = ed.value().blocks[0].as_object().unwrap();
    assert_eq!(image.fields.get("url"), Some(&json!("resolved.png")));
    assert_eq!(batches.borrow().len(), 1);

    let mut props = Map::new();
    props.insert("url".into(), json!("nope"));
    assert!(matches!(
        ed.resolve_initial_value("missing", props),
        Err(EditorError::NodeNotFound(_))
    ));
}

#[test]
fn test_move_block_and_undo() {
    let mut ed = editor(doc(json!([
        {"_key": "a", "_type": "block", "style": "normal",
         "children": [{"_key": "a1", "_type": "span", "text": "first", "marks": []}], "markDefs": []},
        {"_key": "b", "_type": "block", "style": "normal",
         "children": [{"_key": "b1", "_type": "span", "text": "second", "marks": []}], "markDefs": []}
    ])));

    ed.apply(Operation::MoveNode {
        from: stanza_editor::NodePosition::block(1),
        to: stanza_editor::NodePosition::block(0),
    })
    .unwrap();
    assert_eq!(ed.value().blocks[0].key(), "b");
    assert_eq!(ed.value().blocks[1].key(), "a");

    assert!(ed.undo().unwrap());
    assert_eq!(ed.value().blocks[0].key(), "a");
    assert_eq!(ed.value().blocks[1].key(), "b");
}
