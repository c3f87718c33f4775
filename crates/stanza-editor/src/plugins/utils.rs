//! Builders for schema-conformant nodes.
//!
//! These construct fully-keyed nodes so that inserting them never needs a
//! follow-up key repair. Callers pass keys pulled from the editor's key
//! generator.

use serde_json::{Map, Value};
use smol_str::SmolStr;
use stanza_types::{Block, Child, InlineObject, ObjectBlock, SchemaTypes, Span, TextBlock};

/// An empty text block with the normal style and a single empty span.
pub fn empty_text_block(schema: &SchemaTypes, key: SmolStr, child_key: SmolStr) -> Block {
    Block::Text(TextBlock {
        key,
        type_name: schema.block_type.clone(),
        style: schema.normal_style.clone(),
        list_item: None,
        level: None,
        children: vec![Child::Span(Span::new(
            child_key,
            schema.span_type.clone(),
            "",
        ))],
        mark_defs: Vec::new(),
    })
}

/// A normal-styled text block holding one span with the given text.
pub fn text_block(schema: &SchemaTypes, key: SmolStr, child_key: SmolStr, text: &str) -> Block {
    match empty_text_block(schema, key, child_key) {
        Block::Text(mut block) => {
            if let Some(span) = block.children[0].as_span_mut() {
                span.text = text.to_string();
            }
            Block::Text(block)
        }
        other => other,
    }
}

/// An object block of the given type with initial fields.
pub fn object_block(key: SmolStr, type_name: SmolStr, fields: Map<String, Value>) -> Block {
    Block::Object(ObjectBlock {
        key,
        type_name,
        fields,
    })
}

/// A span child carrying text and marks.
pub fn span(schema: &SchemaTypes, key: SmolStr, text: &str, marks: Vec<SmolStr>) -> Child {
    let mut span = Span::new(key, schema.span_type.clone(), text);
    span.marks = marks;
    Child::Span(span)
}

/// An inline object child of the given type with initial fields.
pub fn inline_object(key: SmolStr, type_name: SmolStr, fields: Map<String, Value>) -> Child {
    Child::InlineObject(InlineObject {
        key,
        type_name,
        fields,
    })
}
