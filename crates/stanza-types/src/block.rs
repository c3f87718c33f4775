//! Block-structured document value.
//!
//! A `Document` is an ordered sequence of `Block`s. Text blocks own an
//! ordered sequence of `Child`ren (spans and inline objects) plus a
//! `markDefs` table of annotation objects referenced by key from span marks.
//! Non-text blocks carry an opaque JSON payload.
//!
//! The document is plain data. All invariant enforcement (key uniqueness,
//! mark resolution, style defaults) lives in the editor's normalization
//! plugins, not here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

/// The portable-text document value: an ordered sequence of blocks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Find a block by `_key`.
    pub fn block_by_key(&self, key: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.key() == key)
    }

    pub fn block_by_key_mut(&mut self, key: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.key() == key)
    }

    /// Index of the block with the given `_key`.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.key() == key)
    }
}

/// A single block: either a text block or an opaque object block.
///
/// Untagged on the wire; text blocks are recognized by their `children`
/// array, everything else falls through to the object representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Block {
    Text(TextBlock),
    Object(ObjectBlock),
}

impl Block {
    pub fn key(&self) -> &SmolStr {
        match self {
            Block::Text(b) => &b.key,
            Block::Object(b) => &b.key,
        }
    }

    pub fn set_key(&mut self, key: SmolStr) {
        match self {
            Block::Text(b) => b.key = key,
            Block::Object(b) => b.key = key,
        }
    }

    pub fn type_name(&self) -> &SmolStr {
        match self {
            Block::Text(b) => &b.type_name,
            Block::Object(b) => &b.type_name,
        }
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Block::Text(b) => Some(b),
            Block::Object(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Text(b) => Some(b),
            Block::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectBlock> {
        match self {
            Block::Object(b) => Some(b),
            Block::Text(_) => None,
        }
    }
}

/// A text block: styled, optionally part of a list, owning children and
/// annotation definitions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(rename = "_type")]
    pub type_name: SmolStr,
    #[serde(default)]
    pub style: SmolStr,
    #[serde(rename = "listItem", default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    pub children: Vec<Child>,
    #[serde(rename = "markDefs", default)]
    pub mark_defs: Vec<MarkDef>,
}

impl TextBlock {
    /// Concatenated text of all spans.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let Child::Span(span) = child {
                out.push_str(&span.text);
            }
        }
        out
    }

    pub fn child_by_key(&self, key: &str) -> Option<&Child> {
        self.children.iter().find(|c| c.key() == key)
    }

    pub fn child_by_key_mut(&mut self, key: &str) -> Option<&mut Child> {
        self.children.iter_mut().find(|c| c.key() == key)
    }

    pub fn index_of_child(&self, key: &str) -> Option<usize> {
        self.children.iter().position(|c| c.key() == key)
    }

    pub fn mark_def(&self, key: &str) -> Option<&MarkDef> {
        self.mark_defs.iter().find(|d| d.key == key)
    }
}

/// A non-text block with an opaque payload (image, embed, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectBlock {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(rename = "_type")]
    pub type_name: SmolStr,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A child of a text block: a text span or an inline object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    Span(Span),
    InlineObject(InlineObject),
}

impl Child {
    pub fn key(&self) -> &SmolStr {
        match self {
            Child::Span(s) => &s.key,
            Child::InlineObject(o) => &o.key,
        }
    }

    pub fn set_key(&mut self, key: SmolStr) {
        match self {
            Child::Span(s) => s.key = key,
            Child::InlineObject(o) => o.key = key,
        }
    }

    pub fn type_name(&self) -> &SmolStr {
        match self {
            Child::Span(s) => &s.type_name,
            Child::InlineObject(o) => &o.type_name,
        }
    }

    pub fn as_span(&self) -> Option<&Span> {
        match self {
            Child::Span(s) => Some(s),
            Child::InlineObject(_) => None,
        }
    }

    pub fn as_span_mut(&mut self) -> Option<&mut Span> {
        match self {
            Child::Span(s) => Some(s),
            Child::InlineObject(_) => None,
        }
    }
}

/// A run of text with an ordered set of marks.
///
/// A mark is either a decorator name (from the schema) or the `_key` of an
/// annotation in the owning block's `markDefs`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(rename = "_type")]
    pub type_name: SmolStr,
    pub text: String,
    #[serde(default)]
    pub marks: Vec<SmolStr>,
}

impl Span {
    pub fn new(key: impl Into<SmolStr>, type_name: impl Into<SmolStr>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            type_name: type_name.into(),
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// An inline (non-span) object inside a text block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineObject {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(rename = "_type")]
    pub type_name: SmolStr,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// An annotation object stored in a block's `markDefs` table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(rename = "_type")]
    pub type_name: SmolStr,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Document {
        serde_json::from_value(json!([
            {
                "_key": "a",
                "_type": "block",
                "style": "normal",
                "children": [
                    {"_key": "a1", "_type": "span", "text": "hello ", "marks": []},
                    {"_key": "a2", "_type": "span", "text": "world", "marks": ["strong", "m1"]}
                ],
                "markDefs": [{"_key": "m1", "_type": "link", "href": "https://example.com"}]
            },
            {"_key": "b", "_type": "image", "url": "x.png"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_untagged_block_shapes() {
        let doc = sample_doc();
        assert_eq!(doc.len(), 2);
        assert!(doc.blocks[0].as_text().is_some());
        assert!(doc.blocks[1].as_object().is_some());
        assert_eq!(doc.blocks[1].type_name(), "image");
    }

    #[test]
    fn test_plain_text_and_lookup() {
        let doc = sample_doc();
        let block = doc.block_by_key("a").unwrap().as_text().unwrap();
        assert_eq!(block.plain_text(), "hello world");
        assert_eq!(block.index_of_child("a2"), Some(1));
        assert!(block.mark_def("m1").is_some());
        assert_eq!(doc.index_of("b"), Some(1));
    }

    #[test]
    fn test_serde_round_trip() {
        let doc = sample_doc();
        let value = serde_json::to_value(&doc).unwrap();
        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn test_missing_keys_deserialize_empty() {
        let doc: Document = serde_json::from_value(json!([
            {"_type": "block", "style": "normal", "children": [
                {"_type": "span", "text": "x"}
            ]}
        ]))
        .unwrap();
        assert_eq!(doc.blocks[0].key(), "");
        let block = doc.blocks[0].as_text().unwrap();
        assert_eq!(block.children[0].key(), "");
    }
}
