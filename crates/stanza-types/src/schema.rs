//! Read-only schema description consumed by the normalization plugins.

use smol_str::SmolStr;

/// Allowed types, styles, lists and marks for a portable-text field.
///
/// This is a plain description handed in by the host; the editor never
/// mutates it. Defaults mirror the standard portable-text block schema.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaTypes {
    /// Type name of text blocks.
    pub block_type: SmolStr,
    /// Type name of text spans.
    pub span_type: SmolStr,
    /// Allowed block styles.
    pub styles: Vec<SmolStr>,
    /// Fallback style for blocks with a missing or unknown style.
    pub normal_style: SmolStr,
    /// Decorator mark names (strong, em, ...).
    pub decorators: Vec<SmolStr>,
    /// Annotation type names allowed in `markDefs`.
    pub annotations: Vec<SmolStr>,
    /// Allowed list item kinds. Empty means lists are unsupported.
    pub lists: Vec<SmolStr>,
    /// Maximum list nesting level.
    pub max_list_level: u32,
    /// Non-text block object types.
    pub block_objects: Vec<SmolStr>,
    /// Inline object types allowed as children of text blocks.
    pub inline_objects: Vec<SmolStr>,
}

impl Default for SchemaTypes {
    fn default() -> Self {
        let s = SmolStr::new_static;
        Self {
            block_type: s("block"),
            span_type: s("span"),
            styles: vec![
                s("normal"),
                s("h1"),
                s("h2"),
                s("h3"),
                s("h4"),
                s("h5"),
                s("h6"),
                s("blockquote"),
            ],
            normal_style: s("normal"),
            decorators: vec![
                s("strong"),
                s("em"),
                s("code"),
                s("underline"),
                s("strike-through"),
            ],
            annotations: vec![s("link")],
            lists: vec![s("bullet"), s("number")],
            max_list_level: 10,
            block_objects: Vec::new(),
            inline_objects: Vec::new(),
        }
    }
}

impl SchemaTypes {
    pub fn is_block_type(&self, name: &str) -> bool {
        self.block_type == name
    }

    pub fn is_span_type(&self, name: &str) -> bool {
        self.span_type == name
    }

    pub fn style_allowed(&self, style: &str) -> bool {
        self.styles.iter().any(|s| s == style)
    }

    pub fn is_decorator(&self, mark: &str) -> bool {
        self.decorators.iter().any(|d| d == mark)
    }

    pub fn list_allowed(&self, kind: &str) -> bool {
        self.lists.iter().any(|l| l == kind)
    }

    /// Whether the schema supports lists at all.
    pub fn supports_lists(&self) -> bool {
        !self.lists.is_empty()
    }

    pub fn is_block_object(&self, name: &str) -> bool {
        self.block_objects.iter().any(|t| t == name)
    }

    pub fn is_inline_object(&self, name: &str) -> bool {
        self.inline_objects.iter().any(|t| t == name)
    }

    /// Whether a type is valid at the top level of the document.
    pub fn block_level_type(&self, name: &str) -> bool {
        self.is_block_type(name) || self.is_block_object(name)
    }

    /// Whether a type is valid as a child of a text block.
    pub fn child_level_type(&self, name: &str) -> bool {
        self.is_span_type(name) || self.is_inline_object(name)
    }
}
