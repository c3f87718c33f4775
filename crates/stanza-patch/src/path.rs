//! Key-addressed paths into a document.
//!
//! A path is a sequence of segments: keyed items (`[_key=="a"]`), named
//! attributes (`.children`, `.text`) and, only for the special case of
//! anchoring inserts into an empty container, numeric indices. Node targets
//! are always addressed by key.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One step of a `Path`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathSegment {
    /// A keyed item in an array: `[_key=="..."]`.
    Key(SmolStr),
    /// A named attribute: `.style`, `.children`, `.text`, ...
    Attr(SmolStr),
    /// A numeric index. Only valid as an insert anchor.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "[_key==\"{k}\"]"),
            PathSegment::Attr(a) => write!(f, ".{a}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// A path from the document root to a node or attribute.
///
/// The empty path addresses the document itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path to the block with the given `_key`.
    pub fn block(key: impl Into<SmolStr>) -> Self {
        Self {
            segments: vec![PathSegment::Key(key.into())],
        }
    }

    /// Append an attribute segment.
    pub fn attr(mut self, name: impl Into<SmolStr>) -> Self {
        self.segments.push(PathSegment::Attr(name.into()));
        self
    }

    /// Append `.children[_key=="..."]`.
    pub fn child(mut self, key: impl Into<SmolStr>) -> Self {
        self.segments.push(PathSegment::Attr(SmolStr::new_static("children")));
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The block key this path addresses, if any.
    pub fn block_key(&self) -> Option<&SmolStr> {
        match self.segments.first() {
            Some(PathSegment::Key(k)) => Some(k),
            _ => None,
        }
    }

    /// The child key this path addresses, if it descends into `children`.
    pub fn child_key(&self) -> Option<&SmolStr> {
        match self.segments.get(..3) {
            Some([PathSegment::Key(_), PathSegment::Attr(a), PathSegment::Key(c)])
                if a == "children" =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// The trailing attribute name, if the path ends in one.
    pub fn leaf_attr(&self) -> Option<&SmolStr> {
        match self.segments.last() {
            Some(PathSegment::Attr(a)) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<root>");
        }
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_builders() {
        let path = Path::block("a").child("a1").attr("text");
        assert_eq!(path.block_key().map(|k| k.as_str()), Some("a"));
        assert_eq!(path.child_key().map(|k| k.as_str()), Some("a1"));
        assert_eq!(path.leaf_attr().map(|a| a.as_str()), Some("text"));
        assert_eq!(path.to_string(), "[_key==\"a\"].children[_key==\"a1\"].text");
    }

    #[test]
    fn test_root_path() {
        let path = Path::root();
        assert!(path.is_root());
        assert_eq!(path.block_key(), None);
        assert_eq!(path.to_string(), "<root>");
    }

    #[test]
    fn test_block_attr_path() {
        let path = Path::block("a").attr("style");
        assert_eq!(path.child_key(), None);
        assert_eq!(path.leaf_attr().map(|a| a.as_str()), Some("style"));
    }
}
