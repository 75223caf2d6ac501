use std::ops::Range;

use indexmap::IndexMap;
use serde::Serialize;

/// Attributes harvested from a block's `key: value` list items, in the
/// order each key was first declared.
pub type Attrs = IndexMap<String, String>;

/// A section of a markdown document introduced by a heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MdBlock {
    /// Heading level: 1 for `#` through 6 for `######`.
    pub head_level: u8,
    /// Inline source of the heading line.
    pub title: String,
    /// Raw markdown between this heading and the next, attribute items removed.
    pub content: String,
    pub attrs: Attrs,
    /// Byte span in source, heading included.
    #[serde(skip)]
    pub span: Range<usize>,
}
