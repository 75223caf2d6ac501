//! `key: value` attribute lines inside markdown lists.

use std::ops::Range;

use crate::block::Attrs;
use crate::lexer::ListItem;

const DELIMITERS: [char; 2] = [':', '：'];

/// Options for [`extract_attrs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Leave attribute items in the list instead of removing them.
    pub keep_attr_items: bool,
}

/// One attribute harvested from a list item.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrEntry {
    pub key: String,
    pub value: String,
    /// Span of the list item that declared it.
    pub span: Range<usize>,
}

/// Result of running [`extract_attrs`] over one list.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Items left in the list. A removed attribute item with blocks after
    /// its label line leaves those blocks behind as an item of their own.
    pub items: Vec<ListItem>,
    /// Attributes in declaration order, duplicates included.
    pub attrs: Vec<AttrEntry>,
}

impl Extraction {
    /// Fold the entries into a map; later keys overwrite earlier ones.
    pub fn to_map(&self) -> Attrs {
        self.attrs
            .iter()
            .map(|a| (a.key.clone(), a.value.clone()))
            .collect()
    }
}

/// Split list items into attributes and ordinary content.
pub fn extract_attrs(items: &[ListItem], options: ExtractOptions) -> Extraction {
    let mut kept = Vec::with_capacity(items.len());
    let mut attrs = Vec::new();

    for item in items {
        match parse_attr_item(&item.text) {
            Some((key, value)) => {
                attrs.push(AttrEntry {
                    key,
                    value,
                    span: item.span.clone(),
                });
                if options.keep_attr_items {
                    kept.push(item.clone());
                } else if let Some(trailing) = &item.trailing {
                    kept.push(ListItem {
                        text: String::new(),
                        raw: trailing.clone(),
                        span: item.span.clone(),
                        trailing: None,
                    });
                }
            }
            None => kept.push(item.clone()),
        }
    }

    Extraction { items: kept, attrs }
}

/// Recognize `label: value` in one item's inline text.
///
/// The label is either a leading emphasized run (`**标签**: 动物`, with the
/// colon inside or outside the emphasis) or a plain run without whitespace.
/// Both the ASCII and the fullwidth colon are accepted.
pub fn parse_attr_item(text: &str) -> Option<(String, String)> {
    let text = text.trim_start();
    let (key, value) = emphasized_attr(text).or_else(|| plain_attr(text))?;
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

fn emphasized_attr(text: &str) -> Option<(&str, &str)> {
    for marker in ["**", "__", "*", "_"] {
        let Some(after) = text.strip_prefix(marker) else {
            continue;
        };
        let Some(end) = after.find(marker) else {
            continue;
        };
        let label = after[..end].trim();
        let rest = &after[end + marker.len()..];

        if let Some(value) = strip_delimiter(rest.trim_start()) {
            return Some((label, value));
        }
        if let Some(label) = label.strip_suffix(DELIMITERS) {
            return Some((label.trim_end(), rest));
        }
        return None;
    }
    None
}

fn plain_attr(text: &str) -> Option<(&str, &str)> {
    let idx = text.find(DELIMITERS)?;
    let label = &text[..idx];
    if label.chars().any(char::is_whitespace) {
        return None;
    }
    strip_delimiter(&text[idx..]).map(|value| (label, value))
}

fn strip_delimiter(rest: &str) -> Option<&str> {
    let value = rest.strip_prefix(DELIMITERS)?;
    // `scheme://` is a link, not a label
    if rest.starts_with(':') && value.starts_with("//") {
        return None;
    }
    Some(value)
}
