use std::ops::Range;

use crate::block::{Attrs, MdBlock};
use crate::parser::ParseOptions;
use crate::parser::error::ParseDiagnostic;
use crate::parser::structural::{self, BlockParse};
use crate::parser::title;
use crate::poem::Poem;
use crate::ruby;

const DESC_KEYS: [&str; 2] = ["desc", "描述"];
const TAGS_KEYS: [&str; 2] = ["tags", "标签"];

/// Poems found in a document plus anything worth reporting about them.
#[derive(Debug, Clone, PartialEq)]
pub struct PoemParse {
    pub poems: Vec<Poem>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

pub(crate) fn parse_poems(source: &str, file_id: usize, options: &ParseOptions) -> PoemParse {
    let BlockParse {
        blocks,
        mut diagnostics,
    } = structural::parse_blocks(source, file_id, options);

    let poems: Vec<Poem> = blocks
        .into_iter()
        .enumerate()
        .map(|(position, block)| {
            let heading_span = heading_line(source, &block.span);
            let (poem, found) = build_poem(position, block, options);
            diagnostics.extend(found.into_iter().map(|(message, note)| {
                ParseDiagnostic::warning(message, heading_span.clone(), file_id).with_note(note)
            }));
            poem
        })
        .collect();

    log::debug!("parsed {} poems", poems.len());
    PoemParse { poems, diagnostics }
}

/// Build one poem; also returns `(message, note)` pairs for anything dropped.
fn build_poem(position: usize, block: MdBlock, options: &ParseOptions) -> (Poem, Vec<(String, String)>) {
    let mut found = Vec::new();
    let heading = title::split_heading(&block.title, options.gfm);

    if heading.discarded_items > 0 {
        found.push((
            format!(
                "heading lexes as a list with {} extra item(s)",
                heading.discarded_items
            ),
            "only the first item is used as the title".to_string(),
        ));
    }
    if let Some(prefix) = &heading.unparsed_prefix {
        found.push((
            format!("numeric prefix `{}` is not a number", prefix),
            format!("using the block position {} as the index", position),
        ));
    }

    let MdBlock {
        content, mut attrs, ..
    } = block;

    let desc_key = alias_key(&attrs, &DESC_KEYS);
    let tags_key = alias_key(&attrs, &TAGS_KEYS);
    let desc = attrs.shift_remove(&desc_key).unwrap_or_default();
    let tags = attrs
        .shift_remove(&tags_key)
        .map(|value| split_tags(&value))
        .unwrap_or_default();

    let html = ruby::to_ruby_html(&content);

    let poem = Poem {
        index: heading.index.unwrap_or(position as f64),
        title: heading.title,
        author: heading.author,
        content,
        attrs,
        desc,
        tags,
        html,
    };
    (poem, found)
}

/// Alias declared first in the document, else the first of `aliases`.
///
/// With both `tags` and `标签` present, whichever list item came first wins
/// and the other stays in `attrs`.
fn alias_key(attrs: &Attrs, aliases: &[&str]) -> String {
    attrs
        .keys()
        .find(|k| aliases.contains(&k.as_str()))
        .cloned()
        .unwrap_or_else(|| aliases[0].to_string())
}

fn split_tags(value: &str) -> Vec<String> {
    value
        .split([',', '，'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Span of the first line of a block.
fn heading_line(source: &str, block: &Range<usize>) -> Range<usize> {
    let start = block.start.min(source.len());
    let end = source[start..]
        .find('\n')
        .map(|p| start + p)
        .unwrap_or(source.len());
    start..end
}
