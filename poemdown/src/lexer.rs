//! Top-level markdown tokens.
//!
//! Wraps pulldown-cmark and flattens its event stream into one [`Token`] per
//! top-level block. Every token keeps the exact source text it was lexed from,
//! so later stages can rebuild body content without re-rendering markdown.

use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

type Spanned<'a> = (Event<'a>, Range<usize>);

/// A top-level markdown block.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Heading {
        depth: u8,
        /// Inline source of the heading, without `#` markers.
        text: String,
        raw: String,
        span: Range<usize>,
    },
    List {
        /// Declared ordinal of an ordered list; `None` for bullet lists.
        start: Option<u64>,
        items: Vec<ListItem>,
        raw: String,
        span: Range<usize>,
    },
    /// Paragraphs, code, tables, quotes, rules, html, link definitions.
    Raw { raw: String, span: Range<usize> },
}

/// One entry of a [`Token::List`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    /// Inline source of the item's leading paragraph, marker removed.
    pub text: String,
    /// Source of the whole item, marker included.
    pub raw: String,
    pub span: Range<usize>,
    /// Source of the blocks after the leading paragraph, from the start of
    /// their first line.
    pub trailing: Option<String>,
}

impl Token {
    pub fn raw(&self) -> &str {
        match self {
            Token::Heading { raw, .. } | Token::List { raw, .. } | Token::Raw { raw, .. } => raw,
        }
    }

    pub fn span(&self) -> Range<usize> {
        match self {
            Token::Heading { span, .. } | Token::List { span, .. } | Token::Raw { span, .. } => {
                span.clone()
            }
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Token::Heading { .. })
    }
}

/// Lex `source` into top-level tokens. Whitespace-only blocks are skipped.
///
/// Source between blocks that pulldown-cmark emits no events for, such as
/// link reference definitions, comes back as [`Token::Raw`].
pub fn lex(source: &str, gfm: bool) -> Vec<Token> {
    let options = if gfm {
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES
    } else {
        Options::empty()
    };
    let events: Vec<Spanned<'_>> = CmarkParser::new_ext(source, options)
        .into_offset_iter()
        .collect();

    let mut tokens = Vec::new();
    let mut covered = 0;
    let mut i = 0;

    while i < events.len() {
        let (ref ev, ref range) = events[i];
        if range.start > covered {
            tokens.extend(gap_token(source, covered..range.start));
        }
        covered = covered.max(range.end);

        match ev {
            Event::Start(tag) => {
                let end = matching_end(&events, i);
                let inner = &events[i + 1..end];
                tokens.extend(build_token(source, tag, range.clone(), inner));
                i = end + 1;
            }
            Event::Rule | Event::Html(_) => {
                tokens.extend(raw_token(source, range.clone()));
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if covered < source.len() {
        tokens.extend(gap_token(source, covered..source.len()));
    }

    log::trace!("lexed {} top-level tokens", tokens.len());
    tokens
}

fn build_token(source: &str, tag: &Tag<'_>, span: Range<usize>, inner: &[Spanned<'_>]) -> Option<Token> {
    let raw = trim_line_breaks(&source[span.clone()]);
    if raw.trim().is_empty() {
        return None;
    }

    let token = match tag {
        Tag::Heading { level, .. } => Token::Heading {
            depth: heading_level_to_u8(level),
            text: inline_source(source, inner).trim().to_string(),
            raw: raw.to_string(),
            span,
        },
        Tag::List(start) => Token::List {
            start: *start,
            items: collect_items(source, inner),
            raw: raw.to_string(),
            span,
        },
        _ => Token::Raw {
            raw: raw.to_string(),
            span,
        },
    };
    Some(token)
}

fn raw_token(source: &str, span: Range<usize>) -> Option<Token> {
    let raw = trim_line_breaks(&source[span.clone()]);
    if raw.trim().is_empty() {
        return None;
    }
    Some(Token::Raw {
        raw: raw.to_string(),
        span,
    })
}

/// Unlexed source between two blocks, leading blank lines dropped.
fn gap_token(source: &str, gap: Range<usize>) -> Option<Token> {
    let text = &source[gap.clone()];
    let lead = text.len() - text.trim_start_matches(['\n', '\r']).len();
    raw_token(source, gap.start + lead..gap.end)
}

/// Collect the direct items of a list whose inner events are `inner`.
fn collect_items(source: &str, inner: &[Spanned<'_>]) -> Vec<ListItem> {
    let mut items = Vec::new();
    let mut i = 0;

    while i < inner.len() {
        let (ref ev, ref range) = inner[i];
        match ev {
            Event::Start(Tag::Item) => {
                let end = matching_end(inner, i);
                let (text, rest) = item_parts(source, &inner[i + 1..end]);
                let trailing = rest
                    .map(|start| trim_line_breaks(&source[line_start(source, start)..range.end]))
                    .filter(|t| !t.trim().is_empty())
                    .map(str::to_string);
                items.push(ListItem {
                    text,
                    raw: trim_line_breaks(&source[line_start(source, range.start)..range.end])
                        .to_string(),
                    span: range.clone(),
                    trailing,
                });
                i = end + 1;
            }
            Event::Start(_) => {
                i = matching_end(inner, i) + 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    items
}

/// Inline source of an item's leading paragraph, and the offset where the
/// blocks after it begin.
fn item_parts(source: &str, events: &[Spanned<'_>]) -> (String, Option<usize>) {
    let mut extent: Option<Range<usize>> = None;
    let mut leading_done = false;
    let mut rest = None;

    for (ev, range) in events {
        match ev {
            Event::Start(tag) if leading_done || is_nested_block(tag) => {
                rest = Some(range.start);
                break;
            }
            Event::Rule => {
                rest = Some(range.start);
                break;
            }
            Event::End(TagEnd::Paragraph) => leading_done |= extent.is_some(),
            Event::Start(_) | Event::End(_) => {}
            _ if leading_done => {
                rest = Some(range.start);
                break;
            }
            _ => extend(&mut extent, range),
        }
    }

    let text = extent
        .map(|r| source[r].trim().to_string())
        .unwrap_or_default();
    (text, rest)
}

fn is_nested_block(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::List(_)
            | Tag::CodeBlock(_)
            | Tag::BlockQuote(_)
            | Tag::Heading { .. }
            | Tag::Table(_)
            | Tag::HtmlBlock
    )
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

/// Source covered by a run of inline events.
fn inline_source<'s>(source: &'s str, events: &[Spanned<'_>]) -> &'s str {
    let mut extent: Option<Range<usize>> = None;
    for (_, range) in events {
        extend(&mut extent, range);
    }
    extent.map(|r| &source[r]).unwrap_or("")
}

fn extend(extent: &mut Option<Range<usize>>, range: &Range<usize>) {
    *extent = Some(match extent.take() {
        Some(r) => r.start.min(range.start)..r.end.max(range.end),
        None => range.clone(),
    });
}

/// Index of the `End` event closing the `Start` at `start`.
fn matching_end(events: &[Spanned<'_>], start: usize) -> usize {
    let mut depth = 0usize;
    for (j, (ev, _)) in events.iter().enumerate().skip(start) {
        match ev {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return j;
                }
            }
            _ => {}
        }
    }
    events.len().saturating_sub(1)
}

fn trim_line_breaks(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_text_drops_markers() {
        let tokens = lex("## 4. 《咏鹅》 - 骆宾王 ##\n", true);
        match &tokens[..] {
            [Token::Heading { depth, text, .. }] => {
                assert_eq!(*depth, 2);
                assert_eq!(text, "4. 《咏鹅》 - 骆宾王");
            }
            other => panic!("unexpected tokens: {:?}", other),
        }
    }

    #[test]
    fn heading_text_keeps_inline_markup() {
        let tokens = lex("# **静夜思**", true);
        match &tokens[..] {
            [Token::Heading { text, .. }] => assert_eq!(text, "**静夜思**"),
            other => panic!("unexpected tokens: {:?}", other),
        }
    }

    #[test]
    fn ordered_list_keeps_start() {
        let tokens = lex("4. 《咏鹅》 - 骆宾王", true);
        match &tokens[..] {
            [Token::List { start, items, .. }] => {
                assert_eq!(*start, Some(4));
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].text, "《咏鹅》 - 骆宾王");
            }
            other => panic!("unexpected tokens: {:?}", other),
        }
    }

    #[test]
    fn list_items_keep_marker_in_raw() {
        let source = "鹅鹅鹅。\n* **标签**: 动物, 童趣\n* 描述: 唱歌\n";
        let tokens = lex(source, true);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].raw(), "鹅鹅鹅。");
        match &tokens[1] {
            Token::List { start, items, .. } => {
                assert_eq!(*start, None);
                let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
                assert_eq!(texts, vec!["**标签**: 动物, 童趣", "描述: 唱歌"]);
                assert_eq!(items[1].raw, "* 描述: 唱歌");
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn nested_list_does_not_leak_into_item_text() {
        let tokens = lex("* 外\n  * 内\n", true);
        match &tokens[..] {
            [Token::List { items, .. }] => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].text, "外");
            }
            other => panic!("unexpected tokens: {:?}", other),
        }
    }

    #[test]
    fn item_blocks_after_leading_paragraph_are_trailing() {
        let tokens = lex("* tags: a\n\n  续\n* 第二\n", true);
        match &tokens[..] {
            [Token::List { items, .. }] => {
                assert_eq!(items[0].text, "tags: a");
                assert_eq!(items[0].trailing.as_deref(), Some("  续"));
                assert_eq!(items[1].trailing, None);
            }
            other => panic!("unexpected tokens: {:?}", other),
        }
    }

    #[test]
    fn nested_list_is_trailing() {
        let tokens = lex("* 外\n  * 内\n", true);
        match &tokens[..] {
            [Token::List { items, .. }] => {
                assert_eq!(items[0].trailing.as_deref(), Some("  * 内"));
            }
            other => panic!("unexpected tokens: {:?}", other),
        }
    }

    #[test]
    fn link_definitions_are_kept_as_raw() {
        let source = "段一\n\n[ref]: http://x\n\n段二\n";
        let tokens = lex(source, true);
        let raws: Vec<&str> = tokens.iter().map(Token::raw).collect();
        assert_eq!(raws, vec!["段一", "[ref]: http://x", "段二"]);
        assert_eq!(&source[tokens[1].span()], "[ref]: http://x\n\n");
    }

    #[test]
    fn trailing_link_definition_is_kept() {
        let tokens = lex("# t\n段一\n\n[ref]: http://x \"标题\"\n", true);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].raw(), "[ref]: http://x \"标题\"");
    }

    #[test]
    fn empty_source_has_no_tokens() {
        assert!(lex("", true).is_empty());
        assert!(lex("\n\n   \n", true).is_empty());
    }
}
