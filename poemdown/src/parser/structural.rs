use crate::attrs::{ExtractOptions, extract_attrs};
use crate::block::{Attrs, MdBlock};
use crate::lexer::{self, Token};
use crate::parser::ParseOptions;
use crate::parser::error::ParseDiagnostic;
use crate::split::{SplitOptions, split_by};

/// Blocks found in a document plus anything worth reporting about them.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockParse {
    pub blocks: Vec<MdBlock>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split markdown source into one block per heading.
///
/// Content before the first heading belongs to no block and is dropped.
pub fn parse_blocks(source: &str, file_id: usize, options: &ParseOptions) -> BlockParse {
    let tokens = lexer::lex(source, options.gfm);
    let groups = split_by(&tokens, Token::is_heading, SplitOptions::default());

    let mut state = ParseState::new(file_id, options);
    for group in groups {
        state.push_group(group);
    }
    let parse = state.finalize();

    log::debug!(
        "parsed {} blocks from {} tokens",
        parse.blocks.len(),
        tokens.len()
    );
    parse
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'t> {
    file_id: usize,
    options: &'t ParseOptions,
    /// Heading of the block being built; its body arrives in the next group.
    open: Option<&'t Token>,
    blocks: Vec<MdBlock>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'t> ParseState<'t> {
    fn new(file_id: usize, options: &'t ParseOptions) -> Self {
        ParseState {
            file_id,
            options,
            open: None,
            blocks: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn push_group(&mut self, group: &'t [Token]) {
        match group {
            [heading @ Token::Heading { .. }] => {
                self.close(&[]);
                self.open = Some(heading);
            }
            body => match self.open {
                Some(_) => self.close(body),
                None => self.orphan(body),
            },
        }
    }

    fn orphan(&mut self, body: &[Token]) {
        let (Some(first), Some(last)) = (body.first(), body.last()) else {
            return;
        };
        let span = first.span().start..last.span().end;
        log::warn!("dropping {} tokens before the first heading", body.len());
        self.diagnostics.push(
            ParseDiagnostic::warning("content before the first heading is ignored", span, self.file_id)
                .with_note("every poem starts with a heading line"),
        );
    }

    /// Turn the open heading and `body` into a finished block.
    fn close(&mut self, body: &[Token]) {
        let Some(heading) = self.open.take() else {
            return;
        };
        let (head_level, title) = match heading {
            Token::Heading { depth, text, .. } => (*depth, text.clone()),
            Token::List { .. } | Token::Raw { .. } => return,
        };

        let mut attrs = Attrs::new();
        let mut parts: Vec<String> = Vec::with_capacity(body.len());

        for token in body {
            match token {
                Token::List { items, raw, .. } => {
                    let extraction = extract_attrs(
                        items,
                        ExtractOptions {
                            keep_attr_items: self.options.keep_attr_items,
                        },
                    );
                    for entry in extraction.attrs {
                        if let Some(previous) = attrs.insert(entry.key.clone(), entry.value) {
                            self.diagnostics.push(
                                ParseDiagnostic::warning(
                                    format!("duplicate attribute `{}`", entry.key),
                                    entry.span,
                                    self.file_id,
                                )
                                .with_note(format!("overrides earlier value `{}`", previous)),
                            );
                        }
                    }

                    if extraction.items.is_empty() {
                        continue;
                    }
                    if extraction.items == *items {
                        parts.push(raw.clone());
                    } else {
                        let remaining: Vec<&str> =
                            extraction.items.iter().map(|i| i.raw.as_str()).collect();
                        parts.push(remaining.join("\n"));
                    }
                }
                Token::Heading { raw, .. } | Token::Raw { raw, .. } => parts.push(raw.clone()),
            }
        }

        let span_end = body
            .last()
            .map(|t| t.span().end)
            .unwrap_or(heading.span().end);

        self.blocks.push(MdBlock {
            head_level,
            title,
            content: parts.join("\n"),
            attrs,
            span: heading.span().start..span_end,
        });
    }

    fn finalize(mut self) -> BlockParse {
        self.close(&[]);
        BlockParse {
            blocks: self.blocks,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn blocks(source: &str) -> Vec<MdBlock> {
        parse_blocks(source, 0, &ParseOptions::default()).blocks
    }

    #[test]
    fn one_block_per_heading() {
        let parsed = blocks("# a\none\n## b\ntwo\n# c\n");
        let titles: Vec<(u8, &str, &str)> = parsed
            .iter()
            .map(|b| (b.head_level, b.title.as_str(), b.content.as_str()))
            .collect();
        assert_eq!(titles, vec![(1, "a", "one"), (2, "b", "two"), (1, "c", "")]);
    }

    #[test]
    fn no_headings_no_blocks() {
        let parse = parse_blocks("just a paragraph\n\n* and a list", 0, &ParseOptions::default());
        assert!(parse.blocks.is_empty());
        assert_eq!(parse.diagnostics.len(), 1);
        assert!(parse.diagnostics[0].message.contains("before the first heading"));
    }

    #[test]
    fn attribute_lists_leave_content() {
        let parsed = blocks(
            "## 4. 《咏鹅》 - 骆宾王\n鹅(é)鹅鹅，曲项向天歌。\n* **描述**: 大白鹅\n* **标签**: 动物, 童趣\n",
        );
        assert_eq!(parsed.len(), 1);
        let block = &parsed[0];
        assert_eq!(block.title, "4. 《咏鹅》 - 骆宾王");
        assert_eq!(block.content, "鹅(é)鹅鹅，曲项向天歌。");
        assert_eq!(block.attrs.get("描述").map(String::as_str), Some("大白鹅"));
        assert_eq!(block.attrs.get("标签").map(String::as_str), Some("动物, 童趣"));
    }

    #[test]
    fn mixed_list_keeps_plain_items() {
        let parsed = blocks("# t\n\n* 第一\n* tags: a\n* 第二\n");
        assert_eq!(parsed[0].content, "* 第一\n* 第二");
        assert_eq!(parsed[0].attrs.len(), 1);
    }

    #[test]
    fn attribute_item_keeps_its_later_paragraphs() {
        let parsed = blocks("# t\n\n* 第一\n* tags: a\n\n  续\n* 第二\n");
        assert_eq!(parsed[0].content, "* 第一\n  续\n* 第二");
        assert_eq!(parsed[0].attrs.get("tags").map(String::as_str), Some("a"));
    }

    #[test]
    fn link_definitions_stay_in_content() {
        let parsed = blocks("# t\n段一\n\n段二\n\n[ref]: http://x\n");
        assert_eq!(parsed[0].content, "段一\n段二\n[ref]: http://x");
    }

    #[test]
    fn keep_attr_items_leaves_lists_intact() {
        let options = ParseOptions {
            keep_attr_items: true,
            ..ParseOptions::default()
        };
        let parse = parse_blocks("# t\n\n* tags: a\n* desc: b\n", 0, &options);
        let block = &parse.blocks[0];
        assert_eq!(block.content, "* tags: a\n* desc: b");
        assert_eq!(block.attrs.len(), 2);
    }

    #[test]
    fn later_lists_override_earlier_keys() {
        let parse = parse_blocks(
            "# t\n\n* tags: a\n\ntext\n\n* tags: b\n",
            0,
            &ParseOptions::default(),
        );
        let block = &parse.blocks[0];
        assert_eq!(block.attrs.get("tags").map(String::as_str), Some("b"));
        assert_eq!(block.content, "text");
        assert_eq!(parse.diagnostics.len(), 1);
        assert!(parse.diagnostics[0].message.contains("duplicate attribute `tags`"));
    }
}
