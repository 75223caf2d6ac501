//! Inline pinyin annotations: `羌笛(qiang1 di2)`.
//!
//! An annotation is a run of CJK characters immediately followed by a
//! parenthesized, space-separated syllable list. The syllable count decides
//! how many trailing characters of the run are annotated; any earlier
//! characters of the run stay plain text.
//!
//! Everything here is driven by one scanner, [`segments`], which walks the
//! input once and checks the CJK range by code point.

use serde::Serialize;

/// Inclusive code-point range of characters that can carry an annotation.
pub const CJK_RANGE: std::ops::RangeInclusive<char> = '\u{4e00}'..='\u{9fa5}';

pub fn is_cjk(c: char) -> bool {
    CJK_RANGE.contains(&c)
}

/// A piece of annotated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied through unchanged, including any unannotated prefix of a
    /// CJK run.
    Text(&'a str),
    /// The annotated tail of a CJK run and the raw annotation between the
    /// parentheses.
    Annotated { word: &'a str, pinyin: &'a str },
}

/// Split `text` into plain and annotated segments in a single pass.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut flushed = 0;
    let mut run_start: Option<usize> = None;
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        let next = pos + c.len_utf8();

        if is_cjk(c) {
            run_start.get_or_insert(pos);
            pos = next;
            continue;
        }

        if let (Some(start), '(') = (run_start, c) {
            if let Some(len) = text[next..].find(')').filter(|&len| len > 0) {
                let pinyin = &text[next..next + len];
                let word_start = start + annotated_offset(&text[start..pos], pinyin);
                if flushed < word_start {
                    out.push(Segment::Text(&text[flushed..word_start]));
                }
                out.push(Segment::Annotated {
                    word: &text[word_start..pos],
                    pinyin,
                });
                pos = next + len + 1;
                flushed = pos;
                run_start = None;
                continue;
            }
        }

        run_start = None;
        pos = next;
    }

    if flushed < text.len() {
        out.push(Segment::Text(&text[flushed..]));
    }
    out
}

/// Byte offset into `run` where the annotated tail begins.
///
/// More syllables than characters annotates the whole run.
fn annotated_offset(run: &str, pinyin: &str) -> usize {
    let syllables = pinyin.split(' ').count();
    let chars = run.chars().count();
    if syllables >= chars {
        return 0;
    }
    run.char_indices()
        .nth(chars - syllables)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Rewrite annotations as `<ruby>` markup, keeping the syllables verbatim.
pub fn to_ruby_html(text: &str) -> String {
    to_ruby_html_with(text, str::to_string)
}

/// Rewrite annotations as `<ruby>` markup, passing each syllable group
/// through `transform` first (for example [`crate::pinyin::convert_syllables`]).
///
/// Runs of two or more spaces in the result become `<br>`.
pub fn to_ruby_html_with(text: &str, transform: impl Fn(&str) -> String) -> String {
    let mut html = String::with_capacity(text.len() * 2);
    for segment in segments(text) {
        match segment {
            Segment::Text(s) => html.push_str(s),
            Segment::Annotated { word, pinyin } => {
                html.push_str("<ruby>");
                html.push_str(word);
                html.push_str("<rp>(</rp><rt>");
                html.push_str(&transform(pinyin));
                html.push_str("</rt><rp>)</rp></ruby>");
            }
        }
    }
    collapse_spaces(&html)
}

/// Remove every `(pinyin)` annotation, keeping the annotated words.
pub fn strip_annotations(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Text(s) => plain.push_str(s),
            Segment::Annotated { word, .. } => plain.push_str(word),
        }
    }
    plain
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut spaces = 0usize;
    for c in s.chars() {
        if c == ' ' {
            spaces += 1;
            continue;
        }
        flush_spaces(&mut out, spaces);
        spaces = 0;
        out.push(c);
    }
    flush_spaces(&mut out, spaces);
    out
}

fn flush_spaces(out: &mut String, spaces: usize) {
    match spaces {
        0 => {}
        1 => out.push(' '),
        _ => out.push_str("<br>"),
    }
}

/// One square of a tracing worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HanziCell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,
}

impl HanziCell {
    fn plain(text: &str) -> Self {
        HanziCell {
            text: text.to_string(),
            pinyin: None,
        }
    }
}

/// Break annotated text into worksheet cells.
///
/// Each annotated character becomes its own cell carrying its syllable;
/// unannotated stretches stay whole and every line break is a cell of its own.
pub fn hanzi_cells(text: &str) -> Vec<HanziCell> {
    let mut cells = Vec::new();

    for segment in segments(text) {
        match segment {
            Segment::Text(s) => {
                for (i, line) in s.split('\n').enumerate() {
                    if i > 0 {
                        cells.push(HanziCell::plain("\n"));
                    }
                    if !line.is_empty() {
                        cells.push(HanziCell::plain(line));
                    }
                }
            }
            Segment::Annotated { word, pinyin } => {
                let syllables: Vec<&str> = pinyin.split_whitespace().collect();
                let chars = word.chars().count();
                for (k, c) in word.chars().enumerate() {
                    let syllable = (k + syllables.len())
                        .checked_sub(chars)
                        .and_then(|i| syllables.get(i));
                    cells.push(HanziCell {
                        text: c.to_string(),
                        pinyin: syllable.map(|s| s.to_string()),
                    });
                }
            }
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RUBY_NIHAO: &str = "<ruby>你好<rp>(</rp><rt>ni3 hao3</rt><rp>)</rp></ruby>";

    #[test]
    fn annotates_whole_word() {
        assert_eq!(to_ruby_html("你好(ni3 hao3)"), RUBY_NIHAO);
        assert_eq!(
            to_ruby_html("羌笛(qiang1 di2)何须怨"),
            "<ruby>羌笛<rp>(</rp><rt>qiang1 di2</rt><rp>)</rp></ruby>何须怨"
        );
    }

    #[test]
    fn leading_characters_become_prefix() {
        assert_eq!(
            to_ruby_html("红掌拨(bō)清波"),
            "红掌<ruby>拨<rp>(</rp><rt>bō</rt><rp>)</rp></ruby>清波"
        );
        assert_eq!(
            to_ruby_html("不舍昼夜(zhòu yè)"),
            "不舍<ruby>昼夜<rp>(</rp><rt>zhòu yè</rt><rp>)</rp></ruby>"
        );
    }

    #[test]
    fn extra_syllables_annotate_the_whole_run() {
        assert_eq!(
            to_ruby_html("花(hua1 er5)"),
            "<ruby>花<rp>(</rp><rt>hua1 er5</rt><rp>)</rp></ruby>"
        );
    }

    #[test]
    fn non_cjk_before_paren_is_left_alone() {
        assert_eq!(to_ruby_html("abc(def)"), "abc(def)");
        assert_eq!(to_ruby_html("你好 (ni3)"), "你好 (ni3)");
        assert_eq!(to_ruby_html("你好()"), "你好()");
        assert_eq!(to_ruby_html("你好(ni3"), "你好(ni3");
    }

    #[test]
    fn punctuation_ends_a_run() {
        assert_eq!(
            to_ruby_html("鹅，鹅(é)"),
            "鹅，<ruby>鹅<rp>(</rp><rt>é</rt><rp>)</rp></ruby>"
        );
    }

    #[test]
    fn double_spaces_become_breaks() {
        assert_eq!(to_ruby_html("床前明月光  \n疑是地上霜"), "床前明月光<br>\n疑是地上霜");
        assert_eq!(to_ruby_html("a b"), "a b");
        assert_eq!(to_ruby_html("a     b"), "a<br>b");
    }

    #[test]
    fn transform_applies_to_syllables() {
        let html = to_ruby_html_with("你好(ni3 hao3)", |s| s.to_uppercase());
        assert!(html.contains("<rt>NI3 HAO3</rt>"));
    }

    #[test]
    fn strips_annotations() {
        assert_eq!(
            strip_annotations("鹅(é)鹅鹅，红掌拨(bō)清波。"),
            "鹅鹅鹅，红掌拨清波。"
        );
    }

    #[test]
    fn cells_split_annotated_characters() {
        let cells = hanzi_cells("不舍昼夜(zhòu yè)。\n川(chuān)");
        let expected = vec![
            HanziCell::plain("不舍"),
            HanziCell {
                text: "昼".into(),
                pinyin: Some("zhòu".into()),
            },
            HanziCell {
                text: "夜".into(),
                pinyin: Some("yè".into()),
            },
            HanziCell::plain("。"),
            HanziCell::plain("\n"),
            HanziCell {
                text: "川".into(),
                pinyin: Some("chuān".into()),
            },
        ];
        assert_eq!(cells, expected);
    }
}
