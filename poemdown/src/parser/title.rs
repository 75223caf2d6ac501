//! Heading lines: `4. 《咏鹅》 - 骆宾王` → index, title, author.

use crate::lexer::{self, Token};

const AUTHOR_SEPARATOR: &str = " - ";

/// What a heading line says about its poem.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HeadingParts {
    /// Declared ordinal; `None` means the caller's positional fallback applies.
    pub index: Option<f64>,
    pub title: String,
    pub author: String,
    /// Items after the first when the heading lexed as a multi-item list.
    pub discarded_items: usize,
    /// A numeric-looking prefix that was stripped but held no number.
    pub unparsed_prefix: Option<String>,
}

pub(crate) fn split_heading(heading: &str, gfm: bool) -> HeadingParts {
    let mut parts = HeadingParts {
        index: None,
        title: heading.to_string(),
        author: String::new(),
        discarded_items: 0,
        unparsed_prefix: None,
    };

    // `4. Title` lexes as an ordered list starting at 4.
    match lexer::lex(heading, gfm).as_slice() {
        [Token::List { start, items, .. }] => {
            parts.index = start.map(|n| n as f64);
            parts.title = items.first().map(|i| i.text.clone()).unwrap_or_default();
            parts.discarded_items = items.len().saturating_sub(1);
        }
        _ => {
            if let Some((prefix, rest)) = numeric_prefix(heading) {
                parts.index = parse_float_prefix(prefix);
                if parts.index.is_none() {
                    parts.unparsed_prefix = Some(prefix.to_string());
                }
                parts.title = rest.to_string();
            }
        }
    }

    let pieces: Vec<&str> = parts.title.split(AUTHOR_SEPARATOR).collect();
    if let [title, author] = pieces.as_slice() {
        let (title, author) = (title.trim().to_string(), author.trim().to_string());
        parts.title = title;
        parts.author = author;
    }

    parts
}

/// Leading run of digits, `+` and `.` plus one following whitespace character.
fn numeric_prefix(title: &str) -> Option<(&str, &str)> {
    let len = title
        .find(|c: char| !(c.is_ascii_digit() || c == '+' || c == '.'))
        .unwrap_or(title.len());
    if len == 0 {
        return None;
    }
    let (prefix, rest) = title.split_at(len);
    let rest = match rest.chars().next() {
        Some(c) if c.is_whitespace() => &rest[c.len_utf8()..],
        _ => rest,
    };
    Some((prefix, rest))
}

/// Longest leading decimal number of `s`, ignoring whatever follows it.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.strip_prefix('+').unwrap_or(s);
    let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (int_part, rest) = s.split_at(int_len);
    let frac_part = rest
        .strip_prefix('.')
        .map(|r| &r[..r.find(|c: char| !c.is_ascii_digit()).unwrap_or(r.len())])
        .unwrap_or("");
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = if frac_part.is_empty() { "0" } else { frac_part };
    format!("{}.{}", int_part, frac_part).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(heading: &str) -> HeadingParts {
        split_heading(heading, true)
    }

    #[test]
    fn ordered_list_heading() {
        let parts = split("4. 《咏鹅》 - 骆宾王");
        assert_eq!(parts.index, Some(4.0));
        assert_eq!(parts.title, "《咏鹅》");
        assert_eq!(parts.author, "骆宾王");
    }

    #[test]
    fn numeric_prefix_without_space() {
        let parts = split("12.《静夜思》");
        assert_eq!(parts.index, Some(12.0));
        assert_eq!(parts.title, "《静夜思》");
        assert_eq!(parts.author, "");
    }

    #[test]
    fn fractional_prefix() {
        let parts = split("141.1 《论语》十二章");
        assert_eq!(parts.index, Some(141.1));
        assert_eq!(parts.title, "《论语》十二章");
    }

    #[test]
    fn plain_title_keeps_fallback() {
        let parts = split("《风》 - 李峤");
        assert_eq!(parts.index, None);
        assert_eq!(parts.title, "《风》");
        assert_eq!(parts.author, "李峤");
    }

    #[test]
    fn more_than_one_separator_keeps_title() {
        let parts = split("《甲》 - 乙 - 丙");
        assert_eq!(parts.title, "《甲》 - 乙 - 丙");
        assert_eq!(parts.author, "");
    }

    #[test]
    fn dots_only_prefix_is_reported() {
        let parts = split("... 省略");
        assert_eq!(parts.index, None);
        assert_eq!(parts.unparsed_prefix.as_deref(), Some("..."));
        assert_eq!(parts.title, "省略");
    }

    #[test]
    fn float_prefix_follows_leading_number() {
        assert_eq!(parse_float_prefix("4."), Some(4.0));
        assert_eq!(parse_float_prefix("1.2.3"), Some(1.2));
        assert_eq!(parse_float_prefix("+3"), Some(3.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("++3"), None);
        assert_eq!(parse_float_prefix("."), None);
    }
}
