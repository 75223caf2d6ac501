use serde::{Serialize, Serializer};

use crate::block::Attrs;
use crate::ruby;

/// One poem parsed from a heading block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poem {
    /// Declared ordinal from the heading, or the block position.
    #[serde(serialize_with = "serialize_index")]
    pub index: f64,
    pub title: String,
    pub author: String,
    /// Block markdown with pinyin annotations still inline.
    pub content: String,
    /// Attributes other than the description and tags.
    pub attrs: Attrs,
    pub desc: String,
    pub tags: Vec<String>,
    /// `content` with annotations rewritten as ruby markup.
    pub html: String,
}

impl Poem {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Content without the `(pinyin)` annotations.
    pub fn plain_text(&self) -> String {
        ruby::strip_annotations(&self.content)
    }

    /// Number of CJK characters in the content.
    pub fn hanzi_count(&self) -> usize {
        self.content.chars().filter(|&c| ruby::is_cjk(c)).count()
    }

    /// Ruby markup with the syllables passed through `transform`.
    pub fn html_with(&self, transform: impl Fn(&str) -> String) -> String {
        ruby::to_ruby_html_with(&self.content, transform)
    }
}

/// Whole indices serialize as integers, so `4` rather than `4.0`.
fn serialize_index<S: Serializer>(index: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if index.fract() == 0.0 && index.abs() < MAX_EXACT {
        serializer.serialize_i64(*index as i64)
    } else {
        serializer.serialize_f64(*index)
    }
}
