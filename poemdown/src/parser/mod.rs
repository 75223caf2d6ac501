pub mod error;
mod poems;
mod structural;
mod title;

pub use error::ParseDiagnostic;
pub use poems::PoemParse;
pub use structural::BlockParse;

use serde::{Deserialize, Serialize};

use crate::poem::Poem;

/// Knobs shared by every parsing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Keep `key: value` list items in block content after harvesting them.
    pub keep_attr_items: bool,
    /// Enable GFM tables and strikethrough while lexing.
    pub gfm: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            keep_attr_items: false,
            gfm: true,
        }
    }
}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    options: ParseOptions,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Split the source into heading blocks.
    pub fn parse_blocks(&self) -> BlockParse {
        structural::parse_blocks(&self.source, self.file_id, &self.options)
    }

    /// Parse the source into poems, one per heading.
    pub fn parse_poems(&self) -> PoemParse {
        poems::parse_poems(&self.source, self.file_id, &self.options)
    }
}

/// Split `source` into heading blocks.
pub fn parse_markdown_blocks(source: &str, options: &ParseOptions) -> BlockParse {
    structural::parse_blocks(source, 0, options)
}

/// Parse `source` into poems, one per heading.
pub fn parse_poems(source: &str, options: &ParseOptions) -> PoemParse {
    poems::parse_poems(source, 0, options)
}

/// [`parse_poems`] with default options, discarding diagnostics.
pub fn parse_poems_str(source: &str) -> Vec<Poem> {
    parse_poems(source, &ParseOptions::default()).poems
}
