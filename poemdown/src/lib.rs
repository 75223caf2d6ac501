pub mod attrs;
pub mod block;
pub mod lexer;
pub mod library;
pub mod parser;
pub mod pinyin;
pub mod poem;
pub mod ruby;
pub mod split;
pub mod worksheet;

pub use attrs::{extract_attrs, parse_attr_item};
pub use block::{Attrs, MdBlock};
pub use library::{PoemFilter, PoemLibrary};
pub use parser::{ParseOptions, Parser, parse_markdown_blocks, parse_poems, parse_poems_str};
pub use pinyin::{convert_syllables, convert_tone};
pub use poem::Poem;
pub use ruby::{hanzi_cells, strip_annotations, to_ruby_html, to_ruby_html_with};
pub use split::split_by;
pub use worksheet::WorksheetPage;
