//! Character and pinyin tracing worksheet pages.
//!
//! A page lists its cells either explicitly or as a comma-separated `value`
//! interpreted according to the page `type`:
//!
//! ```json
//! { "title": "一年级上 拼音 1", "type": "pinyin", "value": "yi1,er4,san1" }
//! { "title": "Test", "items": [{ "pinyin": "yi1", "char": "一" }, { "char": "三" }] }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Char,
    Pinyin,
}

/// One cell of a worksheet page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,
    #[serde(default, rename = "char", skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
}

/// A worksheet page as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetPage {
    pub title: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PageItem>>,
}

/// A worksheet page reduced to its cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPage {
    pub title: String,
    pub items: Vec<PageItem>,
}

impl WorksheetPage {
    /// The page type, if it is one this crate understands.
    pub fn page_kind(&self) -> Option<PageKind> {
        match self.kind.as_deref() {
            Some("char") => Some(PageKind::Char),
            Some("pinyin") => Some(PageKind::Pinyin),
            _ => None,
        }
    }

    /// Explicit items win; otherwise `value` is split on commas by page type.
    pub fn normalize(&self) -> NormalizedPage {
        let items = match (&self.items, self.page_kind()) {
            (Some(items), _) => items.clone(),
            (None, Some(PageKind::Pinyin)) => self
                .entries()
                .map(|entry| PageItem {
                    pinyin: (!entry.is_empty()).then(|| entry.to_string()),
                    character: None,
                })
                .collect(),
            (None, Some(PageKind::Char)) => self
                .entries()
                .map(|entry| PageItem {
                    pinyin: None,
                    character: Some(entry.to_string()),
                })
                .collect(),
            (None, None) => Vec::new(),
        };
        NormalizedPage {
            title: self.title.clone(),
            items,
        }
    }

    fn entries(&self) -> impl Iterator<Item = &str> {
        self.value.as_deref().unwrap_or("").split(',')
    }
}

pub fn normalize_document(pages: &[WorksheetPage]) -> Vec<NormalizedPage> {
    pages.iter().map(WorksheetPage::normalize).collect()
}
