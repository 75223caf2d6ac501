//! An owned, parsed poem collection and the queries a reader UI runs on it.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::parser::{ParseDiagnostic, ParseOptions, Parser};
use crate::poem::Poem;

/// A value and how many poems carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// Selection applied by [`PoemLibrary::filter`]. Empty sets match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoemFilter {
    /// Keep poems carrying any of these tags.
    pub tags: BTreeSet<String>,
    /// Keep poems by any of these authors.
    pub authors: BTreeSet<String>,
}

impl PoemFilter {
    /// Filter selecting exactly `tags` and `authors`. Repeated values collapse.
    pub fn selecting<T, A>(tags: T, authors: A) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        PoemFilter {
            tags: tags.into_iter().map(Into::into).collect(),
            authors: authors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, poem: &Poem) -> bool {
        let tag_ok = self.tags.is_empty() || poem.tags.iter().any(|t| self.tags.contains(t));
        let author_ok = self.authors.is_empty() || self.authors.contains(&poem.author);
        tag_ok && author_ok
    }

    /// Add `value` to the tag selection, or remove it if already selected.
    pub fn toggle_tag(&mut self, value: &str) {
        toggle(&mut self.tags, value);
    }

    /// Add `value` to the author selection, or remove it if already selected.
    pub fn toggle_author(&mut self, value: &str) {
        toggle(&mut self.authors, value);
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

/// Poems parsed once from a markdown document.
///
/// Build it with [`PoemLibrary::parse`] and hand it to whatever renders the
/// poems; there is no shared global copy.
#[derive(Debug, Clone, PartialEq)]
pub struct PoemLibrary {
    poems: Vec<Poem>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl PoemLibrary {
    pub fn parse(source: &str, options: &ParseOptions) -> Self {
        Self::from_parser(&Parser::new(source.to_string(), 0).with_options(options.clone()))
    }

    pub fn from_parser(parser: &Parser) -> Self {
        let parse = parser.parse_poems();
        PoemLibrary {
            poems: parse.poems,
            diagnostics: parse.diagnostics,
        }
    }

    pub fn poems(&self) -> &[Poem] {
        &self.poems
    }

    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.poems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poems.is_empty()
    }

    /// Poem whose declared or positional index equals `index`.
    pub fn by_index(&self, index: f64) -> Option<&Poem> {
        self.poems.iter().find(|p| p.index == index)
    }

    /// Tags by number of poems carrying them, most common first.
    pub fn tag_counts(&self) -> Vec<FacetCount> {
        count_facets(self.poems.iter().flat_map(|p| p.tags.iter().map(String::as_str)))
    }

    /// Non-empty authors by number of poems, most common first.
    pub fn author_counts(&self) -> Vec<FacetCount> {
        count_facets(
            self.poems
                .iter()
                .map(|p| p.author.as_str())
                .filter(|a| !a.is_empty()),
        )
    }

    pub fn filter<'a>(&'a self, filter: &'a PoemFilter) -> impl Iterator<Item = &'a Poem> + 'a {
        self.poems.iter().filter(move |p| filter.matches(p))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Poem> {
        self.poems.iter()
    }
}

impl<'a> IntoIterator for &'a PoemLibrary {
    type Item = &'a Poem;
    type IntoIter = std::slice::Iter<'a, Poem>;

    fn into_iter(self) -> Self::IntoIter {
        self.poems.iter()
    }
}

/// Drop facets seen fewer than `min_count` times.
pub fn facet_min_count(facets: Vec<FacetCount>, min_count: usize) -> Vec<FacetCount> {
    facets.into_iter().filter(|f| f.count >= min_count).collect()
}

/// Count values, sorted by count descending; ties keep first-seen order.
fn count_facets<'a>(values: impl Iterator<Item = &'a str>) -> Vec<FacetCount> {
    let mut facets: Vec<FacetCount> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for value in values {
        match positions.get(value) {
            Some(&i) => facets[i].count += 1,
            None => {
                positions.insert(value, facets.len());
                facets.push(FacetCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    facets.sort_by(|a, b| b.count.cmp(&a.count));
    facets
}
