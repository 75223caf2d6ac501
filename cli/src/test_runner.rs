use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use poemdown::parser::{ParseDiagnostic, ParseOptions, Parser};
use poemdown::{Attrs, Poem};

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

/// Fields to check on one parsed poem. Absent fields are not checked.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedPoem {
    #[serde(default)]
    pub index: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub attrs: Option<Attrs>,
    /// Exact content comparison.
    #[serde(default)]
    pub content: Option<String>,
    /// Substrings that must appear in the rendered HTML.
    #[serde(default)]
    pub html_contains: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Parse options for this fixture.
    #[serde(default)]
    pub options: ParseOptions,

    /// Expected number of poems.
    #[serde(default)]
    pub expect_count: Option<usize>,

    /// Expectations for the leading poems, in document order.
    #[serde(default)]
    pub poems: Vec<ExpectedPoem>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    /// Each entry checks message substring and optionally the source line.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Parse a `.test.md` file into its TOML config and poem markdown.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();
    log::debug!("running {}", path.display());

    let parse = Parser::new(source.to_string(), 0)
        .with_options(config.options.clone())
        .parse_poems();

    if let Some(expected) = config.expect_count {
        if parse.poems.len() != expected {
            let titles: Vec<&str> = parse.poems.iter().map(|p| p.title.as_str()).collect();
            return fail(
                description,
                format!(
                    "expected {} poem(s), got {}\n  titles: {:?}",
                    expected,
                    parse.poems.len(),
                    titles
                ),
            );
        }
    }

    if let Some(reason) = check_poems(&parse.poems, &config.poems) {
        return fail(description, reason);
    }

    if let Some(expected_warnings) = &config.expect_warnings {
        if let Some(reason) = check_warnings(source, &parse.diagnostics, expected_warnings) {
            return fail(description, reason);
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

/// Compare parsed poems against expectations. Returns `Some(reason)` on mismatch.
fn check_poems(actual: &[Poem], expected: &[ExpectedPoem]) -> Option<String> {
    if actual.len() < expected.len() {
        return Some(format!(
            "expected at least {} poem(s), got {}",
            expected.len(),
            actual.len()
        ));
    }

    for (i, (poem, want)) in actual.iter().zip(expected).enumerate() {
        let mut problems = Vec::new();

        if let Some(index) = want.index {
            if poem.index != index {
                problems.push(format!("index: expected {}, got {}", index, poem.index));
            }
        }
        mismatch(&mut problems, "title", &want.title, &poem.title);
        mismatch(&mut problems, "author", &want.author, &poem.author);
        mismatch(&mut problems, "desc", &want.desc, &poem.desc);
        mismatch(&mut problems, "content", &want.content, &poem.content);
        mismatch(&mut problems, "tags", &want.tags, &poem.tags);
        mismatch(&mut problems, "attrs", &want.attrs, &poem.attrs);

        for needle in &want.html_contains {
            if !poem.html.contains(needle.as_str()) {
                problems.push(format!(
                    "html: expected to contain {:?}\n    html: {:?}",
                    needle, poem.html
                ));
            }
        }

        if !problems.is_empty() {
            return Some(format!("poem[{}] \"{}\":\n  {}", i, poem.title, problems.join("\n  ")));
        }
    }

    None
}

fn mismatch<T: PartialEq + std::fmt::Debug>(
    problems: &mut Vec<String>,
    field: &str,
    expected: &Option<T>,
    actual: &T,
) {
    if let Some(expected) = expected {
        if expected != actual {
            problems.push(format!("{}: expected {:?}, got {:?}", field, expected, actual));
        }
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    diagnostics: &[ParseDiagnostic],
    expected: &[ExpectedWarning],
) -> Option<String> {
    let actual_warnings: Vec<&ParseDiagnostic> =
        diagnostics.iter().filter(|d| d.is_warning()).collect();

    if actual_warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = actual_warnings
            .iter()
            .map(|w| format!("  - {}", w))
            .collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual_warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual_warnings.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();

        if !msg.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn ok_label(no_color: bool) -> &'static str {
    if no_color { "ok" } else { "\x1b[32mok\x1b[0m" }
}

fn failed_label(no_color: bool) -> &'static str {
    if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn result_label(result: &TestResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("?")
    })
}

/// Select the categories to run. Unknown requests are reported and skipped.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for request in requested {
        let req = request.trim_matches('/');
        let prefix = format!("{}/", req);
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&prefix) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        let selected = select_categories(&all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
            .into_iter()
            .map(|(cat, files)| (cat.to_string(), files.clone()))
            .collect()
    };

    let single_file = path.is_file();
    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !single_file {
            eprintln!();
            eprintln!("{}", bold(category_label(cat), no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), result_label(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), result_label(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", ok_label(no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            failed_label(no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn fixtures_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures")
    }

    #[test]
    fn frontmatter_splits_config_from_source() {
        let content = "---\ndescription = \"d\"\nexpect_count = 1\n---\n# 《春晓》\n春眠不觉晓\n";
        let (config, source) = parse_test_file(content).unwrap();
        assert_eq!(config.description.as_deref(), Some("d"));
        assert_eq!(config.expect_count, Some(1));
        assert!(config.options.gfm);
        assert_eq!(source, "# 《春晓》\n春眠不觉晓\n");
    }

    #[test]
    fn frontmatter_requires_delimiters() {
        assert!(parse_test_file("# no frontmatter").is_err());
        assert!(parse_test_file("---\nexpect_count = 1\n").is_err());
    }

    #[test]
    fn byte_offsets_map_to_lines() {
        let source = "a\nbb\nccc";
        assert_eq!(byte_offset_to_line(source, 0), 1);
        assert_eq!(byte_offset_to_line(source, 2), 2);
        assert_eq!(byte_offset_to_line(source, 5), 3);
        assert_eq!(byte_offset_to_line(source, 100), 3);
    }

    #[test]
    fn poem_mismatch_names_the_field() {
        let poems = poemdown::parse_poems_str("# 《春晓》 - 孟浩然\n春眠不觉晓");
        let expected = vec![ExpectedPoem {
            author: Some("李白".into()),
            ..ExpectedPoem::default()
        }];
        let reason = check_poems(&poems, &expected).unwrap();
        assert!(reason.contains("author: expected \"李白\", got \"孟浩然\""));
    }

    #[test]
    fn failing_fixture_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wrong.test.md");
        std::fs::write(&path, "---\nexpect_count = 2\n---\n# 《春晓》\n春眠不觉晓\n").unwrap();
        assert_eq!(run_tests(&path, true, &[]), 1);
    }

    #[test]
    fn bundled_fixtures_pass() {
        assert_eq!(run_tests(&fixtures_dir(), true, &[]), 0);
    }

    #[test]
    fn unknown_category_runs_nothing() {
        assert_eq!(run_tests(&fixtures_dir(), true, &["nope".to_string()]), 1);
    }
}
