//! Pairing `.in` sections with their goldens
//!
//! All selected pairs of one archive are folded into a single query stream
//! and a single expected-output stream. Cases inside an archive share one
//! execution and one comparison.

use std::collections::BTreeSet;

use crate::common::{split_list, Error, Result};

use super::archive::Archive;

/// Suffix marking an input section
pub const INPUT_SUFFIX: &str = ".in";

/// Suffix marking a golden section
pub const GOLDEN_SUFFIX: &str = ".golden";

/// Prefix of directive lines inside query text
pub const DIRECTIVE_PREFIX: &str = "CMD ";

/// Restricts which `.in` sections of an archive participate
///
/// An empty filter selects every input section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeFilter(BTreeSet<String>);

impl IncludeFilter {
    /// Parse a comma-separated include list; empty entries are ignored
    pub fn parse(list: &str) -> Self {
        Self(split_list(list).into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn allows(&self, name: &str) -> bool {
        self.0.is_empty() || self.0.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// One input section paired with its golden section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub input: String,
    pub golden: String,
}

/// Everything one unit executes and compares
#[derive(Debug, Clone, Default)]
pub struct CombinedRun {
    /// Selected cases in archive order
    pub cases: Vec<TestCase>,
    /// Filtered inputs, each followed by a line break
    pub query: String,
    /// Filtered goldens, ending in exactly one line break
    pub golden: String,
}

/// Derive the golden section name for an input section
///
/// Every occurrence of `.in` is removed before `.golden` is appended, so a
/// name such as `a.inner.in` maps to `aner.golden`.
pub fn golden_name(input: &str) -> String {
    format!("{}{}", input.replace(INPUT_SUFFIX, ""), GOLDEN_SUFFIX)
}

/// Drop `/*` and `--` comment lines from query text
pub fn filter_query_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.starts_with("/*") && !line.starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop `#` comment lines and blank lines from golden text
///
/// The result always ends with a single line break.
pub fn filter_golden_content(content: &str) -> String {
    let mut out = content
        .lines()
        .filter(|line| !line.starts_with('#') && !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

/// Select, pair and concatenate the cases of an archive
///
/// Fails with [`Error::MissingGolden`] before anything is executed if a
/// selected input has no golden counterpart.
pub fn assemble(archive: &Archive, includes: &IncludeFilter) -> Result<CombinedRun> {
    let mut run = CombinedRun::default();
    let mut golden = String::new();

    for section in archive.sections() {
        if !section.name.ends_with(INPUT_SUFFIX) || !includes.allows(&section.name) {
            continue;
        }

        let golden_section_name = golden_name(&section.name);
        let golden_section =
            archive
                .get(&golden_section_name)
                .ok_or_else(|| Error::MissingGolden {
                    input: section.name.clone(),
                    golden: golden_section_name.clone(),
                })?;

        run.query.push_str(&filter_query_content(&section.content));
        run.query.push('\n');
        golden.push_str(&filter_golden_content(&golden_section.content));

        run.cases.push(TestCase {
            input: section.name.clone(),
            golden: golden_section_name,
        });
    }

    for name in includes.names() {
        if archive.get(name).is_none() {
            tracing::warn!("include '{}' matches no section", name);
        }
    }

    run.golden = filter_golden_content(&golden);
    Ok(run)
}

/// Whether a query line is a host directive
pub fn is_directive(line: &str) -> bool {
    line.starts_with(DIRECTIVE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(text: &str) -> Archive {
        Archive::parse(text, true).unwrap()
    }

    #[test]
    fn test_minimal_pass_assembly() {
        let run = assemble(
            &archive("-- a.in --\nSELECT 1;\n-- a.golden --\n# c\n1\n"),
            &IncludeFilter::default(),
        )
        .unwrap();

        assert_eq!(run.query, "SELECT 1;\n");
        assert_eq!(run.golden, "1\n");
        assert_eq!(
            run.cases,
            vec![TestCase {
                input: "a.in".into(),
                golden: "a.golden".into()
            }]
        );
    }

    #[test]
    fn test_missing_golden() {
        let err = assemble(
            &archive("-- a.in --\nSELECT 1;\n-- a.golden --\n1\n-- b.in --\nSELECT 2;\n"),
            &IncludeFilter::default(),
        )
        .unwrap_err();
        assert!(
            matches!(&err, Error::MissingGolden { input, golden } if input == "b.in" && golden == "b.golden")
        );
    }

    #[test]
    fn test_include_filter_limits_cases() {
        let text = "-- a.in --\nSELECT 1;\n-- a.golden --\n1\n-- b.in --\nSELECT 2;\n-- b.golden --\n2\n";
        let run = assemble(&archive(text), &IncludeFilter::parse("b.in")).unwrap();
        assert_eq!(run.cases.len(), 1);
        assert_eq!(run.query, "SELECT 2;\n");
        assert_eq!(run.golden, "2\n");

        let all = assemble(&archive(text), &IncludeFilter::parse(",,")).unwrap();
        assert_eq!(all.cases.len(), 2);
        assert_eq!(all.query, "SELECT 1;\nSELECT 2;\n");
        assert_eq!(all.golden, "1\n2\n");
    }

    #[test]
    fn test_filtered_out_input_needs_no_golden() {
        let text = "-- a.in --\nSELECT 1;\n-- a.golden --\n1\n-- b.in --\nSELECT 2;\n";
        let run = assemble(&archive(text), &IncludeFilter::parse("a.in")).unwrap();
        assert_eq!(run.cases.len(), 1);
    }

    #[test]
    fn test_case_count_matches_selected_inputs() {
        let text = "-- x.in --\n-- x.golden --\n-- y.in --\n-- y.golden --\n-- notes --\nhi\n";
        let run = assemble(&archive(text), &IncludeFilter::default()).unwrap();
        assert_eq!(run.cases.len(), 2);

        let none = assemble(&archive("-- notes --\nhi\n"), &IncludeFilter::default()).unwrap();
        assert!(none.cases.is_empty());
        assert_eq!(none.query, "");
    }

    #[test]
    fn test_query_comments_stripped() {
        let filtered = filter_query_content("/* header */\n-- note\nSELECT 1;\nCMD rm -f db\n");
        assert_eq!(filtered, "SELECT 1;\nCMD rm -f db");
    }

    #[test]
    fn test_golden_comments_and_blanks_stripped() {
        assert_eq!(filter_golden_content("# c\n\n1\n\n2\n"), "1\n2\n");
        assert_eq!(filter_golden_content(""), "\n");
    }

    #[test]
    fn test_filters_are_idempotent() {
        let query = filter_query_content("/* a */\nSELECT 1;\n-- b\nSELECT 2;");
        assert_eq!(filter_query_content(&query), query);

        let golden = filter_golden_content("# a\n1\n\n2\n");
        assert_eq!(filter_golden_content(&golden), golden);
    }

    #[test]
    fn test_golden_name_substring_replacement() {
        assert_eq!(golden_name("a.in"), "a.golden");
        assert_eq!(golden_name("select_where.in"), "select_where.golden");
        assert_eq!(golden_name("a.inner.in"), "aner.golden");
    }

    #[test]
    fn test_directive_prefix() {
        assert!(is_directive("CMD echo hi"));
        assert!(!is_directive("CMD"));
        assert!(!is_directive(" CMD echo"));
    }
}
