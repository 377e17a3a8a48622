//! requirements.txt parser
//!
//! Each requirement line has the shape `name[extras]<constraint>[; marker][ # comment]`.
//! Blank lines, `#` comments and pip option lines (`-r`, `-e`, `--index-url`, ...)
//! are not requirements and are left alone.
//!
//! Format examples:
//! - `requests==2.31.0`
//! - `celery[redis]>=5.2,<6.0`
//! - `pywin32==306 ; sys_platform == "win32"  # windows only`

use std::collections::HashSet;

use tracing::warn;

use crate::parser::types::{LineParts, Requirement};

/// Characters that end the package name token
const NAME_TERMINATORS: &[char] = &['<', '>', '=', '!', '~', '[', ';'];

/// Split a requirements line into its segments
///
/// Returns `None` for blank lines, comments, pip options and lines
/// without a package name.
pub fn split_requirement_line(line: &str) -> Option<LineParts<'_>> {
    let rest = line.trim_start();
    if rest.is_empty() || rest.starts_with('#') || rest.starts_with('-') {
        return None;
    }

    let indent = &line[..line.len() - rest.len()];

    let name_end = rest
        .find(|c: char| NAME_TERMINATORS.contains(&c) || c.is_whitespace())
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return None;
    }

    let mut after = &rest[name_end..];
    let mut extras = "";
    if after.starts_with('[') {
        let close = after.find(']')?;
        extras = &after[..=close];
        after = &after[close + 1..];
    }

    let tail_start = find_tail_start(after).unwrap_or(after.len());

    Some(LineParts {
        indent,
        name,
        extras,
        constraint_region: &after[..tail_start],
        tail: &after[tail_start..],
    })
}

/// Position of an environment marker (`;`) or an inline comment (`#` after whitespace)
fn find_tail_start(text: &str) -> Option<usize> {
    let mut previous: Option<char> = None;
    for (idx, c) in text.char_indices() {
        match c {
            ';' => return Some(idx),
            '#' if previous.is_some_and(char::is_whitespace) => return Some(idx),
            _ => {}
        }
        previous = Some(c);
    }
    None
}

/// Parse the content of a requirements file
///
/// Requirements are returned in file order. When a package name appears
/// more than once, only the first occurrence is kept.
pub fn parse_requirements(content: &str) -> Vec<Requirement> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let Some(parts) = split_requirement_line(line) else {
            continue;
        };

        if !seen.insert(parts.name.to_string()) {
            warn!(
                "Duplicate requirement for {} on line {}, keeping the first one",
                parts.name,
                line_idx + 1
            );
            continue;
        }

        results.push(Requirement {
            name: parts.name.to_string(),
            extras: parts.extras.to_string(),
            raw_constraint: parts.constraint().to_string(),
            line: line_idx,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn requirement(name: &str, extras: &str, constraint: &str, line: usize) -> Requirement {
        Requirement {
            name: name.to_string(),
            extras: extras.to_string(),
            raw_constraint: constraint.to_string(),
            line,
        }
    }

    #[test]
    fn parse_requirements_extracts_names_and_constraints() {
        let content = r#"# frozen deps
requests==2.31.0

celery[redis]>=5.2,<6.0
  flask >= 2.0
django
"#;

        assert_eq!(
            parse_requirements(content),
            vec![
                requirement("requests", "", "==2.31.0", 1),
                requirement("celery", "[redis]", ">=5.2,<6.0", 3),
                requirement("flask", "", ">= 2.0", 4),
                requirement("django", "", "", 5),
            ]
        );
    }

    #[test]
    fn parse_requirements_skips_pip_options() {
        let content = "-r base.txt\n--index-url https://example.com/simple\n-e .\nsix==1.16.0\n";

        assert_eq!(
            parse_requirements(content),
            vec![requirement("six", "", "==1.16.0", 3)]
        );
    }

    #[test]
    fn parse_requirements_keeps_first_duplicate() {
        let content = "six==1.15.0\nsix==1.16.0\n";

        assert_eq!(
            parse_requirements(content),
            vec![requirement("six", "", "==1.15.0", 0)]
        );
    }

    #[test]
    fn parse_requirements_strips_markers_and_comments_from_constraint() {
        let content = "pywin32==306 ; sys_platform == \"win32\"\nattrs>=21.0  # needed by pytest\n";

        assert_eq!(
            parse_requirements(content),
            vec![
                requirement("pywin32", "", "==306", 0),
                requirement("attrs", "", ">=21.0", 1),
            ]
        );
    }

    #[test]
    fn parse_requirements_handles_crlf_line_endings() {
        let content = "six==1.16.0\r\nattrs==23.1.0\r\n";

        assert_eq!(
            parse_requirements(content),
            vec![
                requirement("six", "", "==1.16.0", 0),
                requirement("attrs", "", "==23.1.0", 1),
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("# comment")]
    #[case("   # indented comment")]
    #[case("-r other.txt")]
    #[case("==1.0")]
    #[case("foo[unclosed==1.0")]
    fn split_requirement_line_returns_none_for_non_requirements(#[case] line: &str) {
        assert_eq!(split_requirement_line(line), None);
    }

    #[rstest]
    #[case("foo==1.0", "", "foo", "", "==1.0", "")]
    #[case("foo[bar,baz]!=1.5", "", "foo", "[bar,baz]", "!=1.5", "")]
    #[case("  foo ~= 1.4", "  ", "foo", "", " ~= 1.4", "")]
    #[case("foo==1.0;python_version<'3'", "", "foo", "", "==1.0", ";python_version<'3'")]
    #[case("foo==1.0 # note", "", "foo", "", "==1.0 ", "# note")]
    #[case(
        "foo @ https://example.com/foo.whl#sha256=abc",
        "",
        "foo",
        "",
        " @ https://example.com/foo.whl#sha256=abc",
        ""
    )]
    fn split_requirement_line_returns_segments(
        #[case] line: &str,
        #[case] indent: &str,
        #[case] name: &str,
        #[case] extras: &str,
        #[case] region: &str,
        #[case] tail: &str,
    ) {
        let parts = split_requirement_line(line).unwrap();

        assert_eq!(
            parts,
            LineParts {
                indent,
                name,
                extras,
                constraint_region: region,
                tail,
            }
        );
        assert_eq!(
            format!("{indent}{name}{extras}{region}{tail}"),
            line,
            "segments must reassemble to the original line"
        );
    }

    #[test]
    fn direct_references_are_flagged() {
        let requirements = parse_requirements("foo @ https://example.com/foo.whl\n");

        assert_eq!(requirements.len(), 1);
        assert!(requirements[0].is_direct_reference());
    }
}
