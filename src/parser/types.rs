//! Common types for the requirements parser

/// A requirement entry found in a requirements file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name without extras (e.g., "requests")
    pub name: String,
    /// Extras annotation including brackets (e.g., "[security]"), empty when absent
    pub extras: String,
    /// Constraint text as written, surrounding whitespace trimmed (e.g., ">=1.2,<2.0")
    pub raw_constraint: String,
    /// Line number (0-indexed)
    pub line: usize,
}

impl Requirement {
    /// Returns the key used to identify this requirement in reports (name plus extras)
    pub fn key(&self) -> String {
        format!("{}{}", self.name, self.extras)
    }

    /// Returns true if the line carries a direct URL reference (`pkg @ https://...`)
    pub fn is_direct_reference(&self) -> bool {
        self.raw_constraint.starts_with('@')
    }
}

/// A requirement line split into its verbatim segments
///
/// Concatenating `indent`, `name`, `extras`, `constraint_region` and `tail`
/// yields the original line byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParts<'a> {
    /// Leading whitespace
    pub indent: &'a str,
    /// Package name token
    pub name: &'a str,
    /// Extras annotation including brackets, or empty
    pub extras: &'a str,
    /// Constraint text including the whitespace around it
    pub constraint_region: &'a str,
    /// Environment marker and/or inline comment, or empty
    pub tail: &'a str,
}

impl<'a> LineParts<'a> {
    /// Constraint text without surrounding whitespace
    pub fn constraint(&self) -> &'a str {
        self.constraint_region.trim()
    }

    /// Rebuilds the line with a different constraint, keeping every other segment verbatim
    pub fn with_constraint(&self, constraint: &str) -> String {
        let trimmed = self.constraint_region.trim();
        let (leading, trailing) = if trimmed.is_empty() {
            (self.constraint_region, "")
        } else {
            let start = self.constraint_region.len() - self.constraint_region.trim_start().len();
            let end = self.constraint_region.trim_end().len();
            (
                &self.constraint_region[..start],
                &self.constraint_region[end..],
            )
        };

        format!(
            "{}{}{}{}{}{}{}",
            self.indent, self.name, self.extras, leading, constraint, trailing, self.tail
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parts<'a>(constraint_region: &'a str, tail: &'a str) -> LineParts<'a> {
        LineParts {
            indent: "",
            name: "foo",
            extras: "",
            constraint_region,
            tail,
        }
    }

    #[rstest]
    #[case("==1.0", "", "==1.1", "foo==1.1")]
    #[case(" >= 1.0 ", "; python_version<'3.8'", "==1.1", "foo ==1.1 ; python_version<'3.8'")]
    #[case(">=1.0,<2.0", "  # pinned", "==2.1", "foo==2.1  # pinned")]
    #[case("==1.0\r", "", "==1.1", "foo==1.1\r")]
    #[case("  ", "", "==1.1", "foo  ==1.1")]
    fn with_constraint_keeps_surrounding_segments(
        #[case] region: &str,
        #[case] tail: &str,
        #[case] constraint: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(parts(region, tail).with_constraint(constraint), expected);
    }

    #[test]
    fn with_constraint_preserves_extras() {
        let line = LineParts {
            indent: "    ",
            name: "celery",
            extras: "[redis]",
            constraint_region: "==5.2.0",
            tail: "",
        };

        assert_eq!(line.with_constraint("==5.3.1"), "    celery[redis]==5.3.1");
    }

    #[rstest]
    #[case("foo", "", "foo")]
    #[case("foo", "[bar]", "foo[bar]")]
    fn key_joins_name_and_extras(#[case] name: &str, #[case] extras: &str, #[case] key: &str) {
        let requirement = Requirement {
            name: name.to_string(),
            extras: extras.to_string(),
            raw_constraint: "==1.0".to_string(),
            line: 0,
        };
        assert_eq!(requirement.key(), key);
    }
}
