//! Version constraint parser
//!
//! A constraint is a comma-separated list of clauses that must all hold,
//! e.g. `>=1.2,<2.0`. Each clause is an operator followed by a version
//! starting with a digit. Anything else is rejected instead of guessed.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::version::legacy::LegacyVersion;

/// Matches one clause: operator, optional whitespace, version token
static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(~=|==|!=|>=|<=|>|<)\s*([0-9][0-9A-Za-z.+_!\-]*)\s*$")
        .expect("clause pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("empty clause in constraint '{constraint}'")]
    EmptyClause { constraint: String },

    #[error("malformed clause '{clause}' in constraint '{constraint}'")]
    MalformedClause { constraint: String, clause: String },

    #[error("'~={version}' needs at least two release segments")]
    InvalidCompatibleRelease { version: String },
}

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `~=`: at least the given version, within the same release series
    Compatible,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Compatible => "~=",
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "~=" => Ok(Operator::Compatible),
            _ => Err(()),
        }
    }
}

/// A single `(operator, version)` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub operator: Operator,
    pub version: LegacyVersion,
    /// Exclusive upper bound of a `~=` clause
    ceiling: Option<LegacyVersion>,
}

impl Clause {
    pub fn new(operator: Operator, version: &str) -> Result<Self, ConstraintError> {
        let ceiling = match operator {
            Operator::Compatible => Some(compatible_ceiling(version)?),
            _ => None,
        };

        Ok(Self {
            operator,
            version: LegacyVersion::parse(version),
            ceiling,
        })
    }

    /// Check whether `version` satisfies this clause
    pub fn matches(&self, version: &LegacyVersion) -> bool {
        match self.operator {
            Operator::Eq => version == &self.version,
            Operator::Ne => version != &self.version,
            Operator::Lt => version < &self.version,
            Operator::Le => version <= &self.version,
            Operator::Gt => version > &self.version,
            Operator::Ge => version >= &self.version,
            Operator::Compatible => {
                version >= &self.version
                    && self.ceiling.as_ref().is_none_or(|ceiling| version < ceiling)
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator.as_str(), self.version)
    }
}

/// Upper bound of `~=X.Y[.Z...]`: drop the last release segment, bump the one before
///
/// The bound is a `.dev0` version so pre-releases of the next series are excluded too.
/// Pre- and post-release suffixes (`1.4.2rc1`, `1.4.post1`) end the release part.
fn compatible_ceiling(version: &str) -> Result<LegacyVersion, ConstraintError> {
    let release = release_segments(version);

    let Some((_, prefix)) = release.split_last().filter(|(_, prefix)| !prefix.is_empty()) else {
        return Err(ConstraintError::InvalidCompatibleRelease {
            version: version.to_string(),
        });
    };

    let mut bumped: Vec<String> = prefix.iter().map(|segment| segment.to_string()).collect();
    if let Some(last) = bumped.last_mut() {
        *last = increment(last);
    }

    Ok(LegacyVersion::parse(&format!("{}.dev0", bumped.join("."))))
}

/// Leading numeric segments of a version (`["1", "4", "2"]` for `1.4.2rc1`)
fn release_segments(version: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in version.split('.') {
        let digits = segment
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(segment.len());
        if digits == 0 {
            break;
        }
        segments.push(&segment[..digits]);
        if digits < segment.len() {
            break;
        }
    }
    segments
}

/// Add one to a decimal string of any length
fn increment(digits: &str) -> String {
    let mut result: Vec<char> = digits.chars().collect();
    for digit in result.iter_mut().rev() {
        if *digit == '9' {
            *digit = '0';
        } else {
            *digit = char::from(*digit as u8 + 1);
            return result.into_iter().collect();
        }
    }
    result.insert(0, '1');
    result.into_iter().collect()
}

/// All clauses of a constraint, ANDed together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    clauses: Vec<Clause>,
}

impl Constraint {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Check whether `version` satisfies every clause
    pub fn matches(&self, version: &LegacyVersion) -> bool {
        self.clauses.iter().all(|clause| clause.matches(version))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self.clauses.iter().map(Clause::to_string).collect();
        f.write_str(&clauses.join(","))
    }
}

/// Parse a constraint string
///
/// # Returns
/// * `Ok(None)` - The input is empty (the requirement is unconstrained)
/// * `Ok(Some(Constraint))` - Every clause parsed
/// * `Err(ConstraintError)` - A clause does not match the grammar
pub fn parse_constraint(input: &str) -> Result<Option<Constraint>, ConstraintError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let mut clauses = Vec::new();
    for raw_clause in input.split(',') {
        if raw_clause.trim().is_empty() {
            return Err(ConstraintError::EmptyClause {
                constraint: input.to_string(),
            });
        }

        let captures =
            CLAUSE_RE
                .captures(raw_clause)
                .ok_or_else(|| ConstraintError::MalformedClause {
                    constraint: input.to_string(),
                    clause: raw_clause.trim().to_string(),
                })?;

        let operator = captures[1]
            .parse::<Operator>()
            .map_err(|_| ConstraintError::MalformedClause {
                constraint: input.to_string(),
                clause: raw_clause.trim().to_string(),
            })?;

        clauses.push(Clause::new(operator, &captures[2])?);
    }

    Ok(Some(Constraint::new(clauses)))
}
