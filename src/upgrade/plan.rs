//! Upgrade candidate resolution
//!
//! For every requirement, the resolver parses its constraint, fetches the
//! package's releases, finds the highest release the constraint currently
//! allows and lists every newer release as an upgrade candidate. Packages
//! that cannot be planned are reported with a reason instead of failing the
//! run.

use std::fmt;

use futures::StreamExt;
use futures::stream;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::parser::constraint::{Constraint, ConstraintError, parse_constraint};
use crate::parser::types::Requirement;
use crate::upgrade::report::Console;
use crate::version::error::RegistryError;
use crate::version::legacy::LegacyVersion;
use crate::version::registry::Registry;
use crate::version::types::{RegistryPackage, Release};

/// Why a requirement has no upgrade plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No constraint, so no current version can be established
    Unconstrained,
    /// `pkg @ url` requirement, not served by the index
    DirectReference,
    MalformedConstraint(ConstraintError),
    /// The index does not know the package
    PackageNotFound,
    /// The index could not be queried; holds the error message
    RegistryUnavailable(String),
    /// No published release satisfies the constraint
    NoCompatibleVersion,
    /// Nothing newer than the highest compatible release
    UpToDate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unconstrained => write!(f, "no version specified"),
            SkipReason::DirectReference => write!(f, "direct reference, not on the index"),
            SkipReason::MalformedConstraint(e) => write!(f, "{}", e),
            SkipReason::PackageNotFound => write!(f, "doesn't exist on the package index"),
            SkipReason::RegistryUnavailable(e) => write!(f, "package index unavailable: {}", e),
            SkipReason::NoCompatibleVersion => write!(f, "no published version matches"),
            SkipReason::UpToDate => write!(f, "already up to date"),
        }
    }
}

/// A requirement that will not be tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPackage {
    /// Name plus extras, as written in the requirements file
    pub key: String,
    pub constraint: String,
    pub reason: SkipReason,
}

/// Upgrade candidates of one requirement, built once before any mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    /// Name plus extras, as written in the requirements file
    pub key: String,
    /// Bare package name, used to locate the line in the requirements file
    pub name: String,
    /// Constraint text before any trial
    pub constraint: String,
    /// Highest release currently allowed by the constraint
    pub current_max: LegacyVersion,
    /// Releases strictly newer than `current_max`, ascending
    pub candidates: Vec<Release>,
}

/// Result of planning: packages to try, in file order, and everything skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub plans: IndexMap<String, UpgradePlan>,
    pub skipped: Vec<SkippedPackage>,
}

impl PlanReport {
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Keys of packages skipped because nothing newer exists
    pub fn up_to_date(&self) -> impl Iterator<Item = &str> {
        self.skipped
            .iter()
            .filter(|s| s.reason == SkipReason::UpToDate)
            .map(|s| s.key.as_str())
    }

    /// Packages skipped for any reason other than being up to date
    pub fn not_planned(&self) -> impl Iterator<Item = &SkippedPackage> {
        self.skipped
            .iter()
            .filter(|s| s.reason != SkipReason::UpToDate)
    }
}

/// Compute the current maximum and the upgrade candidates of one package
///
/// `current_max` is the highest release satisfying every clause; candidates
/// are all releases strictly greater than it, whatever the constraint says.
pub fn resolve_candidates(
    constraint: &Constraint,
    package: &RegistryPackage,
) -> Result<(LegacyVersion, Vec<Release>), SkipReason> {
    let current_max = package
        .releases()
        .iter()
        .filter(|release| constraint.matches(&release.version))
        .map(|release| &release.version)
        .max()
        .cloned()
        .ok_or(SkipReason::NoCompatibleVersion)?;

    let candidates: Vec<Release> = package
        .releases()
        .iter()
        .filter(|release| release.version > current_max)
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Err(SkipReason::UpToDate);
    }

    Ok((current_max, candidates))
}

/// Builds the upgrade plan of a requirements file
pub struct Planner<'a> {
    registry: &'a dyn Registry,
    console: &'a Console,
    max_concurrent_fetches: usize,
}

impl<'a> Planner<'a> {
    pub fn new(registry: &'a dyn Registry, console: &'a Console) -> Self {
        Self {
            registry,
            console,
            max_concurrent_fetches: crate::config::DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, max_concurrent_fetches: usize) -> Self {
        self.max_concurrent_fetches = max_concurrent_fetches.max(1);
        self
    }

    /// Plan every requirement; packages are fetched at most once each
    pub async fn plan(&self, requirements: &[Requirement]) -> PlanReport {
        let mut report = PlanReport::default();
        let mut to_fetch: Vec<(&Requirement, Constraint)> = Vec::new();

        for requirement in requirements {
            match parse_requirement_constraint(requirement) {
                Ok(constraint) => to_fetch.push((requirement, constraint)),
                Err(reason) => {
                    info!("Skipping {}: {}", requirement.key(), reason);
                    report.skipped.push(skipped(requirement, reason));
                }
            }
        }

        let fetched: Vec<_> = stream::iter(to_fetch)
            .map(|(requirement, constraint)| async move {
                self.console.fetching(&requirement.name);
                let result = self.registry.fetch_package(&requirement.name).await;
                (requirement, constraint, result)
            })
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        for (requirement, constraint, result) in fetched {
            let outcome = result
                .map_err(registry_skip_reason)
                .and_then(|package| resolve_candidates(&constraint, &package));

            match outcome {
                Ok((current_max, candidates)) => {
                    debug!(
                        "{}: current max {}, {} candidates",
                        requirement.key(),
                        current_max,
                        candidates.len()
                    );
                    report.plans.insert(
                        requirement.key(),
                        UpgradePlan {
                            key: requirement.key(),
                            name: requirement.name.clone(),
                            constraint: requirement.raw_constraint.clone(),
                            current_max,
                            candidates,
                        },
                    );
                }
                Err(reason) => {
                    info!("Skipping {}: {}", requirement.key(), reason);
                    report.skipped.push(skipped(requirement, reason));
                }
            }
        }

        report
    }
}

fn parse_requirement_constraint(requirement: &Requirement) -> Result<Constraint, SkipReason> {
    if requirement.is_direct_reference() {
        return Err(SkipReason::DirectReference);
    }

    match parse_constraint(&requirement.raw_constraint) {
        Ok(Some(constraint)) => Ok(constraint),
        Ok(None) => Err(SkipReason::Unconstrained),
        Err(e) => Err(SkipReason::MalformedConstraint(e)),
    }
}

fn registry_skip_reason(error: RegistryError) -> SkipReason {
    if error.is_not_found() {
        SkipReason::PackageNotFound
    } else {
        warn!("Registry error: {}", error);
        SkipReason::RegistryUnavailable(error.to_string())
    }
}

fn skipped(requirement: &Requirement, reason: SkipReason) -> SkippedPackage {
    SkippedPackage {
        key: requirement.key(),
        constraint: requirement.raw_constraint.clone(),
        reason,
    }
}
