//! Upgrade trials
//!
//! Each planned package goes through
//! `Pending -> Trying(candidate) -> {Committed, RolledBack}`. Candidates are
//! tried in ascending order, one at a time: the pin is rewritten, the
//! validator runs, and the pin is restored if validation fails. A package
//! that passes a candidate keeps it as its new baseline and moves on to the
//! next candidate.
//!
//! The requirements file only ever holds the original pin or the last
//! validated candidate once a trial step finishes. If the process dies while
//! the validator runs, the unvalidated pin stays on disk.

use std::fmt;
use std::future::Future;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, info};

use crate::upgrade::error::{LockFileError, ValidationError};
use crate::upgrade::lockfile::LockFile;
use crate::upgrade::plan::{PlanReport, UpgradePlan};
use crate::upgrade::report::Console;
use crate::upgrade::validator::Validator;
use crate::version::legacy::LegacyVersion;

/// What to do with the remaining candidates of a package after a failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Treat the first failing candidate as a ceiling
    #[default]
    StopAtFirstFailure,
    /// Keep probing newer candidates after a failure
    SkipAhead,
}

/// Trial state of a single package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialState {
    Pending,
    Trying(LegacyVersion),
    /// The last validated candidate is pinned
    Committed(LegacyVersion),
    /// No candidate passed; the original pin is restored
    RolledBack,
}

impl fmt::Display for TrialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialState::Pending => write!(f, "pending"),
            TrialState::Trying(version) => write!(f, "trying {}", version),
            TrialState::Committed(version) => write!(f, "committed {}", version),
            TrialState::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// Outcome of validating one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub version: LegacyVersion,
    /// `None` when validation passed, otherwise why it failed
    pub failure: Option<String>,
}

impl Attempt {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Every attempt made for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTrial {
    pub key: String,
    /// Constraint text before the trials
    pub original: String,
    /// Highest release the original constraint allowed
    pub current: LegacyVersion,
    pub attempts: Vec<Attempt>,
}

impl PackageTrial {
    fn new(plan: &UpgradePlan) -> Self {
        Self {
            key: plan.key.clone(),
            original: plan.constraint.clone(),
            current: plan.current_max.clone(),
            attempts: Vec::new(),
        }
    }

    /// The last candidate that passed validation
    pub fn committed(&self) -> Option<&LegacyVersion> {
        self.attempts
            .iter()
            .rev()
            .find(|attempt| attempt.passed())
            .map(|attempt| &attempt.version)
    }

    /// The first candidate that failed validation
    pub fn first_failure(&self) -> Option<&Attempt> {
        self.attempts.iter().find(|attempt| !attempt.passed())
    }

    pub fn state(&self) -> TrialState {
        match (self.committed(), self.attempts.is_empty()) {
            (Some(version), _) => TrialState::Committed(version.clone()),
            (None, true) => TrialState::Pending,
            (None, false) => TrialState::RolledBack,
        }
    }
}

/// Apply a reversible change, check it, and undo it if the check fails
///
/// `apply` returns the undo token consumed by `undo`. Errors from `apply`
/// or `undo` abort; a failed check is returned as the inner error.
pub async fn attempt<T, E, C, F>(
    apply: impl FnOnce() -> Result<T, E>,
    check: F,
    undo: impl FnOnce(T) -> Result<(), E>,
) -> Result<Result<(), C>, E>
where
    F: Future<Output = Result<(), C>>,
{
    let token = apply()?;
    match check.await {
        Ok(()) => Ok(Ok(())),
        Err(failure) => {
            undo(token)?;
            Ok(Err(failure))
        }
    }
}

/// Runs upgrade trials against a requirements file, one candidate at a time
pub struct TrialDriver<'a> {
    lock_file: &'a LockFile,
    validator: &'a dyn Validator,
    console: &'a Console,
    policy: FailurePolicy,
}

impl<'a> TrialDriver<'a> {
    pub fn new(lock_file: &'a LockFile, validator: &'a dyn Validator, console: &'a Console) -> Self {
        Self {
            lock_file,
            validator,
            console,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Try every plan in order
    ///
    /// A failing candidate never aborts the run; only a requirements file
    /// that cannot be read or written does.
    pub async fn run(&self, report: &PlanReport) -> Result<Vec<PackageTrial>, LockFileError> {
        let mut trials = Vec::with_capacity(report.plans.len());
        for plan in report.plans.values() {
            trials.push(self.try_package(plan).await?);
        }
        Ok(trials)
    }

    async fn try_package(&self, plan: &UpgradePlan) -> Result<PackageTrial, LockFileError> {
        let mut trial = PackageTrial::new(plan);
        let mut baseline = plan.current_max.clone();
        debug!("{}: {}", plan.key, trial.state());

        for candidate in &plan.candidates {
            let version = &candidate.version;
            debug!("{}: {}", plan.key, TrialState::Trying(version.clone()));
            self.console.trying(&plan.key, version);

            let outcome: Result<(), ValidationError> = attempt(
                || self.lock_file.set_pin(&plan.name, version),
                self.validator.run(),
                |change| self.lock_file.revert(change),
            )
            .await?;

            self.console.candidate_result(&plan.key, &baseline, version, &outcome);

            match outcome {
                Ok(()) => {
                    info!("{}: {} passed validation", plan.key, version);
                    baseline = version.clone();
                    trial.attempts.push(Attempt {
                        version: version.clone(),
                        failure: None,
                    });
                }
                Err(e) => {
                    info!("{}: {} failed validation: {}", plan.key, version, e);
                    trial.attempts.push(Attempt {
                        version: version.clone(),
                        failure: Some(e.to_string()),
                    });
                    if self.policy == FailurePolicy::StopAtFirstFailure {
                        break;
                    }
                }
            }
        }

        debug!("{}: {}", plan.key, trial.state());
        Ok(trial)
    }
}
