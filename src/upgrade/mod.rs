//! Upgrade-trial engine
//!
//! A run has two phases. Planning reads the requirements file once, fetches
//! the releases of every constrained package and builds an [`plan::UpgradePlan`]
//! per package. Trials then walk the plans in file order and pin, validate
//! and keep or roll back each candidate, one at a time.
//!
//! # Modules
//!
//! - [`plan`]: Candidate resolution and the pre-flight report
//! - [`lockfile`]: Reversible rewrites of a single pin
//! - [`validator`]: The external validation command
//! - [`driver`]: Per-package trial state machine
//! - [`report`]: Console output
//! - [`error`]: Lock-file and validation errors

pub mod driver;
pub mod error;
pub mod lockfile;
pub mod plan;
pub mod report;
pub mod validator;

use tracing::info;

use crate::upgrade::driver::{FailurePolicy, PackageTrial, TrialDriver};
use crate::upgrade::error::LockFileError;
use crate::upgrade::lockfile::LockFile;
use crate::upgrade::plan::{PlanReport, Planner};
use crate::upgrade::report::Console;
use crate::upgrade::validator::Validator;
use crate::version::registry::Registry;

/// Knobs of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Print the plan and stop before touching the requirements file
    pub dry_run: bool,
    pub policy: FailurePolicy,
    pub max_concurrent_fetches: usize,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            policy: FailurePolicy::default(),
            max_concurrent_fetches: crate::config::DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No package has an upgrade candidate
    NothingToUpgrade(PlanReport),
    /// Plan printed, trials skipped
    DryRun(PlanReport),
    Completed {
        report: PlanReport,
        trials: Vec<PackageTrial>,
    },
}

/// Plan and try every upgrade in `lock_file`
pub async fn run(
    lock_file: &LockFile,
    registry: &dyn Registry,
    validator: &dyn Validator,
    console: &Console,
    options: UpgradeOptions,
) -> Result<RunOutcome, LockFileError> {
    let requirements = lock_file.requirements()?;
    info!(
        "Found {} requirements in {}",
        requirements.len(),
        lock_file.path().display()
    );

    let report = Planner::new(registry, console)
        .with_max_concurrent_fetches(options.max_concurrent_fetches)
        .plan(&requirements)
        .await;

    console.plan(&report);

    if report.is_empty() {
        console.nothing_to_upgrade();
        return Ok(RunOutcome::NothingToUpgrade(report));
    }

    if options.dry_run {
        info!("Dry run, leaving {} untouched", lock_file.path().display());
        return Ok(RunOutcome::DryRun(report));
    }

    let trials = TrialDriver::new(lock_file, validator, console)
        .with_policy(options.policy)
        .run(&report)
        .await?;

    console.summary(&trials);

    Ok(RunOutcome::Completed { report, trials })
}
