//! User-facing progress output
//!
//! Diagnostics go through `tracing`; everything here is the plain text a
//! user reads while the tool runs. Rendering is kept in pure functions so
//! the wording can be tested without a terminal.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Mutex;

use tracing::debug;

use crate::upgrade::driver::{PackageTrial, TrialState};
use crate::upgrade::error::ValidationError;
use crate::upgrade::plan::PlanReport;
use crate::version::legacy::LegacyVersion;

/// Progress printer shared by the planner and the trial driver
pub struct Console {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Console {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Console that discards everything
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    pub fn fetching(&self, name: &str) {
        self.emit(&format!("Get all releases of {}...\n", name));
    }

    pub fn plan(&self, report: &PlanReport) {
        self.emit(&render_plan(report));
    }

    pub fn nothing_to_upgrade(&self) {
        self.emit("Nothing to upgrade.\n");
    }

    pub fn trying(&self, key: &str, version: &LegacyVersion) {
        self.emit(&format!("Testing {} {}...\n", key, version));
    }

    pub fn candidate_result(
        &self,
        key: &str,
        from: &LegacyVersion,
        to: &LegacyVersion,
        outcome: &Result<(), ValidationError>,
    ) {
        self.emit(&render_candidate_result(key, from, to, outcome));
    }

    pub fn summary(&self, trials: &[PackageTrial]) {
        self.emit(&render_summary(trials));
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            debug!("Failed to write progress output: {}", e);
        }
    }
}

/// Pre-flight summary: what is skipped and what will be tried
pub fn render_plan(report: &PlanReport) -> String {
    let mut text = String::new();

    let up_to_date: Vec<&str> = report.up_to_date().collect();
    if !up_to_date.is_empty() {
        let _ = writeln!(
            text,
            "Skipped packages that don't need to be upgraded: {}",
            up_to_date.join(", ")
        );
    }

    for skipped in report.not_planned() {
        if skipped.constraint.is_empty() {
            let _ = writeln!(text, "Skipped {}: {}", skipped.key, skipped.reason);
        } else {
            let _ = writeln!(
                text,
                "Skipped {} ({}): {}",
                skipped.key, skipped.constraint, skipped.reason
            );
        }
    }

    if !report.is_empty() {
        let _ = writeln!(
            text,
            "Packages that can be upgraded with all those available versions:"
        );
        for plan in report.plans.values() {
            let candidates: Vec<String> = plan
                .candidates
                .iter()
                .map(|release| {
                    if release.is_yanked() {
                        format!("{} (yanked)", release.version)
                    } else {
                        release.version.to_string()
                    }
                })
                .collect();
            let _ = writeln!(
                text,
                "* {} ({}) to {}",
                plan.key,
                plan.constraint,
                candidates.join(", ")
            );
        }
    }

    text
}

pub fn render_candidate_result(
    key: &str,
    from: &LegacyVersion,
    to: &LegacyVersion,
    outcome: &Result<(), ValidationError>,
) -> String {
    match outcome {
        Ok(()) => format!("[SUCCESS] {} {} -> {}\n", key, from, to),
        Err(e) => format!("[FAILED] {} {} -> {} ({})\n", key, from, to, e),
    }
}

/// Final outcome of every tried package
pub fn render_summary(trials: &[PackageTrial]) -> String {
    let mut text = String::new();
    if trials.is_empty() {
        return text;
    }

    let _ = writeln!(text, "Summary:");
    for trial in trials {
        let failure = trial
            .first_failure()
            .map(|attempt| {
                format!(
                    "{} failed: {}",
                    attempt.version,
                    attempt.failure.as_deref().unwrap_or_default()
                )
            })
            .unwrap_or_default();

        let _ = match trial.state() {
            TrialState::Committed(version) if failure.is_empty() => writeln!(
                text,
                "* {} upgraded {} -> {}",
                trial.key, trial.current, version
            ),
            TrialState::Committed(version) => writeln!(
                text,
                "* {} upgraded {} -> {} ({})",
                trial.key, trial.current, version, failure
            ),
            TrialState::RolledBack => writeln!(
                text,
                "* {} kept at {} ({})",
                trial.key, trial.original, failure
            ),
            TrialState::Pending | TrialState::Trying(_) => {
                writeln!(text, "* {} not tried", trial.key)
            }
        };
    }

    text
}
