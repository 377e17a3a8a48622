mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use req_upgrade::config::{Config, log_path};
use req_upgrade::upgrade::driver::FailurePolicy;
use req_upgrade::upgrade::lockfile::LockFile;
use req_upgrade::upgrade::report::Console;
use req_upgrade::upgrade::validator::CommandValidator;
use req_upgrade::upgrade::{self, UpgradeOptions};
use req_upgrade::version::registries::pypi::PypiRegistry;

use crate::logging::{Target, setup_logging};

#[derive(Parser)]
#[command(name = "req-upgrade")]
#[command(
    version,
    about = "Upgrade pinned Python requirements, keeping only versions that pass your tests"
)]
struct Cli {
    /// Requirements file to upgrade in place
    #[arg(short, long, value_name = "PATH")]
    requirements: PathBuf,

    /// Command that validates the project; exit status 0 accepts a candidate
    #[arg(short, long, value_name = "COMMAND")]
    test_command: String,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the package index
    #[arg(long, env = "REQ_UPGRADE_INDEX_URL", value_name = "URL")]
    index_url: Option<String>,

    /// Fail a validation that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// What to do with newer candidates once one fails
    #[arg(long, value_enum)]
    failure_policy: Option<FailurePolicy>,

    /// Hide the output of the test command
    #[arg(long)]
    quiet_tests: bool,

    /// Print the upgrade plan without running any test
    #[arg(long)]
    dry_run: bool,

    /// Show debug diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Write diagnostics to a file instead of stderr (default: the data directory)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    /// Emit diagnostics as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Config file values with command-line overrides applied
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(index_url) = &self.index_url {
            config.index_url = index_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.validation_timeout_secs = Some(timeout);
        }
        if let Some(policy) = self.failure_policy {
            config.failure_policy = policy;
        }
        if self.quiet_tests {
            config.quiet_tests = true;
        }

        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.requirements.exists() {
        eprintln!(
            "Error: requirements file '{}' doesn't exist",
            cli.requirements.display()
        );
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let log_file = cli
        .log_file
        .as_ref()
        .map(|path| path.clone().unwrap_or_else(log_path));
    let target = match &log_file {
        Some(path) => Target::File(path),
        None => Target::Stderr,
    };
    let _guard = setup_logging(cli.verbose, cli.log_json, target)?;

    let config = cli.config()?;
    debug!("Effective configuration: {:?}", config);

    let registry = PypiRegistry::with_timeout(&config.index_url, config.fetch_timeout())
        .context("Failed to build the package index client")?;
    let validator = CommandValidator::new(cli.test_command.as_str())
        .with_timeout(config.validation_timeout())
        .quiet(config.quiet_tests);
    let lock_file = LockFile::new(&cli.requirements);
    let console = Console::stdout();
    let options = UpgradeOptions {
        dry_run: cli.dry_run,
        policy: config.failure_policy,
        max_concurrent_fetches: config.max_concurrent_fetches,
    };

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(upgrade::run(
            &lock_file,
            &registry,
            &validator,
            &console,
            options,
        ))
        .with_context(|| format!("Upgrade of {} aborted", cli.requirements.display()))?;

    Ok(())
}
