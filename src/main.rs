pub mod config;
pub mod error;
pub mod study;
pub mod worldbank;

use crate::config::AppConfig;
use crate::error::FatalRunError;
use crate::study::StudyOutcome;
use crate::worldbank::WorldBankClient;
use clap::{Args, Parser, Subcommand};
use script_kit::{
    services::{CollisionPolicy, FolderResolver},
    utils::{current_commit, RunLoggerConfig},
    Logger, RunLogger,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "research-outcome")]
#[command(about = "Correlates R&D spending with scientific output using World Bank indicators")]
pub struct Cli {
    /// YAML config file (falls back to $CONFIG_FILE, then built-in defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the indicators, analyze them and save figures and results (default)
    Run(RunArgs),
    /// Resolve the project folders, creating missing ones, and print them as JSON
    Folders,
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Project root holding data/, fig/ and log/
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// Observation year
    #[arg(short, long)]
    pub year: Option<i32>,
    /// Skip rendering figures
    #[arg(long)]
    pub no_figures: bool,
    /// Draw a regression plot for every pair of columns
    #[arg(long)]
    pub all_pairs: bool,
    /// What to do when two figures map to the same file name (overwrite/fail/disambiguate)
    #[arg(long)]
    pub collision_policy: Option<CollisionPolicy>,
}

impl RunArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(year) = self.year {
            config.year = year;
        }
        if self.no_figures {
            config.save_figures = false;
        }
        if self.all_pairs {
            config.all_pairs = true;
        }
        if let Some(policy) = self.collision_policy {
            config.collision_policy = policy;
        }
    }
}

async fn execute(config: &AppConfig) -> Result<StudyOutcome, FatalRunError> {
    let source = WorldBankClient::new(&config.api_base_url)?;
    Ok(study::run(config, &source).await?)
}

/// One logged run: start the log, note the commit, run the study, always stop the log.
async fn run(config: AppConfig) -> anyhow::Result<()> {
    let run_logger = RunLogger::start(&RunLoggerConfig {
        log_dir: config.log_path(),
        detail: config.detail_log,
        console: config.console_log,
    })?;
    let logger = Logger::new("MAIN");
    logger.info("Start logging");

    match current_commit(&config.root) {
        Ok(commit) => logger.info(&format!("Version: {}", commit)),
        Err(e) => logger.warn_with_error("Running without version control", &e),
    }
    logger.info(&format!(
        "Year {}, {} indicators, root {}",
        config.year,
        config.indicators.len(),
        config.root.display()
    ));

    let result = execute(&config).await;
    match &result {
        Ok(outcome) => logger.info(&format!(
            "Results in {}, {} figures saved",
            outcome.result_file.display(),
            outcome.figures.len()
        )),
        Err(e) => logger.error_with_error("Run failed", e),
    }

    logger.info("Stop logging");
    run_logger.stop()?;
    result?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            args.apply(&mut config);
            run(config).await?;
        }
        Commands::Folders => {
            let folders = FolderResolver::new(&config.root, config.folder_layout()).resolve()?;
            println!("{}", serde_json::to_string_pretty(&folders)?);
        }
    }

    Ok(())
}
