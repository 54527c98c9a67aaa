use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use trialprep::app::demographics_use_case::DemographicsUseCase;
use trialprep::app::merge_use_case::{MergeOutcome, MergeUseCase, SessionSource};
use trialprep::app::ports::{ConfirmPort, TableStorePort};
use trialprep::app::preprocess_use_case::{PreprocessOutcome, PreprocessReport, PreprocessUseCase};
use trialprep::config::{Config, FailurePolicy};
use trialprep::infra::confirm::{AssumeYes, StdinConfirm};
use trialprep::infra::fs_store::FsTableStore;
use trialprep::infra::housekeeping::{self, ClearReport, QuarantineReport};
use trialprep::infra::session_listing::{self, SessionListing};
use trialprep::observability::{init_logging, metrics};

#[derive(Parser)]
#[command(name = "trialprep")]
#[command(about = "Clean PsychoPy cueing-task exports and merge them with the demographics survey")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $TRIALPREP_CONFIG, then trialprep.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    paths: PathOverrides,

    /// Write a JSON summary of the run to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Print a Prometheus snapshot of the run's metrics to stderr
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathOverrides {
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    preprocessed_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    output_file: Option<String>,
    #[arg(long, global = true)]
    demographics_file: Option<PathBuf>,
}

impl PathOverrides {
    fn apply(self, config: &mut Config) {
        let paths = &mut config.paths;
        if let Some(dir) = self.input_dir {
            paths.input_dir = dir;
        }
        if let Some(dir) = self.preprocessed_dir {
            paths.preprocessed_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            paths.output_dir = dir;
        }
        if let Some(file) = self.output_file {
            paths.output_file = file;
        }
        if let Some(file) = self.demographics_file {
            paths.demographics_file = file;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Delete the previous run's preprocessed files
    Clear,
    /// Remove ignored, side-car, and undersized raw files
    Quarantine,
    /// Normalize every raw participant file
    Preprocess {
        /// Log and leave out files that fail instead of stopping
        #[arg(long)]
        skip_failed: bool,
    },
    /// Clean the demographics export without merging
    Demographics {
        /// Also write the cleaned records to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Merge preprocessed files with the demographics into the output file
    Merge {
        /// Overwrite an existing output file without asking
        #[arg(long)]
        yes: bool,
    },
    /// List session files by the timestamp in their names, most recent first
    Dates {
        /// Directory to list (defaults to the input directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Clear, preprocess, clean demographics, and merge in one pass
    Run {
        #[arg(long)]
        yes: bool,
        #[arg(long)]
        skip_failed: bool,
    },
}

#[derive(Default, Serialize)]
struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    clear: Option<ClearReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quarantine: Option<QuarantineReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preprocess: Option<PreprocessReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    demographics_respondents: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge: Option<MergeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dates: Option<SessionListing>,
}

fn confirm_port(yes: bool) -> Box<dyn ConfirmPort> {
    if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    }
}

fn clear(config: &Config) -> anyhow::Result<ClearReport> {
    let report = housekeeping::clear_preprocessed_files(&config.paths.preprocessed_dir)?;
    if report.dir_missing {
        println!("⚠️  The folder {} does not exist", config.paths.preprocessed_dir.display());
    } else {
        println!("🧹 Removed {} preprocessed file(s)", report.removed);
    }
    Ok(report)
}

fn preprocess(config: &Config, store: Arc<dyn TableStorePort>, skip_failed: bool) -> anyhow::Result<PreprocessOutcome> {
    let policy = if skip_failed {
        FailurePolicy::Skip
    } else {
        config.preprocess.on_file_error
    };
    let outcome = PreprocessUseCase::with_default_normalizer(store, policy)
        .run(&config.paths.input_dir, &config.paths.preprocessed_dir)?;

    let report = &outcome.report;
    println!("\n📊 Preprocessing results:");
    println!("   Files found: {}", report.files_found);
    println!("   Processed: {}", report.processed.len());
    println!("   Skipped: {}", report.failed.len());
    println!("   Unknown stimuli: {}", report.unknown_stimulus_count());
    for failure in &report.failed {
        println!("   - {}: {}", failure.source_name, failure.error);
    }
    Ok(outcome)
}

fn print_merge(outcome: &MergeOutcome) {
    match outcome {
        MergeOutcome::Written { path, rows, sessions } => {
            println!("✅ Wrote {} rows from {} session(s) to {}", rows, sessions, path.display());
        }
        MergeOutcome::Declined { path } => {
            println!("Operation cancelled. File not overwritten: {}", path.display());
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.paths.apply(&mut config);

    let _guard = init_logging(&config.logging.dir);
    let metrics_handle = if cli.metrics {
        match metrics::install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    } else {
        None
    };

    let store: Arc<dyn TableStorePort> = Arc::new(FsTableStore::new());
    let mut report = RunReport::default();

    match cli.command {
        Commands::Clear => {
            report.clear = Some(clear(&config)?);
        }
        Commands::Quarantine => {
            let result = housekeeping::remove_unwanted_files(
                &config.paths.input_dir,
                &config.paths.ignore_files,
                config.preprocess.min_file_size_bytes,
            )?;
            println!(
                "🧹 Removed {} file(s); {} remain in {}",
                result.removed.len(),
                result.remaining,
                config.paths.input_dir.display()
            );
            report.quarantine = Some(result);
        }
        Commands::Preprocess { skip_failed } => {
            report.preprocess = Some(preprocess(&config, store, skip_failed)?.report);
        }
        Commands::Demographics { output } => {
            let records = DemographicsUseCase::new(store).run(&config.paths.demographics_file, output.as_deref())?;
            println!("👥 {} respondent(s) with a participant id", records.len());
            report.demographics_respondents = Some(records.len());
        }
        Commands::Merge { yes } => {
            let demographics = DemographicsUseCase::new(store.clone()).run(&config.paths.demographics_file, None)?;
            let outcome = MergeUseCase::new(store, confirm_port(yes)).run(
                SessionSource::Directory(config.paths.preprocessed_dir.clone()),
                &demographics,
                &config.output_path(),
            )?;
            print_merge(&outcome);
            report.merge = Some(outcome);
        }
        Commands::Dates { dir } => {
            let dir = dir.unwrap_or_else(|| config.paths.input_dir.clone());
            let listing = session_listing::sorted_session_files(&dir)
                .with_context(|| format!("Failed to list {}", dir.display()))?;
            for session in &listing.sessions {
                println!("{}", session.display());
            }
            for name in &listing.invalid {
                println!("Invalid date format in file: {}", name);
            }
            report.dates = Some(listing);
        }
        Commands::Run { yes, skip_failed } => {
            info!("Starting full run");
            println!("\n🧹 Step 1: Clearing preprocessed files...");
            report.clear = Some(clear(&config)?);

            println!("\n🔨 Step 2: Preprocessing participant files...");
            let outcome = preprocess(&config, store.clone(), skip_failed)?;
            report.preprocess = Some(outcome.report);

            println!("\n👥 Step 3: Cleaning demographics...");
            let demographics = DemographicsUseCase::new(store.clone()).run(&config.paths.demographics_file, None)?;
            report.demographics_respondents = Some(demographics.len());

            println!("\n🔗 Step 4: Merging...");
            let merged = MergeUseCase::new(store, confirm_port(yes)).run(
                SessionSource::InMemory(outcome.tables),
                &demographics,
                &config.output_path(),
            )?;
            print_merge(&merged);
            report.merge = Some(merged);
        }
    }

    if let Some(path) = &cli.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }
    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
