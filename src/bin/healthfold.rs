//! Healthfold CLI
//!
//! Commands:
//! - extract: parse the export and write per-metric summary artifacts
//! - correct: apply the sleep correction pass to a persisted sleep artifact

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use healthfold::{
    CorrectionEngine, Extractor, MetricKind, DEFAULT_DATA_DIR, DEFAULT_EXPORT_PATH,
    HEALTHFOLD_VERSION,
};

/// Healthfold - aggregate a health-data export into daily summaries
#[derive(Parser)]
#[command(name = "healthfold")]
#[command(version = HEALTHFOLD_VERSION)]
#[command(about = "Extract and aggregate health-export records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the export and write per-metric summary artifacts
    Extract {
        /// Path to the export XML
        #[arg(short, long, default_value = DEFAULT_EXPORT_PATH)]
        input: PathBuf,

        /// Output directory for the summary artifacts
        #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Restrict the run to a single metric
        #[arg(long)]
        metric: Option<MetricArg>,
    },

    /// Correct the persisted sleep artifact (asleep -= in_bed from the
    /// cutoff date onward), writing a corrected copy and a one-time backup
    Correct {
        /// Directory holding the sleep artifact
        #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Also replace the original sleep artifact in place
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Steps,
    Energy,
    Distance,
    RestingHr,
    Sleep,
}

impl From<MetricArg> for MetricKind {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Steps => MetricKind::StepCount,
            MetricArg::Energy => MetricKind::ActiveEnergy,
            MetricArg::Distance => MetricKind::DistanceWalkingRunning,
            MetricArg::RestingHr => MetricKind::RestingHeartRate,
            MetricArg::Sleep => MetricKind::SleepAnalysis,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    // All errors surface here uniformly; the exit code carries no more
    // detail than success or failure
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), healthfold::ExtractError> {
    match cli.command {
        Commands::Extract {
            input,
            data_dir,
            metric,
        } => cmd_extract(&input, &data_dir, metric),
        Commands::Correct { data_dir, apply } => cmd_correct(&data_dir, apply),
    }
}

fn cmd_extract(
    input: &PathBuf,
    data_dir: &PathBuf,
    metric: Option<MetricArg>,
) -> Result<(), healthfold::ExtractError> {
    let extractor = Extractor::new(input, data_dir)?;

    let reports = match metric {
        Some(arg) => vec![extractor.run_metric(MetricKind::from(arg))?],
        None => extractor.run_all()?,
    };

    for report in &reports {
        println!(
            "{}: {} records ({} skipped) -> {} rows -> {}",
            report.kind.as_str(),
            report.records_found,
            report.records_skipped,
            report.rows_written,
            report.artifact.display()
        );
    }

    Ok(())
}

fn cmd_correct(data_dir: &PathBuf, apply: bool) -> Result<(), healthfold::ExtractError> {
    let engine = CorrectionEngine::new(data_dir);
    let report = engine.run(|_| apply)?;

    println!("Processed {} sleep rows", report.rows_processed);
    println!(
        "Applied correction to {} rows (dates >= {})",
        report.rows_in_window,
        healthfold::correction_cutoff()
    );

    if let Some(avg) = report.average_reduction_h() {
        println!(
            "Changed {} rows: average reduction {:.2} h, total {:.2} h",
            report.rows_changed, avg, report.total_reduction_h
        );
    } else {
        println!("No rows were affected by the correction");
    }

    if apply {
        println!("Original artifact {} updated in place", engine.original_path().display());
    } else {
        println!("Corrected copy written to {}", engine.corrected_path().display());
    }

    Ok(())
}
