use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod aggregate;
mod config;
mod episode;
mod error;
mod logging;
mod models;
mod modes;
mod report;
mod score;
mod worksheet;

use config::Config;
use models::{RawValue, Severity};
use modes::AnalysisMode;

#[derive(Parser)]
#[command(name = "fob-tracker")]
#[command(about = "Functional Observational Battery score aggregation and episode detection", long_about = None)]
struct Cli {
    /// TOML file overriding thresholds and defaults (falls back to FOB_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a single raw score
    Normalize {
        #[arg(long, value_enum)]
        mode: AnalysisMode,
        value: String,
    },
    /// Write a blank worksheet CSV for a mode
    Template {
        #[arg(long, value_enum)]
        mode: AnalysisMode,
        #[arg(long)]
        animals: Option<usize>,
        #[arg(long, value_delimiter = ',', default_values_t = [0.0, 15.0, 30.0, 60.0, 120.0])]
        times: Vec<f64>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print per-cell aggregates for a worksheet
    Aggregate {
        #[arg(long, value_enum)]
        mode: AnalysisMode,
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        animals: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Detect abnormal episodes in a worksheet
    Episodes {
        #[arg(long, value_enum)]
        mode: AnalysisMode,
        #[arg(long)]
        csv: PathBuf,
        /// Group label for the output; defaults to the file stem
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        animals: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report for a project manifest
    Report {
        #[arg(long)]
        project: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn group_label(group: Option<String>, csv: &Path) -> String {
    group.unwrap_or_else(|| {
        csv.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "group".to_string())
    })
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Normalize { mode, value } => {
            match score::normalize(&RawValue::from_cell(&value), mode.scheme()) {
                Severity::Value(severity) => println!("{severity}"),
                Severity::Missing => println!("missing"),
            }
        }
        Commands::Template {
            mode,
            animals,
            times,
            out,
        } => {
            let animals = animals
                .or(config.default_animals)
                .context("--animals is required when no default_animals is configured")?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let rows = worksheet::write_template(file, mode, animals, &times)?;
            println!("Template with {rows} rows written to {}.", out.display());
        }
        Commands::Aggregate {
            mode,
            csv,
            animals,
            json,
        } => {
            let sheet = worksheet::load_worksheet(mode, &csv, animals.or(config.default_animals))
                .with_context(|| format!("failed to read worksheet {}", csv.display()))?;
            let points = aggregate::aggregate_worksheet(&sheet);

            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                let mut output = String::new();
                report::write_aggregates(&mut output, mode, &points);
                print!("{output}");
            }
        }
        Commands::Episodes {
            mode,
            csv,
            group,
            animals,
            json,
        } => {
            if mode.uses_before_after() {
                tracing::warn!(mode = %mode, "mode has no episode concept");
            }
            let sheet = worksheet::load_worksheet(mode, &csv, animals.or(config.default_animals))
                .with_context(|| format!("failed to read worksheet {}", csv.display()))?;
            let group = group_label(group, &csv);
            let episodes = episode::extract_group_episodes(&group, &sheet, &config.thresholds);

            if json {
                println!("{}", serde_json::to_string_pretty(&episodes)?);
            } else {
                let mut output = String::new();
                report::write_episodes(&mut output, &episodes);
                print!("{output}");
            }
        }
        Commands::Report { project, out } => {
            let project = worksheet::load_project(&project)
                .with_context(|| format!("failed to load project {}", project.display()))?;
            let report = report::build_report(&project, &config.thresholds, chrono::Utc::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
