//! clinrule command-line interface

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clinrule::cli::{analyze, evaluate, output, validate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Compound clinical state tool
#[derive(Parser)]
#[command(name = "clinrule")]
#[command(author, version, about = "Derive compound clinical states from rule tables", long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, pretty, table)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    /// Folder that relative rule paths resolve against
    #[arg(short = 'R', long = "rules-folder", global = true)]
    rules_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Abstracted data file (JSON object: patient id -> observations)
    #[arg(short, long)]
    data: PathBuf,

    /// Snapshot date (default: now)
    #[arg(short, long)]
    snapshot: Option<String>,

    /// Compound rule to derive
    #[arg(short, long, default_value = "hematological_state")]
    rule: String,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leave raw abstracted data out of the results
    #[arg(long)]
    omit_data: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a rule file against named inputs
    Evaluate {
        /// Rule file to evaluate
        rule: PathBuf,

        /// Inputs (name=value)
        #[arg(short, long = "input")]
        inputs: Vec<String>,
    },

    /// Check rule files for keys that can never match
    Validate {
        /// Rule files to validate
        files: Vec<PathBuf>,

        /// Fail when any file has unmatchable keys
        #[arg(short, long)]
        strict: bool,
    },

    /// Analyze one patient
    Analyze {
        /// Patient identifier
        patient_id: String,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Analyze every patient in a roster
    AnalyzeAll {
        /// Roster file (JSON array of [id, first name, last name, ..] rows)
        #[arg(long)]
        roster: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Also captures `log` records from the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn analysis_options(
    args: AnalysisArgs,
    rules_folder: Option<PathBuf>,
    format: Option<String>,
    output: Option<PathBuf>,
) -> analyze::AnalysisOptions {
    analyze::AnalysisOptions {
        data: args.data,
        snapshot: args.snapshot,
        rule_name: args.rule,
        config_file: args.config,
        rules_folder,
        omit_data: args.omit_data,
        output_format: format,
        output_file: output,
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Evaluate { rule, inputs } => evaluate::evaluate(evaluate::EvaluateConfig {
            rule,
            inputs,
            rules_folder: cli.rules_folder,
            output_format: cli.format,
            output_file: cli.output,
        }),

        Commands::Validate { files, strict } => validate::validate(validate::ValidateConfig {
            files,
            rules_folder: cli.rules_folder,
            strict,
        }),

        Commands::Analyze {
            patient_id,
            analysis,
        } => analyze::analyze(analyze::AnalyzeConfig {
            patient_id,
            options: analysis_options(analysis, cli.rules_folder, cli.format, cli.output),
        }),

        Commands::AnalyzeAll { roster, analysis } => analyze::analyze_all(analyze::AnalyzeAllConfig {
            roster,
            options: analysis_options(analysis, cli.rules_folder, cli.format, cli.output),
        }),
    }
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
