//! Thin CLI front end: parse a model file, synthesize interfaces, and
//! optionally run the simulator over it, printing the resulting
//! `AnalysisResults`/`SimulationResults` as JSON — the ambient command
//! surface spec.md explicitly leaves external, kept minimal the way
//! `eva-engine-cli` stays a thin wrapper around its analysis library.

use std::process::ExitCode;

use adas_bdr_sched::ingest;
use adas_bdr_sched::sim::{simulate, simulate_with_logs};
use adas_bdr_sched::synth::synthesize;
use adas_bdr_sched::time::Duration;

const DEFAULT_AFTER_HELP: &str = "Refer to the crate's documentation for further help";

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Hierarchical BDR schedulability analyzer and simulator", after_help = DEFAULT_AFTER_HELP)]
struct Args {
    /// Model file: a JSON system model or a CSV task table.
    #[arg(short = 'i', value_name = "MODEL FILE")]
    model_file: String,

    /// Input format.
    #[arg(value_enum, short = 'f', long = "format", value_name = "FORMAT", default_value = "json")]
    format: ModelFormat,

    /// Also run the event-driven simulator over [0, T] after synthesis.
    #[arg(long = "horizon", value_name = "T")]
    horizon: Option<f64>,

    /// Omit the per-slice execution log from simulation output.
    #[arg(long = "no-log", action = clap::ArgAction::SetTrue)]
    no_log: bool,

    /// Quiet mode: print nothing, exit 0 if schedulable, 1 if not.
    #[arg(short = 'q', default_value = "false", action = clap::ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModelFormat {
    Json,
    Csv,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match <Args as clap::Parser>::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind::*;
            let code: u8 = match err.kind() {
                DisplayHelp | DisplayHelpOnMissingArgumentOrSubcommand | DisplayVersion => 0,
                _ => 2,
            };
            err.print().ok();
            return ExitCode::from(code);
        }
    };

    let quiet = args.quiet;
    match run(args) {
        Ok(schedulable) => {
            if quiet {
                ExitCode::from(if schedulable { 0u8 } else { 1u8 })
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2u8)
        }
    }
}

fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.model_file)?;

    let mut model = match args.format {
        ModelFormat::Json => ingest::json::parse(&text)?,
        ModelFormat::Csv => ingest::csv::parse(&text),
    };

    let analysis = synthesize(&mut model)?;
    if !args.quiet {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    }

    if let Some(horizon) = args.horizon {
        let results = if args.no_log {
            simulate_with_logs(&model, Duration::new(horizon), None, false)
        } else {
            simulate(&model, Duration::new(horizon), None)
        };
        if !args.quiet {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(analysis.is_schedulable)
}
