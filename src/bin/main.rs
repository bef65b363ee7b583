//! planlens CLI - analyze and compare PostgreSQL query plans
//!
//! Usage:
//!   planlens analyze [file] [--format <format>]
//!   planlens compare <old> <new> [--threshold <pct>] [--format <format>]
//!
//! Inputs are files containing `EXPLAIN (ANALYZE, VERBOSE, BUFFERS,
//! FORMAT JSON)` output; use "-" (or omit the file for analyze) to read
//! from stdin.
//!
//! Examples:
//!   planlens analyze plan.json
//!   psql -qtAc "EXPLAIN (ANALYZE, FORMAT JSON) SELECT 1" | planlens analyze -
//!   planlens compare before.json after.json --threshold 10

use clap::{Parser, Subcommand, ValueEnum};
use planlens::analyzer::analyze;
use planlens::comparator::{Comparator, DEFAULT_THRESHOLD_PCT};
use planlens::output;
use planlens::plan::{parse_first, ExplainEnvelope};
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "planlens")]
#[command(about = "planlens - analyze and compare PostgreSQL EXPLAIN plans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single query plan
    Analyze {
        /// Path to the EXPLAIN JSON file ("-" or omitted for stdin)
        file: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Compare two query plans
    Compare {
        /// Path to the old plan's EXPLAIN JSON ("-" for stdin)
        old: String,

        /// Path to the new plan's EXPLAIN JSON ("-" for stdin)
        new: String,

        /// Percent change below which a metric counts as unchanged
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD_PCT)]
        threshold: f64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Colored terminal output
    Text,
    /// Pretty-printed JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { file, format } => cmd_analyze(file.as_deref(), format),
        Commands::Compare {
            old,
            new,
            threshold,
            format,
        } => cmd_compare(&old, &new, threshold, format),
    }
}

fn cmd_analyze(file: Option<&str>, format: OutputFormat) -> ExitCode {
    let explain = match read_plan(file.unwrap_or("-"), "") {
        Ok(explain) => explain,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let result = analyze(&explain);

    let mut stdout = io::stdout().lock();
    let rendered = match format {
        OutputFormat::Text => output::render_analysis(&mut stdout, &result)
            .map_err(|e| e.to_string()),
        OutputFormat::Json => output::render_json(&mut stdout, &result).map_err(|e| e.to_string()),
    };

    match rendered {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error writing output: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn cmd_compare(old: &str, new: &str, threshold: f64, format: OutputFormat) -> ExitCode {
    if !(0.0..=100.0).contains(&threshold) {
        eprintln!("threshold must be between 0 and 100, got {}", threshold);
        return ExitCode::FAILURE;
    }
    if old == "-" && new == "-" {
        eprintln!("only one of the two plans can be read from stdin");
        return ExitCode::FAILURE;
    }

    let old_explain = match read_plan(old, "old plan ") {
        Ok(explain) => explain,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };
    let new_explain = match read_plan(new, "new plan ") {
        Ok(explain) => explain,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let result = Comparator::new(threshold).compare(&old_explain, &new_explain);

    let mut stdout = io::stdout().lock();
    let rendered = match format {
        OutputFormat::Text => output::render_comparison(&mut stdout, &result)
            .map_err(|e| e.to_string()),
        OutputFormat::Json => output::render_json(&mut stdout, &result).map_err(|e| e.to_string()),
    };

    match rendered {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error writing output: {}", message);
            ExitCode::FAILURE
        }
    }
}

/// Read a plan from a file or stdin and parse its first envelope. The label
/// distinguishes the two inputs of compare in error messages.
fn read_plan(input: &str, label: &str) -> Result<ExplainEnvelope, String> {
    let data = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Error reading {}from stdin: {}", label, e))?;
        buf
    } else {
        fs::read_to_string(input)
            .map_err(|e| format!("Error reading {}file '{}': {}", label, input, e))?
    };

    parse_first(&data).map_err(|e| format!("Error parsing {}input: {}", label, e))
}
