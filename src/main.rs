//! CLI tool to validate, format and dump specification files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use specfile_rs::{ConceptDictionary, ParseResult, ParserConfig, SpecParser, Specification};

/// Environment variable holding the log filter when `--log-level` is absent.
const LOG_ENV: &str = "SPECFILE_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Validate, format and inspect specification files.
#[derive(Parser, Debug)]
#[command(name = "specfile", version, about)]
struct Cli {
    /// Concept file to load before parsing. May be repeated.
    #[arg(long = "concepts", global = true)]
    concepts: Vec<PathBuf>,

    /// Log filter (trace, debug, info, warn, error, or a directive list).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that specification files are valid.
    Validate { files: Vec<PathBuf> },
    /// Format specification files and print them to stdout.
    Fmt {
        /// Report files that are not formatted instead of printing them.
        #[arg(long)]
        check: bool,
        files: Vec<PathBuf>,
    },
    /// Print the parsed document and diagnostics as JSON.
    Dump { files: Vec<PathBuf> },
}

#[derive(Serialize)]
struct Dump<'a> {
    specification: &'a Specification,
    result: &'a ParseResult,
}

fn init_logging(level: Option<&str>) -> Result<(), String> {
    let directives = level
        .map(ToString::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let filter = EnvFilter::try_new(&directives).map_err(|e| format!("{directives}: {e}"))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

fn load_concepts(paths: &[PathBuf]) -> Result<ConceptDictionary, String> {
    let mut dictionary = ConceptDictionary::new();
    for path in paths {
        let name = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| format!("{name}: {e}"))?;
        dictionary.load(&name, &text).map_err(|e| e.to_string())?;
    }
    Ok(dictionary)
}

fn files_of(command: &Command) -> &[PathBuf] {
    match command {
        Command::Validate { files } | Command::Fmt { files, .. } | Command::Dump { files } => {
            files
        }
    }
}

fn report(result: &ParseResult) {
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    for err in &result.parse_errors {
        eprintln!("error: {err}");
    }
}

/// Handle one file. Returns false if it had problems.
fn process(
    command: &Command,
    parser: &SpecParser,
    concepts: &ConceptDictionary,
    path: &Path,
) -> bool {
    let name = path.display().to_string();
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{name}: {e}");
            return false;
        }
    };

    let (spec, result) = match parser.parse(&content, concepts, &name) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {e}");
            return false;
        }
    };

    match command {
        Command::Validate { .. } => {
            report(&result);
            if result.ok() {
                eprintln!("{name}: valid ({} scenario(s))", spec.scenarios.len());
            }
            result.ok()
        }
        Command::Fmt { check, .. } => {
            if !result.ok() {
                report(&result);
                return false;
            }
            let formatted = specfile_rs::format(&spec);
            if !*check {
                print!("{formatted}");
                return true;
            }
            let formatted_already = formatted == content;
            if formatted_already {
                eprintln!("{name}: formatted");
            } else {
                eprintln!("{name}: not formatted");
            }
            formatted_already
        }
        Command::Dump { .. } => {
            let dump = Dump {
                specification: &spec,
                result: &result,
            };
            match serde_json::to_string_pretty(&dump) {
                Ok(json) => {
                    println!("{json}");
                    true
                }
                Err(e) => {
                    eprintln!("{name}: {e}");
                    false
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level.as_deref()) {
        eprintln!("Error: invalid log level {e}");
        return ExitCode::from(2);
    }

    let config = match ParserConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    let concepts = match load_concepts(&cli.concepts) {
        Ok(concepts) => concepts,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    debug!(concepts = concepts.len(), ?config, "configured");

    let files = files_of(&cli.command);
    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let parser = SpecParser::with_config(config);
    let mut had_error = false;

    for path in files {
        had_error |= !process(&cli.command, &parser, &concepts, path);
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
