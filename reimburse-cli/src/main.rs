use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use reimburse_core::{ReferenceTable, Resolver, Trip, TripError};
use reimburse_data::{audit_table, load_reference_table, parsers::to_records};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod eval;
mod explain;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("REIMBURSE_BUILD_REV"), ")");

/// Exit status for rejected input, distinct from startup failures (1).
const EXIT_INVALID_INPUT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "reimburse",
    version,
    long_version = LONG_VERSION,
    about = "Estimate legacy travel reimbursements",
    after_help = "A bare `reimburse <days> <miles> <receipts>` is shorthand for `estimate`."
)]
struct Cli {
    /// Reference dataset (.json or .csv)
    #[arg(long, env = "REIMBURSE_DATA", default_value = "public_cases.json", global = true)]
    data: PathBuf,

    /// Engine config (defaults to ./reimburse.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate one trip: <days> <miles> <receipts>
    Estimate {
        #[arg(value_name = "VALUE", allow_negative_numbers = true)]
        trip: Vec<String>,

        /// Print which stage answered and how the amount was built
        #[arg(long, default_value_t = false)]
        explain: bool,
    },

    /// Resolve every case of a dataset and report the error
    Eval {
        /// Cases to score (.json or .csv)
        #[arg(long)]
        cases: PathBuf,

        /// Score the business rules alone, skipping the lookup stages
        #[arg(long, default_value_t = false)]
        formula_only: bool,

        /// Number of worst cases to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Check the reference dataset for conflicts and suspicious repeats
    Audit {
        /// Repeats of one ($5-rounded) amount before it is flagged
        #[arg(long, default_value_t = reimburse_data::audit::DEFAULT_MIN_REPEATS)]
        min_repeats: usize,
    },

    /// Engine config helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective config as TOML
    Show,

    /// Write the default config to ./reimburse.toml (or --config)
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

/// Rejected before resolution begins.
#[derive(Debug, thiserror::Error)]
enum InputError {
    #[error("expected 3 values <days> <miles> <receipts>, got {0}")]
    WrongCount(usize),

    #[error(transparent)]
    Invalid(#[from] TripError),
}

/// Global options that consume the following token as their value.
const VALUE_FLAGS: [&str; 2] = ["--data", "--config"];

/// Insert `estimate` in front of a bare trip, so `reimburse 3 150 200` and
/// the named subcommands share one parser.
fn with_implied_estimate(mut args: Vec<OsString>) -> Vec<OsString> {
    let cmd = Cli::command();
    let mut i = 1;
    while let Some(tok) = args.get(i).and_then(|a| a.to_str()) {
        if tok == "--" {
            break;
        }
        if VALUE_FLAGS.contains(&tok) {
            i += 2;
            continue;
        }
        // Options, but not negative numbers: those belong to the trip.
        if tok.starts_with('-') && tok.parse::<f64>().is_err() {
            i += 1;
            continue;
        }
        if tok != "help" && cmd.find_subcommand(tok).is_none() {
            args.insert(i, OsString::from("estimate"));
        }
        break;
    }
    args
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(with_implied_estimate(std::env::args_os().collect()));
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if err.downcast_ref::<InputError>().is_some() {
                ExitCode::from(EXIT_INVALID_INPUT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Estimate { trip, explain } => {
            estimate(&trip, explain, &cli.data, cli.config.as_deref())
        }

        Command::Eval {
            cases,
            formula_only,
            top,
        } => {
            let resolver = build_resolver(&cli.data, cli.config.as_deref())?;
            let cases_list = reimburse_data::load_cases(&cases)?;
            let records =
                to_records(&cases_list).with_context(|| format!("validating {}", cases.display()))?;
            let report = eval::evaluate(&resolver, &records, formula_only, top);
            eval::print_report(&report, formula_only);
            Ok(())
        }

        Command::Audit { min_repeats } => {
            let table = load_table(&cli.data)?;
            audit(&table, min_repeats, &cli.data);
            Ok(())
        }

        Command::Config { command } => match command {
            ConfigCommand::Show => {
                let cfg = config::load_config(cli.config.as_deref())?;
                print!("{}", config::render_config(&cfg)?);
                Ok(())
            }
            ConfigCommand::Init { force } => {
                let path = cli
                    .config
                    .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
                config::init_config(&path, force)
            }
        },
    }
}

fn parse_trip(values: &[String]) -> Result<Trip, InputError> {
    let [days, miles, receipts] = values else {
        return Err(InputError::WrongCount(values.len()));
    };
    Ok(Trip::parse(days, miles, receipts)?)
}

fn estimate(values: &[String], explain: bool, data: &Path, config: Option<&Path>) -> Result<()> {
    // Validate before touching the dataset.
    let trip = parse_trip(values)?;
    let resolver = build_resolver(data, config)?;

    let resolution = resolver.resolve_detailed(&trip);
    if explain {
        println!("{}", explain::render(&resolver, &trip, &resolution));
    } else {
        println!("{:.2}", resolution.amount);
    }
    Ok(())
}

fn load_table(data: &Path) -> Result<ReferenceTable> {
    load_reference_table(data).with_context(|| format!("loading reference data {}", data.display()))
}

fn build_resolver(data: &Path, config: Option<&Path>) -> Result<Resolver> {
    let cfg = config::load_config(config)?;
    let table = load_table(data)?;
    Ok(Resolver::new(table, &cfg)?)
}

fn audit(table: &ReferenceTable, min_repeats: usize, data: &Path) {
    let report = audit_table(table, min_repeats);

    println!("Audited {} records from {}\n", report.records, data.display());

    println!("## Conflicting duplicates ({})\n", report.conflicts.len());
    for c in &report.conflicts {
        println!(
            "- {} | kept #{} = {:.2} | ignored #{} = {:.2}",
            c.key, c.kept_index, c.kept_amount, c.ignored_index, c.ignored_amount
        );
    }

    println!(
        "\n## Override candidates: amounts repeated {}+ times ({})\n",
        min_repeats,
        report.candidates.len()
    );
    for cand in &report.candidates {
        println!("- ~${:.2} x{}", cand.amount, cand.cases.len());
        for &i in &cand.cases {
            if let Some(rec) = table.get(i) {
                println!("    #{:<5} {} -> {:.2}", i, rec.trip, rec.observed_amount);
            }
        }
    }

    if report.is_clean() {
        println!("\nNo findings.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(args: &[&str]) -> Vec<String> {
        let args = args.iter().map(OsString::from).collect();
        with_implied_estimate(args)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    #[test]
    fn test_bare_trip_becomes_estimate() {
        assert_eq!(
            rewrite(&["reimburse", "3", "150", "200"]),
            ["reimburse", "estimate", "3", "150", "200"]
        );
        assert_eq!(
            rewrite(&["reimburse", "--data", "x.json", "-vv", "-1", "2", "3"]),
            ["reimburse", "--data", "x.json", "-vv", "estimate", "-1", "2", "3"]
        );
        // Non-numeric first value is still a (bad) trip, not a subcommand.
        assert_eq!(
            rewrite(&["reimburse", "--data=x.json", "abc", "1", "1"]),
            ["reimburse", "--data=x.json", "estimate", "abc", "1", "1"]
        );
    }

    #[test]
    fn test_subcommands_are_left_alone() {
        for args in [
            vec!["reimburse", "estimate", "--explain", "3", "150", "200"],
            vec!["reimburse", "--data", "audit", "audit"],
            vec!["reimburse", "--config", "r.toml", "config", "init"],
            vec!["reimburse", "eval", "--cases", "c.json"],
            vec!["reimburse", "help"],
            vec!["reimburse", "--help"],
        ] {
            assert_eq!(rewrite(&args), args);
        }
    }

    #[test]
    fn test_parses_all_surfaces() {
        let parse = |args: &[&str]| Cli::try_parse_from(rewrite(args)).unwrap().command;
        assert!(matches!(
            parse(&["reimburse", "3", "150", "200"]),
            Command::Estimate { explain: false, ref trip } if trip.len() == 3
        ));
        assert!(matches!(
            parse(&["reimburse", "estimate", "--explain", "3", "150", "200"]),
            Command::Estimate { explain: true, .. }
        ));
        assert!(matches!(
            parse(&["reimburse", "audit", "--min-repeats", "3"]),
            Command::Audit { min_repeats: 3 }
        ));
        assert!(matches!(
            parse(&["reimburse", "config", "show"]),
            Command::Config { command: ConfigCommand::Show }
        ));
    }
}
