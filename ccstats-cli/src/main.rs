//! Ccstats CLI - credit card statement statistics in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;
mod output;

use commands::list::{KindFilter, ListOptions, StatusFilter};
use commands::remove::RemoveTarget;
use commands::save::SaveOptions;
use commands::{analyze, config, list, logs, remove, save, stats};

/// Ccstats - statistics and encrypted storage for credit card statements
#[derive(Parser)]
#[command(name = "ccs", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics of an HTML statement
    Analyze {
        /// Statement page (.html or .htm)
        statement: PathBuf,
        /// Write the text report to a file
        #[arg(long)]
        output_stats: bool,
        /// Report file (defaults to the statsOutput setting)
        #[arg(long, requires = "output_stats")]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract an HTML statement into an encrypted store
    Save {
        /// Statement page (.html or .htm)
        statement: PathBuf,
        /// Store file to write
        #[arg(long)]
        store: PathBuf,
        /// Add to the transactions already in the store
        #[arg(long)]
        merge: bool,
        /// Keep transactions from this date ("Jan 01, 2024")
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Keep transactions up to this date ("Jan 31, 2024")
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Store password (or CCSTATS_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print statistics of an encrypted store
    Stats {
        /// Store file
        store: PathBuf,
        /// Store password (or CCSTATS_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Only transactions from this date
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Only transactions up to this date
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Add weekly totals
        #[arg(long)]
        weekly: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions of an encrypted store
    List {
        /// Store file
        store: PathBuf,
        /// Store password (or CCSTATS_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Authorized, posted or all transactions
        #[arg(long, value_enum, default_value = "all")]
        status: StatusFilter,
        /// Debits or credits only
        #[arg(long, value_enum)]
        kind: Option<KindFilter>,
        /// Description keyword (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Match the whole description instead of a substring
        #[arg(long, requires = "search")]
        exact: bool,
        /// Smallest signed amount
        #[arg(long, allow_negative_numbers = true)]
        min: Option<Decimal>,
        /// Largest signed amount
        #[arg(long, allow_negative_numbers = true)]
        max: Option<Decimal>,
        /// Only transactions from this date
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Only transactions up to this date
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove transactions from an encrypted store
    #[command(group(ArgGroup::new("target").required(true).args(["keyword", "description"])))]
    Remove {
        /// Store file
        store: PathBuf,
        /// Store password (or CCSTATS_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Remove every transaction whose description contains this
        #[arg(long)]
        keyword: Option<String>,
        /// Remove transactions with exactly this description...
        #[arg(long, requires = "amount")]
        description: Option<String>,
        /// ...and this signed amount
        #[arg(long, requires = "description", allow_negative_numbers = true)]
        amount: Option<Decimal>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config(config::ConfigArgs),

    /// Show where the event log is and what it holds
    Logs(logs::LogsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            statement,
            output_stats,
            output,
            json,
        } => analyze::run(&statement, output_stats, output, json),
        Commands::Save {
            statement,
            store,
            merge,
            from,
            to,
            password,
            json,
        } => save::run(SaveOptions {
            statement,
            store,
            merge,
            from,
            to,
            password,
            json,
        }),
        Commands::Stats {
            store,
            password,
            from,
            to,
            weekly,
            json,
        } => stats::run(&store, password, from, to, weekly, json),
        Commands::List {
            store,
            password,
            status,
            kind,
            search,
            exact,
            min,
            max,
            from,
            to,
            json,
        } => list::run(ListOptions {
            store,
            password,
            status,
            kind,
            search,
            exact,
            min,
            max,
            from,
            to,
            json,
        }),
        Commands::Remove {
            store,
            password,
            keyword,
            description,
            amount,
            json,
        } => {
            let target = match (keyword, description, amount) {
                (Some(keyword), _, _) => RemoveTarget::Keyword(keyword),
                (None, Some(description), Some(amount)) => {
                    RemoveTarget::Equivalent { description, amount }
                }
                _ => anyhow::bail!("give --keyword, or --description with --amount"),
            };
            remove::run(store, password, target, json)
        }
        Commands::Config(args) => config::run(args),
        Commands::Logs(args) => logs::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_remove_needs_a_target() {
        assert!(Cli::try_parse_from(["ccs", "remove", "s.json"]).is_err());
        assert!(
            Cli::try_parse_from(["ccs", "remove", "s.json", "--description", "COFFEE"]).is_err()
        );
        assert!(Cli::try_parse_from([
            "ccs", "remove", "s.json", "--description", "COFFEE", "--amount", "-4.50"
        ])
        .is_ok());
    }

    #[test]
    fn test_config_flags_parse() {
        let cli = Cli::try_parse_from(["ccs", "config", "--max-key-length", "128"]).unwrap();
        match cli.command {
            Commands::Config(args) => assert_eq!(args.max_key_length, Some(128)),
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn test_logs_takes_flags_not_subcommands() {
        assert!(Cli::try_parse_from(["ccs", "logs", "--tail", "5", "--prune", "30"]).is_ok());
        assert!(Cli::try_parse_from(["ccs", "logs", "list"]).is_err());
    }

    #[test]
    fn test_list_filters_parse() {
        let cli = Cli::try_parse_from([
            "ccs", "list", "s.json", "--status", "posted", "--kind", "debit", "--min", "-50",
        ])
        .unwrap();
        match cli.command {
            Commands::List { status, kind, min, .. } => {
                assert_eq!(status, StatusFilter::Posted);
                assert_eq!(kind, Some(KindFilter::Debit));
                assert_eq!(min, Some(Decimal::new(-50, 0)));
            }
            _ => panic!("expected list"),
        }
    }
}
