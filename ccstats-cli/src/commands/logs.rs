//! Logs command - where the event log lives and what is in it

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Args;
use colored::Colorize;

use super::get_logger;
use crate::output;
use ccstats_core::services::logging::now_ms;
use ccstats_core::LogEntry;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Args)]
pub struct LogsArgs {
    /// Print the last N entries
    #[arg(long, value_name = "N")]
    tail: Option<usize>,
    /// Drop entries older than this many days
    #[arg(long, value_name = "DAYS")]
    prune: Option<u32>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn entry_line(entry: &LogEntry) -> String {
    let time = Utc
        .timestamp_millis_opt(entry.timestamp)
        .single()
        .map_or_else(|| entry.timestamp.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
    let mut line = format!("{}  {}", time, entry.event);
    if let Some(category) = &entry.error_category {
        line.push_str(&format!("  {}", category.red()));
    }
    line
}

pub fn run(args: LogsArgs) -> Result<()> {
    let Some(logger) = get_logger() else {
        anyhow::bail!("event log is not available; check CCSTATS_DIR");
    };

    let pruned = match args.prune {
        Some(days) => Some(logger.prune(now_ms() - i64::from(days) * DAY_MS)?),
        None => None,
    };
    let recent = match args.tail {
        Some(n) => logger.tail(n)?,
        None => Vec::new(),
    };
    let count = logger.count()?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "path": logger.path().to_string_lossy(),
                "entries": count,
                "pruned": pruned,
                "tail": recent,
            }))?
        );
        return Ok(());
    }

    if let Some(pruned) = pruned {
        output::success(&format!("Pruned {} entries", pruned));
    }
    output::info(&format!("{} entries in {}", count, logger.path().display()));
    for entry in &recent {
        println!("{}", entry_line(entry));
    }
    Ok(())
}
