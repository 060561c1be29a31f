//! Stats command - statistics of an encrypted store

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use ccstats_core::LogEvent;

use super::{get_context, get_logger, get_password, log_event, log_failure, parse_range, read_store};
use crate::output;

pub fn run(
    store: &Path,
    password: Option<String>,
    from: Option<String>,
    to: Option<String>,
    weekly: bool,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("stats_started").with_command("stats"));

    match stats(store, password, from, to, weekly, json) {
        Ok(()) => {
            log_event(&logger, LogEvent::new("stats_completed").with_command("stats"));
            Ok(())
        }
        Err(e) => {
            log_failure(&logger, "stats_failed", "stats", &e);
            Err(e)
        }
    }
}

fn stats(
    store: &Path,
    password: Option<String>,
    from: Option<String>,
    to: Option<String>,
    weekly: bool,
    json: bool,
) -> Result<()> {
    let ctx = get_context(json)?;
    let range = parse_range(from.as_deref(), to.as_deref())?;
    let password = get_password(password, "Store password")?;
    let statement = read_store(&ctx, store, &password, json)?;

    let pool = match range {
        Some((start, end)) => statement.transactions().between_dates(start, end),
        None => statement.transactions().clone(),
    };

    let summary = ctx.report_service.summarize(&pool);
    let periods = if weekly {
        ctx.report_service.weekly(&pool)?
    } else {
        Vec::new()
    };

    if json {
        let mut value = serde_json::json!({ "summary": summary });
        if weekly {
            value["weekly"] = serde_json::to_value(&periods)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Store Statistics".bold());
    println!();
    println!("{}", output::summary_table(&summary));

    if weekly && !periods.is_empty() {
        println!();
        println!("{}", "Weekly".bold());
        let mut table = output::create_table();
        table.set_header(vec!["From", "To", "Transactions", "Balance", "Per day"]);
        for period in &periods {
            table.add_row(vec![
                period.start.format("%b %d, %Y").to_string(),
                period.end.format("%b %d, %Y").to_string(),
                period.count.to_string(),
                output::format_amount(period.balance),
                output::format_amount(period.average_per_day),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
