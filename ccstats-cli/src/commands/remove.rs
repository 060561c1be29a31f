//! Remove command - delete transactions from an encrypted store

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ccstats_core::{LogEvent, Transaction};
use rust_decimal::Decimal;

use super::{get_context, get_logger, get_password, log_event, log_failure, read_store};
use crate::output;

/// What to remove
pub enum RemoveTarget {
    /// Every transaction whose description contains the keyword
    Keyword(String),
    /// Every transaction with this description and signed amount
    Equivalent { description: String, amount: Decimal },
}

pub fn run(
    store: PathBuf,
    password: Option<String>,
    target: RemoveTarget,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("remove_started").with_command("remove"));

    match remove(store, password, target, json) {
        Ok(()) => {
            log_event(&logger, LogEvent::new("remove_completed").with_command("remove"));
            Ok(())
        }
        Err(e) => {
            log_failure(&logger, "remove_failed", "remove", &e);
            Err(e)
        }
    }
}

fn remove(
    store: PathBuf,
    password: Option<String>,
    target: RemoveTarget,
    json: bool,
) -> Result<()> {
    let ctx = get_context(json)?;
    let password = get_password(password, "Store password")?;
    let mut statement = read_store(&ctx, &store, &password, json)?;
    let before = statement.len();

    match &target {
        RemoveTarget::Keyword(keyword) => {
            statement.remove_by_keyword(keyword);
        }
        RemoveTarget::Equivalent { description, amount } => {
            // equality ignores the date
            let probe = Transaction::new(description, NaiveDate::MIN, *amount, false);
            statement.remove_equivalent(&probe);
        }
    }
    let removed = before - statement.len();

    if removed > 0 {
        let bar = output::progress_bar("Encrypting", json);
        ctx.store
            .write_with_progress(&store, &password, &statement, output::track(&bar))
            .with_context(|| format!("Failed to write store {:?}", store))?;
        bar.finish_and_clear();
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "removed": removed, "remaining": statement.len() })
        );
    } else if removed == 0 {
        output::warning("No matching transactions; store left unchanged");
    } else {
        output::success(&format!(
            "Removed {} transactions, {} remaining",
            removed,
            statement.len()
        ));
    }
    Ok(())
}
