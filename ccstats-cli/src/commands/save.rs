//! Save command - extract an HTML statement into an encrypted store

use std::path::PathBuf;

use anyhow::{Context, Result};
use ccstats_core::adapters::HtmlStatementSource;
use ccstats_core::ports::StatementSource;
use ccstats_core::{LogEvent, Statement};

use super::{
    get_context, get_logger, get_new_password, get_password, log_event, log_failure, parse_range,
    read_store,
};
use crate::output;

pub struct SaveOptions {
    pub statement: PathBuf,
    pub store: PathBuf,
    pub merge: bool,
    pub from: Option<String>,
    pub to: Option<String>,
    pub password: Option<String>,
    pub json: bool,
}

pub fn run(options: SaveOptions) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("save_started").with_command("save"));

    match save(options) {
        Ok(()) => {
            log_event(&logger, LogEvent::new("save_completed").with_command("save"));
            Ok(())
        }
        Err(e) => {
            log_failure(&logger, "save_failed", "save", &e);
            Err(e)
        }
    }
}

fn save(options: SaveOptions) -> Result<()> {
    let ctx = get_context(options.json)?;
    let range = parse_range(options.from.as_deref(), options.to.as_deref())?;

    let source = HtmlStatementSource::new(&options.statement)?;
    let mut statement = source
        .statement()
        .with_context(|| format!("Failed to read statement {:?}", source.path()))?;
    if let Some((start, end)) = range {
        statement = Statement::from_pool(statement.transactions().between_dates(start, end));
    }
    let extracted = statement.len();

    let merging = options.merge && options.store.exists();
    if options.merge && !merging && !options.json {
        output::info(&format!(
            "{} does not exist yet, creating a new store",
            options.store.display()
        ));
    }

    let password = if merging {
        get_password(options.password, "Store password")?
    } else {
        get_new_password(options.password)?
    };

    if merging {
        let mut existing = read_store(&ctx, &options.store, &password, options.json)?;
        existing.merge(&statement);
        statement = existing;
    }

    let bar = output::progress_bar("Encrypting", options.json);
    let summary = ctx
        .store
        .write_with_progress(&options.store, &password, &statement, output::track(&bar))
        .with_context(|| format!("Failed to write store {:?}", options.store))?;
    bar.finish_and_clear();

    if options.json {
        println!(
            "{}",
            serde_json::json!({
                "store": options.store.to_string_lossy(),
                "extracted": extracted,
                "merged": merging,
                "summary": summary,
            })
        );
        return Ok(());
    }

    output::success(&format!(
        "Saved {} transactions to {} ({} extracted)",
        summary.transactions,
        options.store.display(),
        extracted
    ));
    println!(
        "  AES-{} key, {} KDF iterations",
        summary.key_length, summary.kdf_iterations
    );
    Ok(())
}
