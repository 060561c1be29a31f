//! Analyze command - statistics straight from an HTML statement

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use ccstats_core::adapters::HtmlStatementSource;
use ccstats_core::ports::StatementSource;
use ccstats_core::LogEvent;

use super::{get_context, get_logger, log_event, log_failure};
use crate::output;

pub fn run(
    statement: &Path,
    output_stats: bool,
    output_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("analyze_started").with_command("analyze"));

    match analyze(statement, output_stats, output_path, json) {
        Ok(()) => {
            log_event(&logger, LogEvent::new("analyze_completed").with_command("analyze"));
            Ok(())
        }
        Err(e) => {
            log_failure(&logger, "analyze_failed", "analyze", &e);
            Err(e)
        }
    }
}

fn analyze(
    statement: &Path,
    output_stats: bool,
    output_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let ctx = get_context(json)?;
    let source = HtmlStatementSource::new(statement)?;
    let statement = source
        .statement()
        .with_context(|| format!("Failed to read statement {:?}", source.path()))?;

    let summary = ctx.report_service.summarize_statement(&statement);

    if output_stats {
        let path = output_path.unwrap_or_else(|| PathBuf::from(&ctx.config.stats_output));
        std::fs::write(&path, ctx.report_service.render_text(&summary))
            .with_context(|| format!("Failed to write statistics to {:?}", path))?;
        if !json {
            output::success(&format!("Statistics written to {}", path.display()));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Statement Statistics".bold());
    println!();
    println!("{}", output::summary_table(&summary));
    println!();
    println!(
        "Authorized due: {}   Posted due: {}",
        output::format_amount(statement.authorized_balance()),
        output::format_amount(statement.posted_balance())
    );

    Ok(())
}
