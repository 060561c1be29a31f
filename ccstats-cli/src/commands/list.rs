//! List command - filtered transactions of an encrypted store

use std::path::PathBuf;

use anyhow::Result;
use clap::ValueEnum;
use ccstats_core::{LogEvent, TransactionKind};
use rust_decimal::Decimal;

use super::{get_context, get_logger, get_password, log_event, log_failure, parse_range, read_store};
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    All,
    Authorized,
    Posted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Debit,
    Credit,
}

impl From<KindFilter> for TransactionKind {
    fn from(kind: KindFilter) -> Self {
        match kind {
            KindFilter::Debit => TransactionKind::Debit,
            KindFilter::Credit => TransactionKind::Credit,
        }
    }
}

pub struct ListOptions {
    pub store: PathBuf,
    pub password: Option<String>,
    pub status: StatusFilter,
    pub kind: Option<KindFilter>,
    pub search: Option<String>,
    pub exact: bool,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub json: bool,
}

pub fn run(options: ListOptions) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("list_started").with_command("list"));

    match list(options) {
        Ok(()) => {
            log_event(&logger, LogEvent::new("list_completed").with_command("list"));
            Ok(())
        }
        Err(e) => {
            log_failure(&logger, "list_failed", "list", &e);
            Err(e)
        }
    }
}

fn list(options: ListOptions) -> Result<()> {
    let ctx = get_context(options.json)?;
    let range = parse_range(options.from.as_deref(), options.to.as_deref())?;
    let password = get_password(options.password, "Store password")?;
    let statement = read_store(&ctx, &options.store, &password, options.json)?;

    let mut pool = match options.status {
        StatusFilter::All => statement.into_pool(),
        StatusFilter::Authorized => statement.authorized(),
        StatusFilter::Posted => statement.posted(),
    };
    if let Some(kind) = options.kind {
        pool = pool.filter_by_kind(kind.into());
    }
    if let Some(keyword) = options.search.as_deref() {
        pool = pool.matching_description(keyword, !options.exact);
    }
    if options.min.is_some() || options.max.is_some() {
        pool = pool.within_amounts(
            options.min.unwrap_or(Decimal::MIN),
            options.max.unwrap_or(Decimal::MAX),
        );
    }
    if let Some((start, end)) = range {
        pool = pool.between_dates(start, end);
    }

    if options.json {
        let transactions: Vec<_> = pool.iter().collect();
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if pool.is_empty() {
        println!("No matching transactions.");
        return Ok(());
    }

    println!("{}", output::transactions_table(&pool));
    println!(
        "{} transactions, balance {}",
        pool.len(),
        output::format_amount(pool.balance())
    );
    Ok(())
}
