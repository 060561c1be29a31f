//! Output formatting utilities

use ccstats_core::services::StatisticsSummary;
use ccstats_core::{Transaction, TransactionPool};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rust_decimal::Decimal;

const DATE_FORMAT: &str = "%b %d, %Y";

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Signed amount, red for debits
pub fn format_amount(amount: Decimal) -> String {
    let text = format!("{:.2}", amount);
    if amount.is_sign_negative() {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

fn format_transaction(transaction: Option<&Transaction>) -> String {
    transaction.map_or_else(
        || "-".to_string(),
        |t| format!("{} ({:.2}, {})", t.description(), t.amount(), t.date().format(DATE_FORMAT)),
    )
}

/// One row per transaction, in pool order
pub fn transactions_table(pool: &TransactionPool) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Date", "Description", "Amount", "Type", "Status"]);
    for t in pool {
        table.add_row(vec![
            Cell::new(t.date().format(DATE_FORMAT)),
            Cell::new(t.description()),
            Cell::new(format_amount(t.amount())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:?}", t.kind()).to_lowercase()),
            Cell::new(format!("{:?}", t.status()).to_lowercase()),
        ]);
    }
    table
}

/// Key/value table of a statistics summary
pub fn summary_table(summary: &StatisticsSummary) -> Table {
    let date = |d: Option<chrono::NaiveDate>| {
        d.map_or_else(|| "-".to_string(), |d| d.format(DATE_FORMAT).to_string())
    };

    let mut table = create_table();
    table.add_row(vec![
        "Transactions".to_string(),
        format!(
            "{} ({} authorized, {} posted)",
            summary.count, summary.authorized_count, summary.posted_count
        ),
    ]);
    table.add_row(vec![
        "Period".to_string(),
        format!(
            "{} to {} ({} days)",
            date(summary.earliest),
            date(summary.latest),
            summary.span_days
        ),
    ]);
    table.add_row(vec!["Balance".to_string(), format_amount(summary.balance)]);
    table.add_row(vec![
        "Average transaction".to_string(),
        format_amount(summary.average_transaction),
    ]);
    table.add_row(vec!["Average per day".to_string(), format_amount(summary.average_per_day)]);
    table.add_row(vec!["Average per week".to_string(), format_amount(summary.average_per_week)]);
    table.add_row(vec![
        "Standard deviation".to_string(),
        format!("{:.2}", summary.standard_deviation),
    ]);
    table.add_row(vec![
        "Largest credit".to_string(),
        format_transaction(summary.most_expensive.as_ref()),
    ]);
    table.add_row(vec![
        "Largest debit".to_string(),
        format_transaction(summary.least_expensive.as_ref()),
    ]);
    table.add_row(vec![
        format!("Most common ({}x)", summary.most_common_count),
        format_transaction(summary.most_common.as_ref()),
    ]);
    table
}

/// Progress bar for per-field key derivation. Hidden for JSON output.
pub fn progress_bar(label: &str, hidden: bool) -> ProgressBar {
    let bar = ProgressBar::new(0);
    if hidden {
        bar.set_draw_target(ProgressDrawTarget::hidden());
        return bar;
    }
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len} fields") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(label.to_string());
    bar
}

/// Adapter from the store's `(done, total)` callback to a progress bar
pub fn track(bar: &ProgressBar) -> impl FnMut(usize, usize) + '_ {
    move |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    }
}
