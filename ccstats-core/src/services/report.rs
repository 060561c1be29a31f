//! Report service - statistics summaries over a transaction pool

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Statement, Transaction, TransactionPool, STATEMENT_DATE_FORMAT};

/// Days per reporting window
const WEEK_DAYS: i64 = 7;

/// Every statistic the pool offers, in one serializable value
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSummary {
    pub count: usize,
    pub authorized_count: usize,
    pub posted_count: usize,
    pub balance: Decimal,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub span_days: i64,
    pub average_transaction: Decimal,
    pub average_per_day: Decimal,
    pub average_per_week: Decimal,
    pub standard_deviation: Decimal,
    pub most_expensive: Option<Transaction>,
    pub least_expensive: Option<Transaction>,
    pub most_common: Option<Transaction>,
    pub most_common_count: usize,
}

/// Totals for one closed date window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub count: usize,
    pub balance: Decimal,
    /// Window balance spread over every day of the window
    pub average_per_day: Decimal,
}

/// Builds statistics summaries and their text rendering
#[derive(Debug, Clone, Default)]
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    /// Summarize a whole pool. Empty pools give zeros and `None`s.
    pub fn summarize(&self, pool: &TransactionPool) -> StatisticsSummary {
        let (earliest, latest) = match pool.date_range() {
            Some((earliest, latest)) => (Some(earliest), Some(latest)),
            None => (None, None),
        };
        let authorized_count = pool.iter().filter(|t| t.is_authorized()).count();
        let most_common = pool.most_common();

        StatisticsSummary {
            count: pool.len(),
            authorized_count,
            posted_count: pool.len() - authorized_count,
            balance: pool.balance(),
            earliest,
            latest,
            span_days: pool.date_span_days(),
            average_transaction: pool.average_transaction_amount(),
            average_per_day: pool.average_per_day(),
            average_per_week: pool.average_per_week(),
            standard_deviation: pool.standard_deviation(),
            most_expensive: pool.most_expensive().cloned(),
            least_expensive: pool.least_expensive().cloned(),
            most_common: most_common.map(|f| f.transaction.clone()),
            most_common_count: most_common.map_or(0, |f| f.count),
        }
    }

    pub fn summarize_statement(&self, statement: &Statement) -> StatisticsSummary {
        self.summarize(statement.transactions())
    }

    /// Consecutive 7-day windows starting at the earliest transaction. The
    /// last window is cut at the latest transaction date.
    pub fn weekly(&self, pool: &TransactionPool) -> Result<Vec<PeriodSummary>> {
        let Some((earliest, latest)) = pool.date_range() else {
            return Ok(Vec::new());
        };

        let mut periods = Vec::new();
        let mut start = earliest;
        while start <= latest {
            let end = (start + Duration::days(WEEK_DAYS - 1)).min(latest);
            let window = pool.between_dates(start, end);
            periods.push(PeriodSummary {
                start,
                end,
                count: window.len(),
                balance: window.balance(),
                average_per_day: pool.average_over_dates(start, end)?,
            });
            start = end + Duration::days(1);
        }
        Ok(periods)
    }

    /// Plain text report, as written to the stats output file
    pub fn render_text(&self, summary: &StatisticsSummary) -> String {
        let mut out = String::new();
        let date = |d: Option<NaiveDate>| {
            d.map_or_else(|| "-".to_string(), |d| d.format(STATEMENT_DATE_FORMAT).to_string())
        };
        let line = |t: &Option<Transaction>| {
            t.as_ref().map_or_else(|| "-".to_string(), |t| t.to_string())
        };

        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "Transactions: {} ({} authorized, {} posted)",
            summary.count,
            summary.authorized_count,
            summary.posted_count
        );
        let _ = writeln!(
            out,
            "Period: {} to {} ({} days)",
            date(summary.earliest),
            date(summary.latest),
            summary.span_days
        );
        let _ = writeln!(out, "Balance: {:.2}", summary.balance);
        let _ = writeln!(out, "Average transaction: {:.2}", summary.average_transaction);
        let _ = writeln!(out, "Average per day: {:.2}", summary.average_per_day);
        let _ = writeln!(out, "Average per week: {:.2}", summary.average_per_week);
        let _ = writeln!(out, "Standard deviation: {:.2}", summary.standard_deviation);
        let _ = writeln!(out, "Largest credit: {}", line(&summary.most_expensive));
        let _ = writeln!(out, "Largest debit: {}", line(&summary.least_expensive));
        let _ = writeln!(
            out,
            "Most common ({}x): {}",
            summary.most_common_count,
            line(&summary.most_common)
        );
        out
    }

    /// Text rendering of weekly windows, one per line
    pub fn render_periods(&self, periods: &[PeriodSummary]) -> String {
        let mut out = String::new();
        for period in periods {
            let _ = writeln!(
                out,
                "{} - {}: {} transactions, balance {:.2}, {:.2}/day",
                period.start.format(STATEMENT_DATE_FORMAT),
                period.end.format(STATEMENT_DATE_FORMAT),
                period.count,
                period.balance,
                period.average_per_day
            );
        }
        out
    }
}
