//! Transaction domain model

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Date format used by bank statements and range queries (e.g. "Dec 17, 2015")
pub const STATEMENT_DATE_FORMAT: &str = "%b %d, %Y";

/// Parse a statement-formatted date ("MMM dd, yyyy")
pub fn parse_statement_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, STATEMENT_DATE_FORMAT).map_err(|source| Error::DateParse {
        input: trimmed.to_string(),
        source,
    })
}

/// Debit (credit consumption) or credit (payment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debit,
    Credit,
}

/// Authorized (pending) or posted (settled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Authorized,
    Posted,
}

/// A transaction tuple as handed over by a statement extractor.
///
/// `amount` is the unsigned magnitude shown on the statement; the sign is
/// derived from `is_debit` when the row becomes a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub description: String,
    /// Statement date text ("MMM dd, yyyy")
    pub date: String,
    pub amount: Decimal,
    pub is_debit: bool,
    pub is_authorized: bool,
}

/// One ledger line of a credit card statement.
///
/// Immutable once built. Equality only looks at description and amount so
/// that recurring charges on different days compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    description: String,
    date: NaiveDate,
    amount: Decimal,
    authorized: bool,
}

impl Transaction {
    /// Create a transaction from an already signed amount
    pub fn new(description: &str, date: NaiveDate, amount: Decimal, authorized: bool) -> Self {
        Self {
            description: description.trim().to_string(),
            date,
            amount,
            authorized,
        }
    }

    /// Build from an extractor tuple: debits become negative
    pub fn from_raw(raw: &RawTransaction) -> Result<Self> {
        let date = parse_statement_date(&raw.date)?;
        let magnitude = raw.amount.abs();
        let amount = if raw.is_debit { -magnitude } else { magnitude };
        Ok(Self::new(&raw.description, date, amount, raw.is_authorized))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Signed amount (negative = debit)
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn kind(&self) -> TransactionKind {
        if self.amount < Decimal::ZERO {
            TransactionKind::Debit
        } else {
            TransactionKind::Credit
        }
    }

    pub fn status(&self) -> TransactionStatus {
        if self.authorized {
            TransactionStatus::Authorized
        } else {
            TransactionStatus::Posted
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.amount == other.amount && self.description == other.description
    }
}

impl Eq for Transaction {}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status() {
            TransactionStatus::Authorized => "Authorized",
            TransactionStatus::Posted => "Posted",
        };
        let kind = match self.kind() {
            TransactionKind::Debit => "Debit",
            TransactionKind::Credit => "Credit",
        };
        write!(
            f,
            "[Status: {}, Type: {}, Description: {}, Amount: {}, Date: {}.]",
            status,
            kind,
            self.description,
            self.amount.abs(),
            self.date
        )
    }
}
