//! Transaction pool - date ordered collection with a frequency index
//!
//! Two invariants hold after every public mutation:
//!
//! - transactions are ordered by date, most recent first; transactions on
//!   the same day keep their insertion order
//! - the frequency index holds one entry per equality class (description +
//!   amount) present in the pool, and the counts add up to the pool size
//!
//! Statistics saturate at `Decimal::MAX`/`Decimal::MIN` instead of
//! overflowing, so any parsed amount gives a value.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

use super::result::{Error, Result};
use super::transaction::{parse_statement_date, Transaction, TransactionKind};

/// Occurrence count of one equality class of transactions
#[derive(Debug, Clone, Serialize)]
pub struct Frequency {
    /// First transaction seen for this class
    pub transaction: Transaction,
    pub count: usize,
}

/// Sorted, frequency-tracked collection of transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
    /// Kept in first-seen order so tie-breaks are deterministic
    frequencies: Vec<Frequency>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool by inserting every transaction in iteration order
    pub fn from_transactions<I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut pool = Self::new();
        pool.insert_all(transactions);
        pool
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Insert after every transaction dated the same day or later, so
    /// same-day transactions stay in insertion order. O(n).
    pub fn insert(&mut self, transaction: Transaction) {
        let index = self
            .transactions
            .iter()
            .position(|existing| existing.date() < transaction.date())
            .unwrap_or(self.transactions.len());

        self.record_frequency(&transaction);
        self.transactions.insert(index, transaction);
    }

    /// Insert one by one, in the given order
    pub fn insert_all<I>(&mut self, transactions: I)
    where
        I: IntoIterator<Item = Transaction>,
    {
        for transaction in transactions {
            self.insert(transaction);
        }
    }

    /// Remove every transaction whose description contains `keyword`
    /// (case-insensitive). Returns whether anything was removed.
    pub fn remove_by_keyword(&mut self, keyword: &str) -> bool {
        let key = keyword.to_lowercase();
        self.remove_where(|t| t.description().to_lowercase().contains(&key)) > 0
    }

    /// Remove every transaction equal (description + amount) to `transaction`.
    /// Returns the number removed.
    pub fn remove_equivalent(&mut self, transaction: &Transaction) -> usize {
        self.remove_where(|t| t == transaction)
    }

    fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&Transaction) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.transactions.drain(..).partition(|t| predicate(t));
        self.transactions = kept;
        for transaction in &removed {
            self.forget_frequency(transaction);
        }
        removed.len()
    }

    fn record_frequency(&mut self, transaction: &Transaction) {
        match self
            .frequencies
            .iter_mut()
            .find(|f| f.transaction == *transaction)
        {
            Some(frequency) => frequency.count += 1,
            None => self.frequencies.push(Frequency {
                transaction: transaction.clone(),
                count: 1,
            }),
        }
    }

    fn forget_frequency(&mut self, transaction: &Transaction) {
        if let Some(index) = self
            .frequencies
            .iter()
            .position(|f| f.transaction == *transaction)
        {
            self.frequencies[index].count -= 1;
            if self.frequencies[index].count == 0 {
                self.frequencies.remove(index);
            }
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Frequency entries in first-seen order
    pub fn frequencies(&self) -> &[Frequency] {
        &self.frequencies
    }

    /// How many transactions in the pool are equal to `transaction`
    pub fn frequency_of(&self, transaction: &Transaction) -> usize {
        self.frequencies
            .iter()
            .find(|f| f.transaction == *transaction)
            .map_or(0, |f| f.count)
    }

    // =========================================================================
    // Filters (each returns a new pool, relative order preserved)
    // =========================================================================

    fn filtered<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Transaction) -> bool,
    {
        Self::from_transactions(self.transactions.iter().filter(|t| predicate(t)).cloned())
    }

    /// Debits (`amount < 0`) or credits (`amount >= 0`)
    pub fn filter_by_kind(&self, kind: TransactionKind) -> Self {
        self.filtered(|t| t.kind() == kind)
    }

    pub fn debits(&self) -> Self {
        self.filter_by_kind(TransactionKind::Debit)
    }

    pub fn credits(&self) -> Self {
        self.filter_by_kind(TransactionKind::Credit)
    }

    /// Transactions dated within `[start, end]`, both given as "MMM dd, yyyy"
    pub fn between(&self, start: &str, end: &str) -> Result<Self> {
        let start = parse_statement_date(start)?;
        let end = parse_statement_date(end)?;
        Ok(self.between_dates(start, end))
    }

    /// Transactions dated within `[start, end]`
    pub fn between_dates(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.filtered(|t| t.date() >= start && t.date() <= end)
    }

    /// Transactions whose signed amount is within `[min, max]`
    pub fn within_amounts(&self, min: Decimal, max: Decimal) -> Self {
        self.filtered(|t| t.amount() >= min && t.amount() <= max)
    }

    /// Case-insensitive description match; with `substring` set, descriptions
    /// containing the keyword are included as well as exact matches.
    pub fn matching_description(&self, keyword: &str, substring: bool) -> Self {
        let key = keyword.to_lowercase();
        self.filtered(|t| {
            let description = t.description().to_lowercase();
            description == key || (substring && description.contains(&key))
        })
    }

    /// All transactions equal (description + amount) to `transaction`
    pub fn equal_to(&self, transaction: &Transaction) -> Self {
        self.filtered(|t| t == transaction)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Sum of signed amounts
    pub fn balance(&self) -> Decimal {
        total(self.transactions.iter().map(Transaction::amount))
    }

    /// `(earliest, latest)` dates, read off the ends of the sorted pool
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let latest = self.transactions.first()?.date();
        let earliest = self.transactions.last()?.date();
        Some((earliest, latest))
    }

    /// Days from the earliest to the latest transaction, both included
    pub fn date_span_days(&self) -> i64 {
        self.date_range()
            .map_or(0, |(earliest, latest)| (latest - earliest).num_days() + 1)
    }

    pub fn average_transaction_amount(&self) -> Decimal {
        if self.is_empty() {
            return Decimal::ZERO;
        }
        self.balance() / Decimal::from(self.len())
    }

    /// Balance spread over the days that have transactions
    pub fn average_per_day(&self) -> Decimal {
        if self.is_empty() {
            return Decimal::ZERO;
        }
        self.balance() / Decimal::from(self.date_span_days())
    }

    pub fn average_per_week(&self) -> Decimal {
        self.average_per_day().saturating_mul(Decimal::from(7))
    }

    /// Balance of the range, spread over every calendar day of the range.
    /// Dates are "MMM dd, yyyy".
    pub fn average_over(&self, start: &str, end: &str) -> Result<Decimal> {
        let start = parse_statement_date(start)?;
        let end = parse_statement_date(end)?;
        self.average_over_dates(start, end)
    }

    pub fn average_over_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        if end < start {
            return Err(Error::validation(format!(
                "date range ends ({}) before it starts ({})",
                end, start
            )));
        }
        let days = (end - start).num_days() + 1;
        Ok(self.between_dates(start, end).balance() / Decimal::from(days))
    }

    /// Sample standard deviation of the amounts (n - 1 denominator)
    pub fn standard_deviation(&self) -> Decimal {
        if self.len() <= 1 {
            return Decimal::ZERO;
        }
        let mean = self.average_transaction_amount();
        let squares = total(self.transactions.iter().map(|t| {
            let deviation = t.amount().saturating_sub(mean);
            deviation.saturating_mul(deviation)
        }));
        let variance = squares / Decimal::from(self.len() - 1);
        variance.sqrt().unwrap_or(Decimal::ZERO)
    }

    /// Highest signed amount; on ties the later transaction wins
    pub fn most_expensive(&self) -> Option<&Transaction> {
        let mut iter = self.transactions.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |best, t| if t.amount() >= best.amount() { t } else { best }))
    }

    /// Lowest signed amount; on ties the later transaction wins
    pub fn least_expensive(&self) -> Option<&Transaction> {
        let mut iter = self.transactions.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |best, t| if t.amount() <= best.amount() { t } else { best }))
    }

    /// Most frequent equality class. Ties go to the class seen last for the
    /// first time.
    pub fn most_common(&self) -> Option<&Frequency> {
        let mut iter = self.frequencies.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |best, f| if f.count >= best.count { f } else { best }))
    }

    pub fn into_vec(self) -> Vec<Transaction> {
        self.transactions
    }
}

/// Saturating sum of amounts
pub(crate) fn total<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |sum, amount| sum.saturating_add(amount))
}

impl<'a> IntoIterator for &'a TransactionPool {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

impl FromIterator<Transaction> for TransactionPool {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self::from_transactions(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(description: &str, day: NaiveDate, cents: i64) -> Transaction {
        Transaction::new(description, day, Decimal::new(cents, 2), false)
    }

    /// Coffee, Coffee, Payment - the reference scenario
    fn sample_pool() -> TransactionPool {
        TransactionPool::from_transactions(vec![
            tx("Coffee", date(2024, 1, 10), -500),
            tx("Coffee", date(2024, 1, 10), -500),
            tx("Payment", date(2024, 1, 5), 10000),
        ])
    }

    fn assert_sorted(pool: &TransactionPool) {
        for pair in pool.as_slice().windows(2) {
            assert!(pair[0].date() >= pair[1].date());
        }
    }

    fn frequency_sum(pool: &TransactionPool) -> usize {
        pool.frequencies().iter().map(|f| f.count).sum()
    }

    #[test]
    fn test_insert_keeps_descending_order() {
        let mut pool = TransactionPool::new();
        pool.insert(tx("b", date(2024, 1, 5), -100));
        pool.insert(tx("c", date(2024, 1, 20), -100));
        pool.insert(tx("a", date(2024, 1, 1), -100));
        pool.insert(tx("d", date(2024, 1, 10), -100));

        let order: Vec<&str> = pool.iter().map(|t| t.description()).collect();
        assert_eq!(order, vec!["c", "d", "b", "a"]);
        assert_sorted(&pool);
    }

    #[test]
    fn test_same_day_keeps_insertion_order() {
        let mut pool = TransactionPool::new();
        pool.insert(tx("first", date(2024, 1, 10), -100));
        pool.insert(tx("older", date(2024, 1, 1), -100));
        pool.insert(tx("second", date(2024, 1, 10), -200));
        pool.insert(tx("third", date(2024, 1, 10), -300));

        let order: Vec<&str> = pool.iter().map(|t| t.description()).collect();
        assert_eq!(order, vec!["first", "second", "third", "older"]);
    }

    #[test]
    fn test_reference_scenario() {
        let pool = sample_pool();

        let dates: Vec<NaiveDate> = pool.iter().map(|t| t.date()).collect();
        assert_eq!(dates, vec![date(2024, 1, 10), date(2024, 1, 10), date(2024, 1, 5)]);
        assert_eq!(pool.balance(), Decimal::new(9000, 2));

        let common = pool.most_common().unwrap();
        assert_eq!(common.transaction.description(), "Coffee");
        assert_eq!(common.transaction.amount(), Decimal::new(-500, 2));
        assert_eq!(common.count, 2);
    }

    #[test]
    fn test_between_inclusive() {
        let pool = sample_pool();
        let range = pool.between("Jan 01, 2024", "Jan 10, 2024").unwrap();
        assert_eq!(range.len(), 3);

        let edge = pool.between("Jan 05, 2024", "Jan 05, 2024").unwrap();
        assert_eq!(edge.len(), 1);
        assert_eq!(edge.get(0).unwrap().description(), "Payment");
    }

    #[test]
    fn test_between_rejects_malformed_date() {
        let pool = sample_pool();
        assert!(matches!(
            pool.between("2024-01-01", "Jan 10, 2024"),
            Err(Error::DateParse { .. })
        ));
    }

    #[test]
    fn test_frequency_tracking() {
        let mut pool = sample_pool();
        assert_eq!(pool.frequencies().len(), 2);
        assert_eq!(frequency_sum(&pool), pool.len());

        // Different day, same description and amount: same class
        pool.insert(tx("Coffee", date(2024, 2, 1), -500));
        assert_eq!(pool.frequencies().len(), 2);
        assert_eq!(pool.frequency_of(&tx("Coffee", date(2000, 1, 1), -500)), 3);
        assert_eq!(frequency_sum(&pool), pool.len());

        // Different amount: new class
        pool.insert(tx("Coffee", date(2024, 2, 2), -650));
        assert_eq!(pool.frequencies().len(), 3);
        assert_eq!(frequency_sum(&pool), pool.len());
    }

    #[test]
    fn test_filter_by_kind() {
        let pool = sample_pool();
        assert_eq!(pool.debits().len(), 2);
        assert_eq!(pool.credits().len(), 1);

        let zero = TransactionPool::from_transactions(vec![tx("Adjustment", date(2024, 1, 1), 0)]);
        assert_eq!(zero.credits().len(), 1);
        assert!(zero.debits().is_empty());
    }

    #[test]
    fn test_within_amounts_inclusive() {
        let pool = sample_pool();
        let range = pool.within_amounts(Decimal::new(-500, 2), Decimal::ZERO);
        assert_eq!(range.len(), 2);
        let range = pool.within_amounts(Decimal::new(-499, 2), Decimal::new(10000, 2));
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_matching_description() {
        let pool = TransactionPool::from_transactions(vec![
            tx("Coffee", date(2024, 1, 3), -500),
            tx("COFFEE SHOP", date(2024, 1, 2), -700),
            tx("Groceries", date(2024, 1, 1), -4000),
        ]);

        let exact = pool.matching_description("coffee", false);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact.get(0).unwrap().description(), "Coffee");

        let contains = pool.matching_description("coffee", true);
        assert_eq!(contains.len(), 2);
    }

    #[test]
    fn test_remove_by_keyword_updates_frequencies() {
        let mut pool = sample_pool();
        assert!(pool.remove_by_keyword("cOfF"));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.frequencies().len(), 1);
        assert_eq!(frequency_sum(&pool), 1);
        assert!(!pool.remove_by_keyword("coffee"));
    }

    #[test]
    fn test_remove_equivalent() {
        let mut pool = sample_pool();
        pool.insert(tx("Coffee", date(2024, 1, 7), -650));

        let removed = pool.remove_equivalent(&tx("Coffee", date(1999, 1, 1), -500));
        assert_eq!(removed, 2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.frequency_of(&tx("Coffee", date(2024, 1, 7), -650)), 1);
        assert_eq!(frequency_sum(&pool), pool.len());
        assert_sorted(&pool);
    }

    #[test]
    fn test_date_span_and_averages() {
        let pool = sample_pool();
        assert_eq!(pool.date_span_days(), 6);
        assert_eq!(pool.date_range(), Some((date(2024, 1, 5), date(2024, 1, 10))));
        assert_eq!(pool.average_transaction_amount(), Decimal::new(30, 0));
        assert_eq!(pool.average_per_day(), Decimal::new(15, 0));
        assert_eq!(pool.average_per_week(), Decimal::new(105, 0));
    }

    #[test]
    fn test_average_over_uses_nominal_days() {
        let pool = sample_pool();
        // 90.00 over the 10 days of Jan 01..Jan 10
        let average = pool.average_over("Jan 01, 2024", "Jan 10, 2024").unwrap();
        assert_eq!(average, Decimal::new(9, 0));

        // Only the payment falls in Jan 05..Jan 09
        let average = pool.average_over("Jan 05, 2024", "Jan 09, 2024").unwrap();
        assert_eq!(average, Decimal::new(20, 0));

        assert!(pool.average_over("Jan 10, 2024", "Jan 01, 2024").is_err());
    }

    #[test]
    fn test_standard_deviation() {
        let pool = TransactionPool::from_transactions(vec![
            tx("a", date(2024, 1, 1), 200),
            tx("b", date(2024, 1, 2), 400),
            tx("c", date(2024, 1, 3), 400),
            tx("d", date(2024, 1, 4), 400),
            tx("e", date(2024, 1, 5), 500),
            tx("f", date(2024, 1, 6), 500),
            tx("g", date(2024, 1, 7), 700),
            tx("h", date(2024, 1, 8), 900),
        ]);
        // Sample variance of 2,4,4,4,5,5,7,9 is 32/7
        let expected = (Decimal::from(32) / Decimal::from(7)).sqrt().unwrap();
        assert!((pool.standard_deviation() - expected).abs() < Decimal::new(1, 12));

        let single = TransactionPool::from_transactions(vec![tx("a", date(2024, 1, 1), 200)]);
        assert_eq!(single.standard_deviation(), Decimal::ZERO);
    }

    #[test]
    fn test_most_and_least_expensive_tie_break() {
        let pool = TransactionPool::from_transactions(vec![
            tx("newest", date(2024, 1, 3), -500),
            tx("middle", date(2024, 1, 2), 100),
            tx("oldest", date(2024, 1, 1), -500),
            tx("older", date(2023, 12, 31), 100),
        ]);
        assert_eq!(pool.least_expensive().unwrap().description(), "oldest");
        assert_eq!(pool.most_expensive().unwrap().description(), "older");
    }

    #[test]
    fn test_most_common_tie_break() {
        let pool = TransactionPool::from_transactions(vec![
            tx("A", date(2024, 1, 2), -100),
            tx("B", date(2024, 1, 1), -100),
        ]);
        assert_eq!(pool.most_common().unwrap().transaction.description(), "B");
    }

    #[test]
    fn test_large_amounts_saturate() {
        let trillion = Decimal::new(1_000_000_000_000_000, 0);
        let pool = TransactionPool::from_transactions(vec![
            Transaction::new("in", date(2024, 1, 2), trillion, false),
            Transaction::new("out", date(2024, 1, 1), -trillion, false),
        ]);
        assert_eq!(pool.balance(), Decimal::ZERO);
        // squared deviations exceed the decimal range and clamp
        assert!(pool.standard_deviation() > Decimal::ZERO);

        let huge = TransactionPool::from_transactions(vec![
            Transaction::new("a", date(2024, 1, 2), Decimal::MAX, false),
            Transaction::new("b", date(2024, 1, 1), Decimal::MAX, false),
        ]);
        assert_eq!(huge.balance(), Decimal::MAX);
        assert_eq!(huge.average_per_week(), Decimal::MAX);
        assert!(huge.standard_deviation() >= Decimal::ZERO);

        let mixed = TransactionPool::from_transactions(vec![
            Transaction::new("a", date(2024, 1, 2), Decimal::MAX, false),
            Transaction::new("b", date(2024, 1, 1), Decimal::MIN, false),
            Transaction::new("c", date(2024, 1, 1), Decimal::MIN, false),
        ]);
        assert_eq!(mixed.balance(), Decimal::MIN);
        assert!(mixed.standard_deviation() > Decimal::ZERO);
    }

    #[test]
    fn test_empty_pool_neutral_values() {
        let pool = TransactionPool::new();
        assert_eq!(pool.balance(), Decimal::ZERO);
        assert_eq!(pool.date_span_days(), 0);
        assert_eq!(pool.date_range(), None);
        assert_eq!(pool.average_transaction_amount(), Decimal::ZERO);
        assert_eq!(pool.average_per_day(), Decimal::ZERO);
        assert_eq!(pool.average_per_week(), Decimal::ZERO);
        assert_eq!(pool.standard_deviation(), Decimal::ZERO);
        assert!(pool.most_expensive().is_none());
        assert!(pool.least_expensive().is_none());
        assert!(pool.most_common().is_none());
        assert!(pool.debits().is_empty());
        assert!(pool.between("Jan 01, 2024", "Jan 31, 2024").unwrap().is_empty());
    }
}
