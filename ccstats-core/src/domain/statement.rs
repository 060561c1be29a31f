//! Statement - a transaction pool split into authorized and posted views

use rust_decimal::Decimal;

use super::pool::{total, TransactionPool};
use super::result::Result;
use super::transaction::{RawTransaction, Transaction};

/// A credit card statement.
///
/// Owns a single pool; the authorized and posted partitions are derived from
/// it on every call, so they always reflect the current contents.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    pool: TransactionPool,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from extractor tuples. Fails on the first malformed date.
    pub fn from_raw(raw: &[RawTransaction]) -> Result<Self> {
        let transactions = raw
            .iter()
            .map(Transaction::from_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_pool(TransactionPool::from_transactions(transactions)))
    }

    pub fn from_pool(pool: TransactionPool) -> Self {
        Self { pool }
    }

    /// Rebuild a statement from pre-split pools
    pub fn from_partitions(authorized: TransactionPool, posted: TransactionPool) -> Self {
        let mut pool = authorized;
        pool.insert_all(posted.into_vec());
        Self { pool }
    }

    /// The full, date ordered pool
    pub fn transactions(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn authorized(&self) -> TransactionPool {
        self.pool.iter().filter(|t| t.is_authorized()).cloned().collect()
    }

    pub fn posted(&self) -> TransactionPool {
        self.pool.iter().filter(|t| !t.is_authorized()).cloned().collect()
    }

    pub fn authorized_balance(&self) -> Decimal {
        total(self.pool.iter().filter(|t| t.is_authorized()).map(Transaction::amount))
    }

    pub fn posted_balance(&self) -> Decimal {
        total(self.pool.iter().filter(|t| !t.is_authorized()).map(Transaction::amount))
    }

    /// Append every transaction of `other`. No deduplication: merging the
    /// same statement twice doubles its transactions.
    pub fn merge(&mut self, other: &Statement) {
        self.pool.insert_all(other.pool.iter().cloned());
    }

    pub fn remove_by_keyword(&mut self, keyword: &str) -> bool {
        self.pool.remove_by_keyword(keyword)
    }

    pub fn remove_equivalent(&mut self, transaction: &Transaction) -> usize {
        self.pool.remove_equivalent(transaction)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn into_pool(self) -> TransactionPool {
        self.pool
    }
}

impl From<TransactionPool> for Statement {
    fn from(pool: TransactionPool) -> Self {
        Self::from_pool(pool)
    }
}
