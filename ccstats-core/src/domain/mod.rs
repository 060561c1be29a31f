//! Core domain entities
//!
//! Transactions, the sorted transaction pool and statements, plus the
//! encryption value types. Pure data structures with their invariants -
//! no I/O here.

mod encryption;
mod pool;
mod statement;
mod transaction;
pub mod result;

pub use encryption::{
    resolve_key_length, CipherBlock, KeyLength, KeyLengthAdvisory, BLOCK_LEN,
    DEFAULT_KDF_ITERATIONS, DEFAULT_KEY_LENGTH, IV_LEN, MAX_KDF_ITERATIONS, MAX_KEY_LENGTH,
    SALT_LEN,
};
pub use pool::{Frequency, TransactionPool};
pub use statement::Statement;
pub use transaction::{
    parse_statement_date, RawTransaction, Transaction, TransactionKind, TransactionStatus,
    STATEMENT_DATE_FORMAT,
};
