//! Encrypted statement store - statements as field-encrypted JSON documents
//!
//! Document layout:
//! ```json
//! {
//!   "aes-key-length": "256",
//!   "kdf-iterations": "65536",
//!   "transactions": {
//!     "transaction-1": { "date": "<hex>", "description": "<hex>", "amount": "<hex>", "authorized": "<hex>" }
//!   }
//! }
//! ```
//! Every field is its own cipher block with its own salt and IV.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use super::cipher::CipherCodec;
use crate::domain::result::{Error, Result};
use crate::domain::{
    KeyLengthAdvisory, Statement, Transaction, TransactionPool, DEFAULT_KDF_ITERATIONS,
    MAX_KDF_ITERATIONS, MAX_KEY_LENGTH,
};

const KEY_LENGTH_FIELD: &str = "aes-key-length";
const ITERATIONS_FIELD: &str = "kdf-iterations";
const TRANSACTIONS_FIELD: &str = "transactions";
const ENTRY_PREFIX: &str = "transaction-";

const DATE_FIELD: &str = "date";
const DESCRIPTION_FIELD: &str = "description";
const AMOUNT_FIELD: &str = "amount";
const AUTHORIZED_FIELD: &str = "authorized";

/// Encrypted fields per transaction
const FIELDS_PER_TRANSACTION: usize = 4;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Outcome of writing a statement
#[derive(Debug, Clone, Serialize)]
pub struct WriteSummary {
    pub transactions: usize,
    pub key_length: u32,
    pub kdf_iterations: u32,
    /// Present when the configured key length was clamped
    pub advisory: Option<KeyLengthAdvisory>,
}

/// Reads and writes statements as encrypted JSON files
#[derive(Debug, Clone, Default)]
pub struct StatementStore {
    codec: CipherCodec,
}

impl StatementStore {
    pub fn new(codec: CipherCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &CipherCodec {
        &self.codec
    }

    /// Encrypt `statement` into `path`, replacing any existing file
    pub fn write(
        &self,
        path: &Path,
        password: &str,
        statement: &Statement,
    ) -> Result<WriteSummary> {
        self.write_with_progress(path, password, statement, |_, _| {})
    }

    /// Like [`StatementStore::write`], reporting `(fields_done, fields_total)`
    pub fn write_with_progress<F>(
        &self,
        path: &Path,
        password: &str,
        statement: &Statement,
        progress: F,
    ) -> Result<WriteSummary>
    where
        F: FnMut(usize, usize),
    {
        // Encrypt everything before touching the destination
        let document = self.to_document(password, statement, progress)?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &document)?;
        writer.flush()?;

        Ok(WriteSummary {
            transactions: statement.len(),
            key_length: self.codec.key_length().bits(),
            kdf_iterations: self.codec.iterations(),
            advisory: self.codec.advisory(),
        })
    }

    /// Decrypt the statement stored at `path`
    pub fn read(&self, path: &Path, password: &str) -> Result<Statement> {
        self.read_with_progress(path, password, |_, _| {})
    }

    /// Like [`StatementStore::read`], reporting `(fields_done, fields_total)`
    pub fn read_with_progress<F>(
        &self,
        path: &Path,
        password: &str,
        progress: F,
    ) -> Result<Statement>
    where
        F: FnMut(usize, usize),
    {
        let file = File::open(path)?;
        let document: Value = serde_json::from_reader(BufReader::new(file))?;
        Self::from_document(password, &document, progress)
    }

    /// Build the encrypted JSON document for `statement`
    pub fn to_document<F>(
        &self,
        password: &str,
        statement: &Statement,
        mut progress: F,
    ) -> Result<Value>
    where
        F: FnMut(usize, usize),
    {
        let total = statement.len() * FIELDS_PER_TRANSACTION;
        let mut done = 0;
        let mut entries = Map::new();

        for (index, transaction) in statement.transactions().iter().enumerate() {
            let fields = [
                (DATE_FIELD, transaction.date().format(ISO_DATE_FORMAT).to_string()),
                (DESCRIPTION_FIELD, transaction.description().to_string()),
                (AMOUNT_FIELD, transaction.amount().to_string()),
                (AUTHORIZED_FIELD, transaction.is_authorized().to_string()),
            ];

            let mut entry = Map::new();
            for (name, plaintext) in fields {
                entry.insert(
                    name.to_string(),
                    Value::String(self.codec.encrypt_str(password, &plaintext)?),
                );
                done += 1;
                progress(done, total);
            }
            entries.insert(format!("{}{}", ENTRY_PREFIX, index + 1), Value::Object(entry));
        }

        let mut document = Map::new();
        document.insert(
            KEY_LENGTH_FIELD.to_string(),
            Value::String(self.codec.key_length().bits().to_string()),
        );
        document.insert(
            ITERATIONS_FIELD.to_string(),
            Value::String(self.codec.iterations().to_string()),
        );
        document.insert(TRANSACTIONS_FIELD.to_string(), Value::Object(entries));
        Ok(Value::Object(document))
    }

    /// Decrypt a document produced by [`StatementStore::to_document`]
    pub fn from_document<F>(password: &str, document: &Value, mut progress: F) -> Result<Statement>
    where
        F: FnMut(usize, usize),
    {
        let root = document
            .as_object()
            .ok_or_else(|| Error::format("top level is not an object"))?;

        let key_length = read_number(root, KEY_LENGTH_FIELD)?
            .ok_or_else(|| Error::format(format!("missing '{}'", KEY_LENGTH_FIELD)))?;
        let iterations = read_number(root, ITERATIONS_FIELD)?.unwrap_or(DEFAULT_KDF_ITERATIONS);
        if iterations > MAX_KDF_ITERATIONS {
            return Err(Error::format(format!(
                "'{}' is {}, above the limit of {}",
                ITERATIONS_FIELD, iterations, MAX_KDF_ITERATIONS
            )));
        }
        let codec = CipherCodec::with_policy(key_length, MAX_KEY_LENGTH, iterations)?;

        let entries = root
            .get(TRANSACTIONS_FIELD)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::format(format!("missing '{}' object", TRANSACTIONS_FIELD)))?;

        // Map order is not insertion order; restore it from the entry numbers
        let mut ordered = entries
            .iter()
            .map(|(name, entry)| Ok((entry_number(name)?, name.as_str(), entry)))
            .collect::<Result<Vec<_>>>()?;
        ordered.sort_by_key(|(number, _, _)| *number);

        let total = ordered.len() * FIELDS_PER_TRANSACTION;
        let mut done = 0;
        let mut pool = TransactionPool::new();

        for (_, name, entry) in ordered {
            let mut field = |key: &str| -> Result<String> {
                let block = entry
                    .get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::format(format!("'{}' has no '{}' field", name, key)))?;
                let plaintext = codec.decrypt_str(password, block)?;
                done += 1;
                progress(done, total);
                Ok(plaintext)
            };

            let date = field(DATE_FIELD)?;
            let description = field(DESCRIPTION_FIELD)?;
            let amount = field(AMOUNT_FIELD)?;
            let authorized = field(AUTHORIZED_FIELD)?;

            pool.insert(decode_transaction(&date, &description, &amount, &authorized)?);
        }

        Ok(Statement::from_pool(pool))
    }
}

/// Numeric header field, written as a string but tolerated as a number
fn read_number(root: &Map<String, Value>, field: &str) -> Result<Option<u32>> {
    let parsed = match root.get(field) {
        None => return Ok(None),
        Some(Value::String(text)) => text.trim().parse::<u32>().ok(),
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(_) => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| Error::format(format!("'{}' is not a positive integer", field)))
}

fn entry_number(name: &str) -> Result<usize> {
    name.strip_prefix(ENTRY_PREFIX)
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| Error::format(format!("unexpected transaction key '{}'", name)))
}

fn decode_transaction(
    date: &str,
    description: &str,
    amount: &str,
    authorized: &str,
) -> Result<Transaction> {
    let date = NaiveDate::parse_from_str(date, ISO_DATE_FORMAT).map_err(|source| Error::DateParse {
        input: date.to_string(),
        source,
    })?;
    let amount = Decimal::from_str(amount).map_err(|_| Error::Amount(amount.to_string()))?;
    let authorized = authorized
        .parse::<bool>()
        .map_err(|_| Error::format(format!("invalid authorization flag '{}'", authorized)))?;
    Ok(Transaction::new(description, date, amount, authorized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::domain::RawTransaction;

    fn fast_store() -> StatementStore {
        StatementStore::new(CipherCodec::with_policy(256, 256, 500).unwrap())
    }

    fn raw(
        description: &str,
        date: &str,
        cents: i64,
        debit: bool,
        authorized: bool,
    ) -> RawTransaction {
        RawTransaction {
            description: description.to_string(),
            date: date.to_string(),
            amount: Decimal::new(cents, 2),
            is_debit: debit,
            is_authorized: authorized,
        }
    }

    fn sample() -> Statement {
        Statement::from_raw(&[
            raw("Coffee", "Jan 10, 2024", 500, true, true),
            raw("Bakery", "Jan 10, 2024", 350, true, false),
            raw("Payment", "Jan 05, 2024", 10000, false, false),
        ])
        .unwrap()
    }

    fn snapshot(statement: &Statement) -> Vec<(String, NaiveDate, Decimal, bool)> {
        statement
            .transactions()
            .iter()
            .map(|t| (t.description().to_string(), t.date(), t.amount(), t.is_authorized()))
            .collect()
    }

    #[test]
    fn test_document_shape() {
        let store = fast_store();
        let document = store.to_document("pw", &sample(), |_, _| {}).unwrap();

        assert_eq!(document[KEY_LENGTH_FIELD], "256");
        assert_eq!(document[ITERATIONS_FIELD], "500");
        let entries = document[TRANSACTIONS_FIELD].as_object().unwrap();
        assert_eq!(entries.len(), 3);
        for n in 1..=3 {
            let entry = &entries[&format!("transaction-{}", n)];
            for field in [DATE_FIELD, DESCRIPTION_FIELD, AMOUNT_FIELD, AUTHORIZED_FIELD] {
                let block = entry[field].as_str().unwrap();
                assert!(block.chars().all(|c| c.is_ascii_hexdigit()));
            }
        }
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("statement.json");
        let store = fast_store();
        let statement = sample();

        let summary = store.write(&path, "pw", &statement).unwrap();
        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.key_length, 256);
        assert!(summary.advisory.is_none());

        let restored = store.read(&path, "pw").unwrap();
        assert_eq!(snapshot(&restored), snapshot(&statement));
        assert_eq!(restored.authorized().len(), 1);
    }

    #[test]
    fn test_wrong_password_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("statement.json");
        let store = fast_store();
        store.write(&path, "pw", &sample()).unwrap();

        let err = store.read(&path, "not the password").unwrap_err();
        assert!(err.is_decryption());
    }

    #[test]
    fn test_excessive_iterations_rejected() {
        let store = fast_store();
        let mut document = store.to_document("pw", &sample(), |_, _| {}).unwrap();
        document[ITERATIONS_FIELD] = Value::String(u32::MAX.to_string());

        let err = StatementStore::from_document("pw", &document, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        document[ITERATIONS_FIELD] = Value::String(MAX_KDF_ITERATIONS.to_string());
        // at the limit the header is accepted; the blocks were made with 500
        let err = StatementStore::from_document("pw", &document, |_, _| {}).unwrap_err();
        assert!(err.is_decryption());
    }

    #[test]
    fn test_entries_read_in_numeric_order() {
        // Twelve same-day transactions: "transaction-10" sorts before "-2" as text
        let raws: Vec<RawTransaction> = (0..12)
            .map(|i| raw(&format!("item {}", i), "Mar 03, 2024", 100 + i, true, false))
            .collect();
        let statement = Statement::from_raw(&raws).unwrap();

        let store = fast_store();
        let document = store.to_document("pw", &statement, |_, _| {}).unwrap();
        let restored = StatementStore::from_document("pw", &document, |_, _| {}).unwrap();
        assert_eq!(snapshot(&restored), snapshot(&statement));
    }

    #[test]
    fn test_progress_reports_every_field() {
        let store = fast_store();
        let mut calls = Vec::new();
        let document = store
            .to_document("pw", &sample(), |done, total| calls.push((done, total)))
            .unwrap();
        assert_eq!(calls.len(), 12);
        assert_eq!(calls.last(), Some(&(12, 12)));

        let mut read_calls = 0;
        StatementStore::from_document("pw", &document, |_, _| read_calls += 1).unwrap();
        assert_eq!(read_calls, 12);
    }

    #[test]
    fn test_missing_fields_fail() {
        let store = fast_store();
        let mut document = store.to_document("pw", &sample(), |_, _| {}).unwrap();
        document
            .get_mut(TRANSACTIONS_FIELD)
            .and_then(|t| t.get_mut("transaction-2"))
            .and_then(Value::as_object_mut)
            .unwrap()
            .remove(AMOUNT_FIELD);

        let err = StatementStore::from_document("pw", &document, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let no_length = serde_json::json!({ "transactions": {} });
        assert!(StatementStore::from_document("pw", &no_length, |_, _| {}).is_err());

        let bad_key =
            serde_json::json!({ "aes-key-length": "256", "transactions": { "tx-1": {} } });
        assert!(StatementStore::from_document("pw", &bad_key, |_, _| {}).is_err());
    }

    #[test]
    fn test_missing_iterations_defaults() {
        let document = serde_json::json!({ "aes-key-length": "128", "transactions": {} });
        let statement = StatementStore::from_document("pw", &document, |_, _| {}).unwrap();
        assert!(statement.is_empty());
    }

    #[test]
    fn test_malformed_json_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(fast_store().read(&path, "pw"), Err(Error::Json(_))));
    }
}
