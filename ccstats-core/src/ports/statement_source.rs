//! Statement source port
//!
//! Defines the interface for pulling raw statement rows out of an external
//! document (exported HTML statements, test fixtures, etc.)

use crate::domain::result::Result;
use crate::domain::{RawTransaction, Statement};

/// A source of raw statement rows
///
/// Implementations only extract rows; signing amounts, parsing dates and
/// ordering happen when the rows become a [`Statement`].
pub trait StatementSource {
    /// Source name (e.g., "html")
    fn name(&self) -> &str;

    /// Extract every row, authorized rows first
    fn read(&self) -> Result<Vec<RawTransaction>>;

    /// Extract and build a statement in one step
    fn statement(&self) -> Result<Statement> {
        Statement::from_raw(&self.read()?)
    }
}
