//! HTML statement extractor
//!
//! Reads the tables of an exported credit card statement page. The first
//! table is the account header and is skipped. With two or more tables left
//! the first holds authorized rows and the second posted rows; a lone table
//! holds posted rows. Every table starts with a column header row.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use crate::domain::result::{Error, Result};
use crate::domain::RawTransaction;
use crate::ports::StatementSource;

const DESCRIPTION_CELL: usize = 0;
const DEBIT_CELL: usize = 1;
const CREDIT_CELL: usize = 2;

/// A statement page on disk
#[derive(Debug, Clone)]
pub struct HtmlStatementSource {
    path: PathBuf,
}

impl HtmlStatementSource {
    /// The path must exist and end in `.html` or `.htm`
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::validation(format!(
                "statement file does not exist: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !matches!(extension.as_deref(), Some("html") | Some("htm")) {
            return Err(Error::validation(format!(
                "statement file must be .html or .htm: {}",
                path.display()
            )));
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatementSource for HtmlStatementSource {
    fn name(&self) -> &str {
        "html"
    }

    fn read(&self) -> Result<Vec<RawTransaction>> {
        let html = fs::read_to_string(&self.path)?;
        parse_html(&html)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::statement(format!("bad selector '{}': {}", css, e)))
}

/// Extract raw rows from statement HTML, authorized rows first
pub fn parse_html(html: &str) -> Result<Vec<RawTransaction>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let tables: Vec<ElementRef> = document.select(&table_sel).collect();

    if tables.is_empty() {
        return Err(Error::statement("no tables found in statement"));
    }

    let extractor = RowExtractor::new()?;
    let ledgers = &tables[1..];
    let mut rows = Vec::new();
    match ledgers {
        [authorized, posted, ..] => {
            rows.extend(extractor.extract(authorized, true)?);
            rows.extend(extractor.extract(posted, false)?);
        }
        [posted] => rows.extend(extractor.extract(posted, false)?),
        [] => {}
    }
    Ok(rows)
}

struct RowExtractor {
    row: Selector,
    header_cell: Selector,
    data_cell: Selector,
    amount_noise: Regex,
}

impl RowExtractor {
    fn new() -> Result<Self> {
        Ok(Self {
            row: selector("tr")?,
            header_cell: selector("th")?,
            data_cell: selector("td")?,
            amount_noise: Regex::new(r"[$,\s]")
                .map_err(|e| Error::statement(format!("bad amount pattern: {}", e)))?,
        })
    }

    fn extract(&self, table: &ElementRef, authorized: bool) -> Result<Vec<RawTransaction>> {
        // first row holds the column titles
        table
            .select(&self.row)
            .skip(1)
            .enumerate()
            .map(|(index, row)| self.extract_row(&row, authorized, index + 1))
            .collect()
    }

    fn extract_row(
        &self,
        row: &ElementRef,
        authorized: bool,
        number: usize,
    ) -> Result<RawTransaction> {
        let date = row
            .select(&self.header_cell)
            .next()
            .map(|cell| cell_text(&cell))
            .ok_or_else(|| Error::statement(format!("row {} has no date cell", number)))?;

        let cells: Vec<ElementRef> = row.select(&self.data_cell).collect();
        if cells.len() <= CREDIT_CELL {
            return Err(Error::statement(format!(
                "row {} has {} cells, expected 3",
                number,
                cells.len()
            )));
        }

        let debit = &cells[DEBIT_CELL];
        let debit_text = cell_text(debit);
        let is_debit = !has_child_elements(debit) && !debit_text.is_empty();
        let amount_text = if is_debit {
            debit_text
        } else {
            cell_text(&cells[CREDIT_CELL])
        };

        Ok(RawTransaction {
            description: cell_text(&cells[DESCRIPTION_CELL]),
            date,
            amount: self.parse_amount(&amount_text)?,
            is_debit,
            is_authorized: authorized,
        })
    }

    fn parse_amount(&self, text: &str) -> Result<Decimal> {
        let cleaned = self.amount_noise.replace_all(text, "");
        Decimal::from_str(&cleaned).map_err(|_| Error::Amount(text.to_string()))
    }
}

/// Cell text with line breaks and runs of whitespace collapsed
fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_child_elements(cell: &ElementRef) -> bool {
    cell.children().any(|child| child.value().is_element())
}
