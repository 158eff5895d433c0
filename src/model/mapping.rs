//! Maps between the rows of the Transactions tab and `Transaction` values.
//!
//! The first row of the tab holds the headers. Columns are found by header name, so users can
//! reorder columns or add their own (e.g. a `notes` column) without breaking anything. Unknown
//! columns are ignored on read and left untouched when a row is rewritten.

use crate::error::Res;
use crate::model::transaction::parse_date;
use crate::model::{Amount, Transaction, TransactionType, TransactionUpdates};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The columns this program reads and writes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TransactionColumn {
    Id,
    Amount,
    Category,
    Description,
    Date,
    Type,
}

serde_plain::derive_display_from_serialize!(TransactionColumn);
serde_plain::derive_fromstr_from_deserialize!(TransactionColumn);

impl TransactionColumn {
    pub(crate) const ALL: [TransactionColumn; 6] = [
        TransactionColumn::Id,
        TransactionColumn::Amount,
        TransactionColumn::Category,
        TransactionColumn::Description,
        TransactionColumn::Date,
        TransactionColumn::Type,
    ];

    /// Header matching is forgiving about case and surrounding whitespace.
    fn from_header(header: &str) -> Option<Self> {
        TransactionColumn::from_str(&header.trim().to_ascii_lowercase()).ok()
    }
}

/// The header layout of a Transactions tab.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Mapping {
    headers: Vec<String>,
    columns: Vec<Option<TransactionColumn>>,
}

impl Default for Mapping {
    /// The layout written to a brand-new, empty tab.
    fn default() -> Self {
        Self {
            headers: TransactionColumn::ALL.iter().map(|c| c.to_string()).collect(),
            columns: TransactionColumn::ALL.iter().copied().map(Some).collect(),
        }
    }
}

impl Mapping {
    /// Creates a `Mapping` from the header row. Every known column must be present exactly once.
    pub(crate) fn new<S: AsRef<str>>(header_row: &[S]) -> Res<Self> {
        let headers: Vec<String> = header_row.iter().map(|h| h.as_ref().to_string()).collect();
        let columns: Vec<Option<TransactionColumn>> = headers
            .iter()
            .map(|h| TransactionColumn::from_header(h))
            .collect();

        for column in TransactionColumn::ALL {
            match columns.iter().filter(|c| **c == Some(column)).count() {
                0 => bail!("The header row is missing the '{column}' column"),
                1 => {}
                _ => bail!("The header row has more than one '{column}' column"),
            }
        }

        Ok(Self { headers, columns })
    }

    pub(crate) fn headers(&self) -> &[String] {
        &self.headers
    }

    fn index_of(&self, column: TransactionColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == Some(column))
    }

    /// Returns the raw id cell of a row, if the row is long enough to have one.
    pub(crate) fn id<'a, S: AsRef<str>>(&self, row: &'a [S]) -> Option<&'a str> {
        self.index_of(TransactionColumn::Id)
            .and_then(|ix| row.get(ix))
            .map(|s| s.as_ref().trim())
    }

    /// Parses a data row. `row_number` is the 1-based row number in the sheet and is only used in
    /// error messages. Returns `None` for a row whose cells are all blank.
    pub(crate) fn parse_row<S: AsRef<str>>(
        &self,
        row_number: usize,
        row: &[S],
    ) -> Res<Option<Transaction>> {
        if row.iter().all(|cell| cell.as_ref().trim().is_empty()) {
            return Ok(None);
        }
        let mut transaction = Transaction::default();
        for (ix, column) in self.columns.iter().enumerate() {
            let Some(column) = column else { continue };
            let value = row.get(ix).map(|s| s.as_ref()).unwrap_or_default();
            set_field(&mut transaction, *column, value)
                .with_context(|| format!("Unable to parse row {row_number}"))?;
        }
        Ok(Some(transaction))
    }

    /// Renders `transaction` as a row in header order. Unknown columns are left blank.
    pub(crate) fn to_row(&self, transaction: &Transaction) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column {
                Some(column) => get_field(transaction, *column),
                None => String::new(),
            })
            .collect()
    }

    /// Renders `transaction` over an existing row. Only the columns named in `updates` are
    /// rewritten; every other cell, including those of unknown columns, keeps its text.
    pub(crate) fn update_row<S: AsRef<str>>(
        &self,
        existing: &[S],
        transaction: &Transaction,
        updates: &TransactionUpdates,
    ) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(ix, column)| match column {
                Some(column) if is_updated(updates, *column) => get_field(transaction, *column),
                _ => existing
                    .get(ix)
                    .map(|s| s.as_ref().to_string())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

fn set_field(transaction: &mut Transaction, column: TransactionColumn, value: &str) -> Res<()> {
    match column {
        TransactionColumn::Id => transaction.id = value.trim().to_string(),
        TransactionColumn::Amount => {
            transaction.amount = Amount::from_str(value)
                .with_context(|| format!("Invalid amount '{value}'"))?
        }
        TransactionColumn::Category => transaction.category = value.to_string(),
        TransactionColumn::Description => transaction.description = value.to_string(),
        TransactionColumn::Date => transaction.date = parse_date(value)?,
        TransactionColumn::Type => transaction.transaction_type = TransactionType::from_str(value)?,
    }
    Ok(())
}

fn is_updated(updates: &TransactionUpdates, column: TransactionColumn) -> bool {
    match column {
        TransactionColumn::Id => false,
        TransactionColumn::Amount => updates.amount.is_some(),
        TransactionColumn::Category => updates.category.is_some(),
        TransactionColumn::Description => updates.description.is_some(),
        TransactionColumn::Date => updates.date.is_some(),
        TransactionColumn::Type => updates.transaction_type.is_some(),
    }
}

fn get_field(transaction: &Transaction, column: TransactionColumn) -> String {
    match column {
        TransactionColumn::Id => transaction.id.clone(),
        TransactionColumn::Amount => transaction.amount.to_cell(),
        TransactionColumn::Category => transaction.category.clone(),
        TransactionColumn::Description => transaction.description.clone(),
        TransactionColumn::Date => transaction.date.format("%Y-%m-%d").to_string(),
        TransactionColumn::Type => transaction.transaction_type.to_string(),
    }
}
