//! A `TransactionRepository` kept in one tab of a spreadsheet.

use crate::api::{column_letters, range, Sheet, SheetRange};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::mapping::Mapping;
use crate::model::{Transaction, TransactionUpdates};
use crate::store::TransactionRepository;
use crate::Result;
use tracing::{debug, trace, warn};

/// Stores transactions as rows of the `tab` sheet. The first row holds headers, every other
/// non-blank row is a transaction. See `Mapping` for how columns are found.
pub(crate) struct SheetRepository {
    sheet: Box<dyn Sheet + Send>,
    tab: String,
}

/// The raw rows of the tab together with the header layout. `mapping` is `None` when the tab is
/// completely empty.
struct TabData {
    mapping: Option<Mapping>,
    rows: Vec<Vec<String>>,
}

impl TabData {
    /// Returns the index into `rows` of the transaction with `id`.
    fn find(&self, id: &str) -> Option<(usize, &Mapping)> {
        let mapping = self.mapping.as_ref()?;
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| mapping.id(row) == Some(id))
            .map(|(ix, _)| (ix, mapping))
    }
}

impl SheetRepository {
    pub(crate) fn new(sheet: Box<dyn Sheet + Send>, tab: impl Into<String>) -> Self {
        Self {
            sheet,
            tab: tab.into(),
        }
    }

    async fn load(&mut self) -> Result<TabData> {
        let rows = self
            .sheet
            .get(&self.tab)
            .await
            .pub_result(ErrorType::StoreUnavailable)?;
        trace!("Loaded {} rows from {}", rows.len(), self.tab);
        let mapping = match rows.first() {
            Some(header) => Some(Mapping::new(header).pub_result(ErrorType::StoreUnavailable)?),
            None => None,
        };
        Ok(TabData { mapping, rows })
    }

    /// A range covering the whole width of a row, e.g. `'Transactions'!A7:F7`.
    fn row_range(&self, row_ix: usize, width: usize) -> String {
        let row_number = row_ix + 1;
        let last = column_letters(width.saturating_sub(1));
        range(&self.tab, &format!("A{row_number}:{last}{row_number}"))
    }
}

#[async_trait::async_trait]
impl TransactionRepository for SheetRepository {
    async fn fetch_all(&mut self) -> Result<Vec<Transaction>> {
        let data = self.load().await?;
        let Some(mapping) = data.mapping else {
            debug!("The {} sheet is empty", self.tab);
            return Ok(Vec::new());
        };

        let mut transactions = Vec::with_capacity(data.rows.len().saturating_sub(1));
        for (ix, row) in data.rows.iter().enumerate().skip(1) {
            match mapping.parse_row(ix + 1, row) {
                Ok(Some(transaction)) => transactions.push(transaction),
                Ok(None) => {}
                Err(e) => warn!("Skipping a row of {}: {e:#}", self.tab),
            }
        }

        // Stable, so transactions on the same day keep their sheet order.
        transactions.sort_by(|a, b| b.date().cmp(&a.date()));
        debug!("Fetched {} transactions from {}", transactions.len(), self.tab);
        Ok(transactions)
    }

    async fn create(&mut self, transaction: &Transaction) -> Result<()> {
        let data = self.load().await?;
        let mut writes = Vec::new();
        let mapping = match data.mapping {
            Some(mapping) => mapping,
            None => {
                let mapping = Mapping::default();
                debug!("Writing headers to the empty {} sheet", self.tab);
                writes.push(SheetRange::new(
                    range(&self.tab, "A1"),
                    vec![mapping.headers().to_vec()],
                ));
                mapping
            }
        };

        // Google trims trailing empty rows, so the row after the last one returned is free. On an
        // empty tab that is the row after the headers just written.
        let row_ix = data.rows.len().max(1);
        let row = mapping.to_row(transaction);
        writes.push(SheetRange::new(self.row_range(row_ix, row.len()), vec![row]));

        self.sheet
            .write_ranges(&writes)
            .await
            .pub_result(ErrorType::StoreUnavailable)
    }

    async fn update(&mut self, id: &str, updates: &TransactionUpdates) -> Result<Transaction> {
        let data = self.load().await?;
        let (ix, mapping) = data.find(id).ok_or_else(|| Error::not_found(id))?;
        let existing = &data.rows[ix];

        let mut transaction = mapping
            .parse_row(ix + 1, existing)
            .pub_result(ErrorType::StoreUnavailable)?
            .ok_or_else(|| Error::not_found(id))?;
        updates.apply(&mut transaction);

        let row = mapping.update_row(existing, &transaction, updates);
        let write = SheetRange::new(self.row_range(ix, row.len()), vec![row]);
        self.sheet
            .write_ranges(&[write])
            .await
            .pub_result(ErrorType::StoreUnavailable)?;
        Ok(transaction)
    }

    async fn delete(&mut self, id: &str) -> Result<bool> {
        let data = self.load().await?;
        let Some((ix, _)) = data.find(id) else {
            return Ok(false);
        };

        // Clear everything below the headers and write back the remaining rows.
        let remaining: Vec<Vec<String>> = data
            .rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(i, _)| *i != ix)
            .map(|(_, row)| row.clone())
            .collect();

        self.sheet
            .clear_ranges(&[range(&self.tab, "A2:ZZ")])
            .await
            .pub_result(ErrorType::StoreUnavailable)?;
        if !remaining.is_empty() {
            self.sheet
                .write_ranges(&[SheetRange::new(range(&self.tab, "A2"), remaining)])
                .await
                .pub_result(ErrorType::StoreUnavailable)?;
        }
        Ok(true)
    }
}
