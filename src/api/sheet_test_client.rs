//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `FINTRACK_IN_TEST_MODE`).
//!
//! State is kept in a process-wide map keyed by spreadsheet id. Every `TestSheet` created for the
//! same id sees the same data, the way two clients of one Google sheet would.

use crate::api::{Sheet, SheetRange};
use crate::config::DEFAULT_SHEET_NAME;
use crate::error::Res;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tracing::trace;

static STATES: LazyLock<Mutex<HashMap<String, TestSheetState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn states() -> MutexGuard<'static, HashMap<String, TestSheetState>> {
    // A test that panicked while holding the lock leaves usable data behind.
    STATES.lock().unwrap_or_else(|e| e.into_inner())
}

/// The contents of one fake spreadsheet: tab name to rows.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct TestSheetState {
    pub(crate) tabs: HashMap<String, Vec<Vec<String>>>,
}

impl TestSheetState {
    /// A spreadsheet with one `Transactions` tab holding the seed data.
    pub(crate) fn seeded() -> Self {
        let mut tabs = HashMap::new();
        // The seed is a constant in this file, a parse failure is a programming error caught by
        // the tests below.
        let rows = load_csv(TRANSACTION_DATA).unwrap_or_default();
        tabs.insert(DEFAULT_SHEET_NAME.to_string(), rows);
        Self { tabs }
    }

    #[cfg(test)]
    /// A spreadsheet with a single tab named `tab` that has no rows at all.
    pub(crate) fn with_empty_tab(tab: &str) -> Self {
        let mut tabs = HashMap::new();
        tabs.insert(tab.to_string(), Vec::new());
        Self { tabs }
    }

    #[cfg(test)]
    /// The rows of `tab` the way Google returns them: trailing blank cells and rows removed.
    pub(crate) fn rows(&self, tab: &str) -> Option<Vec<Vec<String>>> {
        self.tabs.get(tab).map(|rows| trimmed(rows))
    }
}

/// An implementation of the `Sheet` trait that does not use Google sheets.
#[derive(Debug, Clone)]
pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    /// Creates a `TestSheet` for `spreadsheet_id`. The first time an id is seen its state is
    /// seeded with `TestSheetState::seeded`.
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        let spreadsheet_id = spreadsheet_id.into();
        states()
            .entry(spreadsheet_id.clone())
            .or_insert_with(TestSheetState::seeded);
        Self { spreadsheet_id }
    }

    #[cfg(test)]
    pub(crate) fn get_state(&self) -> TestSheetState {
        states()
            .get(&self.spreadsheet_id)
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, state: TestSheetState) {
        states().insert(self.spreadsheet_id.clone(), state);
    }

    fn with_tab<T>(
        &self,
        tab: &str,
        f: impl FnOnce(&mut Vec<Vec<String>>) -> Res<T>,
    ) -> Res<T> {
        let mut states = states();
        let rows = states
            .get_mut(&self.spreadsheet_id)
            .and_then(|s| s.tabs.get_mut(tab))
            .with_context(|| format!("Unable to parse range: sheet '{tab}' not found"))?;
        f(rows)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>> {
        trace!("get for {sheet_name}");
        self.with_tab(sheet_name, |rows| Ok(trimmed(rows)))
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()> {
        for sheet_range in data {
            trace!("write {} rows at {}", sheet_range.values.len(), sheet_range.range);
            let a1 = A1Range::parse(&sheet_range.range)?;
            self.with_tab(&a1.tab, |rows| {
                for (i, values) in sheet_range.values.iter().enumerate() {
                    let r = a1.start.row + i;
                    if rows.len() <= r {
                        rows.resize(r + 1, Vec::new());
                    }
                    let row = &mut rows[r];
                    for (j, value) in values.iter().enumerate() {
                        let c = a1.start.col + j;
                        if row.len() <= c {
                            row.resize(c + 1, String::new());
                        }
                        row[c] = value.clone();
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    async fn clear_ranges(&mut self, ranges: &[String]) -> Res<()> {
        for range in ranges {
            trace!("clear {range}");
            let a1 = A1Range::parse(range)?;
            self.with_tab(&a1.tab, |rows| {
                let last_row = a1.end.and_then(|e| e.row_bound).unwrap_or(usize::MAX);
                let last_col = a1.end.map(|e| e.col).unwrap_or(a1.start.col);
                for (r, row) in rows.iter_mut().enumerate() {
                    if r < a1.start.row || r > last_row {
                        continue;
                    }
                    for (c, cell) in row.iter_mut().enumerate() {
                        if c >= a1.start.col && c <= last_col {
                            cell.clear();
                        }
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Removes trailing blank cells from each row and trailing empty rows from the tab.
fn trimmed(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let len = row.iter().rposition(|c| !c.is_empty()).map_or(0, |ix| ix + 1);
            row[..len].to_vec()
        })
        .collect();
    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    rows
}

/// A 0-based cell reference. `row_bound` is `None` for whole-column references like `ZZ`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct Cell {
    row: usize,
    row_bound: Option<usize>,
    col: usize,
}

/// The subset of A1 notation this program produces: `'Tab'!A5`, `'Tab'!A2:ZZ`, `Tab!A1:F10`.
#[derive(Debug, Clone, Eq, PartialEq)]
struct A1Range {
    tab: String,
    start: Cell,
    end: Option<Cell>,
}

impl A1Range {
    fn parse(range: &str) -> Res<Self> {
        let (tab, cells) = range
            .rsplit_once('!')
            .with_context(|| format!("Unable to parse range '{range}'"))?;
        let tab = match tab.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
            Some(quoted) => quoted.replace("''", "'"),
            None => tab.to_string(),
        };
        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (parse_cell(start)?, Some(parse_cell(end)?)),
            None => (parse_cell(cells)?, None),
        };
        Ok(Self { tab, start, end })
    }
}

fn parse_cell(cell: &str) -> Res<Cell> {
    let split = cell
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        bail!("Unable to parse cell '{cell}'");
    }
    let col = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A') as usize + 1)
        - 1;
    let row_bound = if digits.is_empty() {
        None
    } else {
        let row: usize = digits
            .parse()
            .with_context(|| format!("Unable to parse cell '{cell}'"))?;
        if row == 0 {
            bail!("Unable to parse cell '{cell}'");
        }
        Some(row - 1)
    };
    Ok(Cell {
        row: row_bound.unwrap_or(0),
        row_bound,
        col,
    })
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed transaction data. The columns are deliberately out of the default order and include a
/// `notes` column that this program does not know about.
const TRANSACTION_DATA: &str = r##"date,description,notes,category,amount,type,id
2025-10-01,Paycheck,,Salary,3000.00,INCOME,tx-001
2025-10-03,October rent,autopay,Rent,"$1,200.00",EXPENSE,tx-002
2025-10-05,Whole Foods,,Groceries,87.43,EXPENSE,tx-003
10/12/2025,Chipotle,lunch with Sam,Dining,14.85,EXPENSE,tx-004
2025-09-01,Paycheck,,Salary,3000.00,INCOME,tx-005
2025-09-02,September rent,autopay,Rent,1200.00,EXPENSE,tx-006
2025-09-15,Trader Joe's,,Groceries,63.21,EXPENSE,tx-007
2025-08-20,PG&E,,Utilities,142.67,EXPENSE,tx-008
2025-07-04,Logo design,invoice 17,Freelance,450.00,INCOME,tx-009
2025-04-10,Costco,,Groceries,118.56,EXPENSE,tx-010
2025-10-15,Blue Bottle,,Dining,8.50,EXPENSE,tx-011
2025-10-18,Returned shoes,,Refund,60.00,INCOME,tx-012
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_sheet() -> TestSheet {
        TestSheet::new(Uuid::new_v4().to_string())
    }

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_seed_data_parses() {
        let rows = load_csv(TRANSACTION_DATA).unwrap();
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[2][4], "$1,200.00");
        assert!(rows.iter().all(|r| r.len() == 7));
    }

    #[tokio::test]
    async fn test_get_seeded_and_missing_tab() {
        let mut sheet = new_sheet();
        let rows = sheet.get(DEFAULT_SHEET_NAME).await.unwrap();
        assert_eq!(rows[0][6], "id");
        assert!(sheet.get("Nope").await.is_err());
    }

    #[tokio::test]
    async fn test_instances_share_state() {
        let id = Uuid::new_v4().to_string();
        let mut a = TestSheet::new(&id);
        let mut b = TestSheet::new(&id);
        a.write_ranges(&[SheetRange::new(
            "'Transactions'!A20",
            strings(&[&["x", "y"]]),
        )])
        .await
        .unwrap();
        let rows = b.get(DEFAULT_SHEET_NAME).await.unwrap();
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[19], vec!["x", "y"]);
        // The gap between the seed data and row 20 comes back as empty rows.
        assert!(rows[13].is_empty());
    }

    #[tokio::test]
    async fn test_write_then_clear() {
        let mut sheet = new_sheet();
        sheet.set_state(TestSheetState::with_empty_tab("My 'Tab'"));
        sheet
            .write_ranges(&[SheetRange::new(
                "'My ''Tab'''!A1",
                strings(&[&["h1", "h2", "h3"], &["a", "b", "c"], &["d", "e", "f"]]),
            )])
            .await
            .unwrap();

        sheet
            .clear_ranges(&["'My ''Tab'''!A2:ZZ".to_string()])
            .await
            .unwrap();
        let rows = sheet.get("My 'Tab'").await.unwrap();
        assert_eq!(rows, strings(&[&["h1", "h2", "h3"]]));
    }

    #[tokio::test]
    async fn test_clear_bounded_range() {
        let mut sheet = new_sheet();
        sheet.set_state(TestSheetState::with_empty_tab("T"));
        sheet
            .write_ranges(&[SheetRange::new(
                "T!A1",
                strings(&[&["a", "b", "c"], &["d", "e", "f"]]),
            )])
            .await
            .unwrap();
        sheet.clear_ranges(&["T!B1:B1".to_string()]).await.unwrap();
        let rows = sheet.get("T").await.unwrap();
        assert_eq!(rows, strings(&[&["a", "", "c"], &["d", "e", "f"]]));
    }

    #[test]
    fn test_parse_range() {
        let a1 = A1Range::parse("'Transactions'!B3:ZZ").unwrap();
        assert_eq!(a1.tab, "Transactions");
        assert_eq!(a1.start.row, 2);
        assert_eq!(a1.start.col, 1);
        let end = a1.end.unwrap();
        assert_eq!(end.row_bound, None);
        assert_eq!(end.col, 701);

        assert!(A1Range::parse("no-bang").is_err());
        assert!(A1Range::parse("T!3").is_err());
        assert!(A1Range::parse("T!A0").is_err());
    }
}
