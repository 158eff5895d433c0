//! Low-level access to the spreadsheet.
//!
//! The `Sheet` trait reads a whole tab, writes ranges and clears ranges. `GoogleSheet` implements it against the Google Sheets API and `TestSheet` implements it
//! in memory so that the whole program can run, top to bottom, without a network.

mod service_account;
mod sheet;
mod sheet_test_client;

use crate::error::{ErrorType, IntoResult, Res};
use crate::{Config, Result};
use tracing::debug;

pub(crate) use service_account::TokenProvider;
pub(crate) use sheet::GoogleSheet;
pub(crate) use sheet_test_client::TestSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::TestSheetState;

/// OAuth scope required for reading and writing spreadsheet values.
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Testing`.
pub const TEST_MODE_ENV: &str = "FINTRACK_IN_TEST_MODE";

/// Whether we talk to a real Google sheet or to the in-memory `TestSheet`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

impl Mode {
    /// Returns `Mode::Testing` if `FINTRACK_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// A block of values to write, starting at the top-left cell of `range`, e.g. `'Transactions'!A5`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct SheetRange {
    pub(crate) range: String,
    pub(crate) values: Vec<Vec<String>>,
}

impl SheetRange {
    pub(crate) fn new(range: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        Self {
            range: range.into(),
            values,
        }
    }
}

/// An abstraction over the handful of spreadsheet calls this program makes.
#[async_trait::async_trait]
pub(crate) trait Sheet: Send {
    /// Returns every non-empty row of the tab, as formatted strings. Trailing empty cells of a
    /// row are not returned, so rows can be shorter than the header row. Fails if the tab does not
    /// exist.
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>>;

    /// Writes each block of values as if typed by a user.
    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()>;

    /// Clears the values in each range.
    async fn clear_ranges(&mut self, ranges: &[String]) -> Res<()>;
}

/// Creates the `Sheet` for `mode`.
///
/// # Errors
/// - `Config` if `mode` is `Google` and no service account credentials are configured.
/// - `StoreUnavailable` if the first access token cannot be obtained.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    match mode {
        Mode::Google => {
            let credentials = config.require_credentials()?.clone();
            debug!(
                "Using Google sheet {} as {}",
                config.spreadsheet_id(),
                credentials.client_email()
            );
            let token_provider = TokenProvider::new(credentials);
            let sheet = GoogleSheet::new(config.spreadsheet_id(), token_provider)
                .await
                .pub_result(ErrorType::StoreUnavailable)?;
            Ok(Box::new(sheet))
        }
        Mode::Testing => {
            debug!("Using in-memory test sheet {}", config.spreadsheet_id());
            Ok(Box::new(TestSheet::new(config.spreadsheet_id())))
        }
    }
}

/// Builds an A1 range on `tab`, e.g. `range("My Tab", "A2:ZZ")` is `'My Tab'!A2:ZZ`.
pub(crate) fn range(tab: &str, cells: &str) -> String {
    format!("'{}'!{cells}", tab.replace('\'', "''"))
}

/// Converts a 0-based column index to its A1 letters, e.g. `0` is `A` and `27` is `AB`.
pub(crate) fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
