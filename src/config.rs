//! Runtime configuration for fintrack.
//!
//! Everything is read from command line arguments or their environment variable fallbacks (see
//! `args::Common`), which in turn may come from a `.env` file. The values are validated once into
//! an immutable `Config` that the rest of the program borrows or clones.

use crate::args::Common;
use crate::error::{ErrorType, IntoResult, Res};
use crate::Result;
use anyhow::{bail, Context};
use std::fmt::{Debug, Formatter};
use std::time::Duration;
use url::Url;

/// The tab that holds transactions unless `FINTRACK_SHEET_NAME` says otherwise.
pub const DEFAULT_SHEET_NAME: &str = "Transactions";

/// The validated configuration of the app.
#[derive(Debug, Clone)]
pub struct Config {
    spreadsheet_id: String,
    sheet_name: String,
    cache_ttl: Duration,
    credentials: Option<Credentials>,
}

impl Config {
    /// Creates a `Config`.
    ///
    /// # Arguments
    /// - `spreadsheet` - Either the bare spreadsheet id or the URL of the sheet, e.g.
    ///   `https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX/edit`
    /// - `sheet_name` - The name of the tab holding transactions.
    /// - `cache_ttl` - How long cached reads stay valid.
    /// - `credentials` - Service account credentials. Only needed when talking to Google.
    ///
    /// # Errors
    /// - Returns a `Config` error if the spreadsheet id or the sheet name is unusable.
    pub fn new(
        spreadsheet: &str,
        sheet_name: impl Into<String>,
        cache_ttl: Duration,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let spreadsheet_id = extract_spreadsheet_id(spreadsheet).pub_result(ErrorType::Config)?;
        let sheet_name = sheet_name.into();
        if sheet_name.trim().is_empty() {
            return Err(anyhow::anyhow!("The sheet name must not be empty"))
                .pub_result(ErrorType::Config);
        }
        Ok(Self {
            spreadsheet_id,
            sheet_name,
            cache_ttl,
            credentials,
        })
    }

    /// Builds a `Config` from the parsed command line.
    pub fn from_common(common: &Common) -> Result<Self> {
        let spreadsheet = common.spreadsheet_id().ok_or_else(|| {
            crate::Error::new(
                ErrorType::Config,
                anyhow::anyhow!(
                    "No spreadsheet configured. Pass --spreadsheet-id or set GOOGLE_SPREADSHEET_ID"
                ),
            )
        })?;
        let credentials = match (common.service_account_email(), common.private_key()) {
            (Some(email), Some(key)) => Some(Credentials::new(email, key)),
            _ => None,
        };
        Config::new(
            spreadsheet,
            common.sheet_name(),
            Duration::from_secs(common.cache_ttl_secs()),
            credentials,
        )
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns the credentials or a `Config` error explaining which variables to set.
    pub(crate) fn require_credentials(&self) -> Result<&Credentials> {
        self.credentials()
            .context(
                "Google service account credentials are required. Set \
                GOOGLE_SERVICE_ACCOUNT_EMAIL and GOOGLE_PRIVATE_KEY",
            )
            .pub_result(ErrorType::Config)
    }
}

/// The credentials of a Google service account that has been granted access to the spreadsheet.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    client_email: String,
    private_key: String,
}

impl Credentials {
    /// Creates `Credentials`. Private keys pasted into `.env` files usually carry literal `\n`
    /// sequences instead of line breaks; these are turned back into newlines.
    pub fn new(client_email: impl Into<String>, private_key: impl AsRef<str>) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: private_key.as_ref().replace("\\n", "\n"),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// The PEM encoded private key.
    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Accepts a bare spreadsheet id or any URL of the form
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...`.
fn extract_spreadsheet_id(value: &str) -> Res<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("The spreadsheet id must not be empty");
    }

    let id = match Url::parse(value) {
        Ok(url) => {
            let mut segments = url
                .path_segments()
                .with_context(|| format!("Invalid Google Sheets URL '{value}'"))?;
            segments
                .by_ref()
                .find(|s| *s == "d")
                .and_then(|_| segments.next())
                .filter(|id| !id.is_empty())
                .with_context(|| {
                    format!(
                        "Invalid Google Sheets URL '{value}'. Expected: \
                        https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
                    )
                })?
                .to_string()
        }
        Err(_) => value.to_string(),
    };

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("Invalid spreadsheet id '{id}'");
    }
    Ok(id)
}
