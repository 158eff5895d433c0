//! These structs provide the CLI interface for fintrack. The per-command argument structs are also
//! the parameter types of the MCP tools, which is why they derive `Deserialize` and `JsonSchema`.

use crate::config::DEFAULT_SHEET_NAME;
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{parse_date, Amount, NewTransaction, TransactionType, TransactionUpdates};
use crate::Result;
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// fintrack: a personal finance tracker backed by a Google sheet.
///
/// Transactions live in one tab of a Google sheet (one row per transaction, with the columns id,
/// amount, category, description, date and type in any order). fintrack lists them, adds, edits
/// and deletes them, and computes a dashboard: balance, this month's income and expenses, spending
/// by category and a six month trend.
///
/// Access is through a Google service account. Share the sheet with the service account's email
/// address and provide its credentials through the environment or a `.env` file.
///
/// There is also a mode in which an AI agent can use this program through the serve subcommand.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every transaction, newest first.
    Transactions,
    /// Show the dashboard: total balance, this month's income and expenses, spending by category,
    /// the last six months and the ten most recent transactions.
    Dashboard,
    /// List the transactions of one category. The category must match exactly, including case.
    ByCategory(ByCategoryArgs),
    /// List each category in use, with its type and number of transactions.
    Categories,
    /// Find transactions whose description or category contains some text, ignoring case.
    Search(SearchArgs),
    /// Add a transaction dated today.
    Add(AddTransactionArgs),
    /// Change some fields of a transaction. Fields that are not given are left as they are.
    Update(UpdateTransactionArgs),
    /// Delete a transaction.
    Delete(DeleteTransactionArgs),
    /// Run the MCP server over stdio.
    ///
    /// This is a long-running process that an MCP client (an AI agent) launches as a subprocess.
    Serve,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The id of the spreadsheet, or its full URL, e.g.
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long, env = "GOOGLE_SPREADSHEET_ID")]
    spreadsheet_id: Option<String>,

    /// The name of the tab that holds transactions.
    #[arg(long, env = "FINTRACK_SHEET_NAME", default_value = DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// How many seconds cached reads stay valid.
    #[arg(long, env = "FINTRACK_CACHE_TTL_SECS", default_value_t = 300)]
    cache_ttl_secs: u64,

    /// The email address of the Google service account.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_EMAIL")]
    service_account_email: Option<String>,

    /// The PEM encoded private key of the Google service account. Literal `\n` sequences are
    /// treated as line breaks.
    #[arg(long, env = "GOOGLE_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<Secret>,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs
    }

    pub fn service_account_email(&self) -> Option<&str> {
        self.service_account_email.as_deref()
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_ref().map(|s| s.0.as_str())
    }
}

/// A string that is never shown by `Debug`.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Secret(String);

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Args for the `fintrack by-category` command and the `transactions_by_category` tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct ByCategoryArgs {
    /// The category to list. The match is exact and case-sensitive.
    pub category: String,
}

/// Args for the `fintrack search` command and the `search_transactions` tool.
#[derive(Debug, Clone, Default, Parser, Serialize, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Text to look for in the description or category, ignoring case. An empty query matches
    /// every transaction.
    #[arg(default_value = "")]
    #[serde(default)]
    pub query: String,
}

/// Args for the `fintrack add` command and the `add_transaction` tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct AddTransactionArgs {
    /// The amount of money, as a non-negative number, e.g. 12.5. Whether it is money in or out is
    /// given by `type`.
    #[arg(long, allow_negative_numbers = true)]
    pub amount: f64,

    /// What the transaction was, e.g. "Whole Foods".
    #[arg(long)]
    pub description: String,

    /// A free-form category label, e.g. "Groceries".
    #[arg(long)]
    pub category: String,

    /// INCOME or EXPENSE.
    #[arg(long = "type", value_enum, ignore_case = true)]
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

impl AddTransactionArgs {
    /// Validates the arguments into the fields of a new transaction.
    pub fn new_transaction(&self) -> Result<NewTransaction> {
        Ok(NewTransaction {
            amount: amount(self.amount)?,
            description: self.description.clone(),
            category: self.category.clone(),
            transaction_type: self.transaction_type,
        })
    }
}

/// Args for the `fintrack update` command and the `update_transaction` tool. Only the fields that
/// are given are changed.
#[derive(Debug, Clone, Default, Parser, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTransactionArgs {
    /// The id of the transaction to update.
    pub id: String,

    /// The new amount.
    #[arg(long, allow_negative_numbers = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// The new description.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The new category.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// The new date, as YYYY-MM-DD.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// The new type, INCOME or EXPENSE.
    #[arg(long = "type", value_enum, ignore_case = true)]
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
}

impl UpdateTransactionArgs {
    /// Validates the given fields into `TransactionUpdates`.
    pub fn updates(&self) -> Result<TransactionUpdates> {
        let date = match &self.date {
            Some(date) => Some(parse_date(date).pub_result(ErrorType::Validation)?),
            None => None,
        };
        Ok(TransactionUpdates {
            amount: self.amount.map(amount).transpose()?,
            description: self.description.clone(),
            category: self.category.clone(),
            date,
            transaction_type: self.transaction_type,
        })
    }
}

/// Args for the `fintrack delete` command and the `delete_transaction` tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct DeleteTransactionArgs {
    /// The id of the transaction to delete.
    pub id: String,
}

fn amount(value: f64) -> Result<Amount> {
    Amount::from_f64(value).ok_or_else(|| Error::validation(format!("Invalid amount {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "fintrack",
            "--spreadsheet-id",
            "abc",
            "add",
            "--amount",
            "12.5",
            "--description",
            "Lunch",
            "--category",
            "Food",
            "--type",
            "EXPENSE",
        ])
        .unwrap();
        assert_eq!(args.common().spreadsheet_id(), Some("abc"));
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        let Command::Add(add) = args.command() else {
            panic!("expected add, got {:?}", args.command());
        };
        let fields = add.new_transaction().unwrap();
        assert_eq!(fields.amount, Amount::from_str("12.5").unwrap());
        assert_eq!(fields.transaction_type, TransactionType::Expense);
    }

    #[test]
    fn test_parse_update_partial() {
        let args = Args::try_parse_from([
            "fintrack",
            "update",
            "tx-1",
            "--amount",
            "50",
            "--date",
            "2024-02-29",
        ])
        .unwrap();
        let Command::Update(update) = args.command() else {
            panic!("expected update, got {:?}", args.command());
        };
        let updates = update.updates().unwrap();
        assert_eq!(updates.amount, Some(Amount::from_str("50").unwrap()));
        assert_eq!(updates.date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(updates.description, None);
        assert_eq!(updates.category, None);
        assert_eq!(updates.transaction_type, None);
    }

    #[test]
    fn test_update_bad_date_is_validation_error() {
        let args = UpdateTransactionArgs {
            id: "tx-1".to_string(),
            date: Some("tomorrow".to_string()),
            ..Default::default()
        };
        let err = args.updates().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }

    #[test]
    fn test_add_nan_is_validation_error() {
        let args = AddTransactionArgs {
            amount: f64::NAN,
            description: "x".to_string(),
            category: "y".to_string(),
            transaction_type: TransactionType::Income,
        };
        let err = args.new_transaction().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }

    #[test]
    fn test_update_args_from_json() {
        let json = serde_json::json!({"id": "tx-1", "category": "Food", "type": "INCOME"});
        let args: UpdateTransactionArgs = serde_json::from_value(json).unwrap();
        let updates = args.updates().unwrap();
        assert_eq!(updates.category.as_deref(), Some("Food"));
        assert_eq!(updates.transaction_type, Some(TransactionType::Income));
        assert_eq!(updates.amount, None);
    }

    #[test]
    fn test_search_query_defaults_to_empty() {
        let args = Args::try_parse_from(["fintrack", "search"]).unwrap();
        let Command::Search(search) = args.command() else {
            panic!("expected search, got {:?}", args.command());
        };
        assert_eq!(search.query, "");
        let from_json: SearchArgs = serde_json::from_str("{}").unwrap();
        assert_eq!(from_json.query, "");
    }

    #[test]
    fn test_private_key_hidden_from_debug() {
        let args = Args::try_parse_from([
            "fintrack",
            "--private-key",
            "TOP-SECRET",
            "transactions",
        ])
        .unwrap();
        assert_eq!(args.common().private_key(), Some("TOP-SECRET"));
        assert!(!format!("{args:?}").contains("TOP-SECRET"));
    }
}
