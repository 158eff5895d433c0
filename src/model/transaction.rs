use crate::error::Res;
use crate::model::Amount;
use anyhow::bail;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether money came in or went out.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("INCOME") {
            Ok(TransactionType::Income)
        } else if s.eq_ignore_ascii_case("EXPENSE") {
            Ok(TransactionType::Expense)
        } else {
            bail!("Invalid transaction type '{s}', expected INCOME or EXPENSE")
        }
    }
}

/// Represents a single row from the Transactions tab.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) amount: Amount,
    pub(crate) category: String,
    pub(crate) description: String,
    pub(crate) date: NaiveDate,
    #[serde(rename = "type")]
    pub(crate) transaction_type: TransactionType,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        fields: NewTransaction,
    ) -> Self {
        Self {
            id: id.into(),
            amount: fields.amount,
            category: fields.category,
            description: fields.description,
            date,
            transaction_type: fields.transaction_type,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    /// The amount with its sign applied: positive for income, negative for expenses.
    pub fn signed_amount(&self) -> Amount {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// The fields a caller supplies when adding a transaction. The id and date are assigned by the
/// store.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewTransaction {
    pub amount: Amount,
    pub description: String,
    pub category: String,
    pub transaction_type: TransactionType,
}

/// A partial update. Only fields that are `Some` are written; the rest are left as they are.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TransactionUpdates {
    pub amount: Option<Amount>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
}

impl TransactionUpdates {
    pub fn is_empty(&self) -> bool {
        self == &TransactionUpdates::default()
    }

    pub(crate) fn apply(&self, transaction: &mut Transaction) {
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if let Some(description) = &self.description {
            transaction.description = description.clone();
        }
        if let Some(category) = &self.category {
            transaction.category = category.clone();
        }
        if let Some(date) = self.date {
            transaction.date = date;
        }
        if let Some(transaction_type) = self.transaction_type {
            transaction.transaction_type = transaction_type;
        }
    }
}

/// Parses the date formats we expect to find in the sheet: ISO dates as written by this program,
/// plus the US-style dates Google Sheets shows when a cell has been reformatted.
pub(crate) fn parse_date(s: &str) -> Res<NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
    let s = s.trim();
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date);
        }
    }
    bail!("Invalid date '{s}', expected YYYY-MM-DD")
}
