use crate::model::{Amount, Transaction, TransactionType};
use serde::{Deserialize, Serialize};

/// Expense totals for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub total: Amount,
    pub count: usize,
    /// Share of all expenses, from 0 to 100.
    pub percentage: f64,
}

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    /// A label such as `Jan 2024`.
    pub month: String,
    pub income: Amount,
    pub expenses: Amount,
    pub balance: Amount,
}

/// Everything the dashboard view shows, derived from the full set of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_balance: Amount,
    pub monthly_income: Amount,
    pub monthly_expenses: Amount,
    /// Sorted by `total`, largest first.
    pub category_summary: Vec<CategorySummary>,
    /// The trailing six months, oldest first.
    pub monthly_stats: Vec<MonthlyStat>,
    /// The ten most recent transactions, newest first.
    pub recent_transactions: Vec<Transaction>,
}

/// A distinct (category, type) pair found among the transactions.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub transaction_count: usize,
}
