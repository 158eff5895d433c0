//! Derives the dashboard and the category directory from a set of transactions.
//!
//! These are plain functions over a slice: no I/O, no caching. The only outside input is `today`,
//! which decides the current month and the six-month window.

use crate::model::{
    Amount, CategorySummary, DashboardData, MonthlyStat, Transaction, TransactionType,
    UserCategory,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Number of months in the trend, including the current month.
pub const TREND_MONTHS: u32 = 6;

/// Number of transactions in `recent_transactions`.
pub const RECENT_COUNT: usize = 10;

/// Computes the dashboard. `transactions` is expected to be sorted newest first, as returned by
/// the store; `recent_transactions` is simply its first ten entries.
pub fn aggregate(transactions: &[Transaction], today: NaiveDate) -> DashboardData {
    let total_balance = transactions.iter().map(Transaction::signed_amount).sum();

    let current = YearMonth::of(today);
    let (monthly_income, monthly_expenses) = month_totals(transactions, current);

    let monthly_stats = current
        .trailing(TREND_MONTHS)
        .into_iter()
        .map(|month| {
            let (income, expenses) = month_totals(transactions, month);
            MonthlyStat {
                month: month.label(),
                income,
                expenses,
                balance: income - expenses,
            }
        })
        .collect();

    DashboardData {
        total_balance,
        monthly_income,
        monthly_expenses,
        category_summary: category_summary(transactions),
        monthly_stats,
        recent_transactions: transactions.iter().take(RECENT_COUNT).cloned().collect(),
    }
}

/// Groups expenses by category. Categories keep the order in which they are first seen when
/// their totals tie.
pub fn category_summary(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for t in transactions.iter().filter(|t| t.is_expense()) {
        let ix = *index.entry(t.category()).or_insert_with(|| {
            summaries.push(CategorySummary {
                category: t.category().to_string(),
                total: Amount::ZERO,
                count: 0,
                percentage: 0.0,
            });
            summaries.len() - 1
        });
        let summary = &mut summaries[ix];
        summary.total = summary.total + t.amount();
        summary.count += 1;
    }

    let total_expenses: Amount = summaries.iter().map(|s| s.total).sum();
    for summary in summaries.iter_mut() {
        summary.percentage = percentage(summary.total, total_expenses);
    }

    summaries.sort_by(|a, b| b.total.cmp(&a.total));
    summaries
}

/// Lists every distinct (category, type) pair with the number of transactions using it, most
/// used first.
pub fn user_categories(transactions: &[Transaction]) -> Vec<UserCategory> {
    let mut categories: Vec<UserCategory> = Vec::new();
    let mut index: HashMap<(&str, TransactionType), usize> = HashMap::new();

    for t in transactions {
        let key = (t.category(), t.transaction_type());
        match index.get(&key) {
            Some(&ix) => categories[ix].transaction_count += 1,
            None => {
                index.insert(key, categories.len());
                categories.push(UserCategory {
                    name: t.category().to_string(),
                    transaction_type: t.transaction_type(),
                    transaction_count: 1,
                });
            }
        }
    }

    categories.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
    categories
}

fn percentage(part: Amount, whole: Amount) -> f64 {
    if whole.value() <= Decimal::ZERO {
        return 0.0;
    }
    (part.value() / whole.value() * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or_default()
}

/// Sums income and expenses dated within `month`.
fn month_totals(transactions: &[Transaction], month: YearMonth) -> (Amount, Amount) {
    transactions
        .iter()
        .filter(|t| YearMonth::of(t.date()) == month)
        .fold((Amount::ZERO, Amount::ZERO), |(income, expenses), t| {
            match t.transaction_type() {
                TransactionType::Income => (income + t.amount(), expenses),
                TransactionType::Expense => (income, expenses + t.amount()),
            }
        })
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct YearMonth {
    year: i32,
    /// 1 through 12.
    month: u32,
}

impl YearMonth {
    fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Steps back `n` months.
    fn minus(self, n: u32) -> Self {
        let ix = self.year * 12 + self.month as i32 - 1 - n as i32;
        Self {
            year: ix.div_euclid(12),
            month: ix.rem_euclid(12) as u32 + 1,
        }
    }

    /// The `n` months ending with (and including) this one, oldest first.
    fn trailing(self, n: u32) -> Vec<Self> {
        (0..n).rev().map(|back| self.minus(back)).collect()
    }

    /// e.g. `Jan 2024`
    fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| format!("{:04}-{:02}", self.year, self.month))
    }
}
