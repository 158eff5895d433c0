//! Read-only commands.

use crate::args::{ByCategoryArgs, SearchArgs};
use crate::commands::{plural, Out};
use crate::model::{DashboardData, Transaction, UserCategory};
use crate::{Finance, Result};

/// Lists every transaction, newest first.
pub async fn transactions(finance: &Finance) -> Result<Out<Vec<Transaction>>> {
    let transactions = finance.transactions().await?;
    let message = format!("Found {}", plural(transactions.len(), "transaction"));
    Ok(Out::new(message, transactions))
}

/// Computes (or returns the cached) dashboard.
pub async fn dashboard(finance: &Finance) -> Result<Out<DashboardData>> {
    let dashboard = finance.dashboard().await?;
    let message = format!(
        "Balance {}, this month: income {}, expenses {}",
        dashboard.total_balance, dashboard.monthly_income, dashboard.monthly_expenses
    );
    Ok(Out::new(message, dashboard))
}

pub async fn transactions_by_category(
    finance: &Finance,
    args: ByCategoryArgs,
) -> Result<Out<Vec<Transaction>>> {
    let transactions = finance.transactions_by_category(&args.category).await?;
    let message = format!(
        "Found {} in category '{}'",
        plural(transactions.len(), "transaction"),
        args.category
    );
    Ok(Out::new(message, transactions))
}

pub async fn search_transactions(
    finance: &Finance,
    args: SearchArgs,
) -> Result<Out<Vec<Transaction>>> {
    let transactions = finance.search_transactions(&args.query).await?;
    let message = format!(
        "Found {} matching '{}'",
        plural(transactions.len(), "transaction"),
        args.query
    );
    Ok(Out::new(message, transactions))
}

pub async fn user_categories(finance: &Finance) -> Result<Out<Vec<UserCategory>>> {
    let categories = finance.user_categories().await?;
    let count = categories.len();
    let message = format!(
        "Found {} categor{}",
        count,
        if count == 1 { "y" } else { "ies" }
    );
    Ok(Out::new(message, categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_transactions() {
        let env = TestEnv::new().await;
        let out = transactions(&env.finance().await).await.unwrap();
        assert_eq!(out.message(), "Found 12 transactions");
        assert_eq!(out.structure().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let env = TestEnv::new().await;
        let out = dashboard(&env.finance().await).await.unwrap();
        assert_eq!(
            out.message(),
            "Balance $3,674.78, this month: income $3,060.00, expenses $1,310.78"
        );
        let json = serde_json::to_value(out.structure().unwrap()).unwrap();
        assert_eq!(json["totalBalance"], 3674.78);
        assert_eq!(json["monthlyStats"].as_array().unwrap().len(), 6);
        assert_eq!(json["categorySummary"][0]["category"], "Rent");
        assert_eq!(json["recentTransactions"][0]["type"], "INCOME");
    }

    #[tokio::test]
    async fn test_by_category() {
        let env = TestEnv::new().await;
        let args = ByCategoryArgs {
            category: "Rent".to_string(),
        };
        let out = transactions_by_category(&env.finance().await, args)
            .await
            .unwrap();
        assert_eq!(out.message(), "Found 2 transactions in category 'Rent'");
    }

    #[tokio::test]
    async fn test_search() {
        let env = TestEnv::new().await;
        let args = SearchArgs {
            query: "whole".to_string(),
        };
        let out = search_transactions(&env.finance().await, args)
            .await
            .unwrap();
        assert_eq!(out.message(), "Found 1 transaction matching 'whole'");
        assert_eq!(out.structure().unwrap()[0].id(), "tx-003");
    }

    #[tokio::test]
    async fn test_user_categories() {
        let env = TestEnv::new().await;
        let out = user_categories(&env.finance().await).await.unwrap();
        assert_eq!(out.message(), "Found 7 categories");
        let json = serde_json::to_value(out.structure().unwrap()).unwrap();
        assert_eq!(json[0]["name"], "Groceries");
        assert_eq!(json[0]["type"], "EXPENSE");
        assert_eq!(json[0]["transactionCount"], 3);
    }
}
