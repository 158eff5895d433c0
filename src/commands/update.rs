//! Update command handlers.

use crate::args::UpdateTransactionArgs;
use crate::commands::Out;
use crate::model::Transaction;
use crate::{Finance, Result};

/// Updates the fields given in `args` on one transaction and returns the updated transaction.
///
/// Fails with a `NotFound` error if the id does not exist.
pub async fn update_transaction(
    finance: &Finance,
    args: UpdateTransactionArgs,
) -> Result<Out<Transaction>> {
    let updates = args.updates()?;
    let transaction = finance.update_transaction(&args.id, &updates).await?;
    let message = format!("Updated transaction {}", transaction.id());
    Ok(Out::new(message, transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::model::{Amount, TransactionType};
    use crate::test::TestEnv;
    use chrono::NaiveDate;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_update_transaction() {
        let env = TestEnv::new().await;
        let finance = env.finance().await;
        let args = UpdateTransactionArgs {
            id: "tx-011".to_string(),
            category: Some("Coffee".to_string()),
            date: Some("2025-10-16".to_string()),
            ..Default::default()
        };
        let out = update_transaction(&finance, args).await.unwrap();
        assert_eq!(out.message(), "Updated transaction tx-011");
        let updated = out.structure().unwrap();
        assert_eq!(updated.category(), "Coffee");
        assert_eq!(updated.date(), NaiveDate::from_ymd_opt(2025, 10, 16).unwrap());
        assert_eq!(updated.amount(), Amount::from_str("8.50").unwrap());
        assert_eq!(updated.description(), "Blue Bottle");
        assert_eq!(updated.transaction_type(), TransactionType::Expense);

        let coffee = finance.transactions_by_category("Coffee").await.unwrap();
        assert_eq!(coffee, vec![updated.clone()]);
    }

    #[tokio::test]
    async fn test_update_missing() {
        let env = TestEnv::new().await;
        let args = UpdateTransactionArgs {
            id: "tx-999".to_string(),
            amount: Some(1.0),
            ..Default::default()
        };
        let err = update_transaction(&env.finance().await, args)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
        assert!(err.to_string().contains("tx-999"));
    }
}
