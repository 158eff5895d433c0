//! Insert command handlers.

use crate::args::AddTransactionArgs;
use crate::commands::Out;
use crate::model::Transaction;
use crate::{Finance, Result};

/// Adds a transaction dated today. The new transaction, including its generated id, is returned.
pub async fn add_transaction(
    finance: &Finance,
    args: AddTransactionArgs,
) -> Result<Out<Transaction>> {
    let fields = args.new_transaction()?;
    let transaction = finance.add_transaction(fields).await?;
    let message = format!("Added transaction {}", transaction.id());
    Ok(Out::new(message, transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::model::TransactionType;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_add_transaction() {
        let env = TestEnv::new().await;
        let finance = env.finance().await;
        let args = AddTransactionArgs {
            amount: 100.0,
            description: "Paycheck bonus".to_string(),
            category: "Salary".to_string(),
            transaction_type: TransactionType::Income,
        };
        let out = add_transaction(&finance, args).await.unwrap();
        let added = out.structure().unwrap();
        assert_eq!(out.message(), format!("Added transaction {}", added.id()));
        assert_eq!(added.date(), env.today());

        // A separate instance reading the same sheet sees the new row.
        let other = env.finance().await;
        let all = other.transactions().await.unwrap();
        assert_eq!(all.len(), 13);
        assert_eq!(&all[0], added);
    }

    #[tokio::test]
    async fn test_add_invalid_amount() {
        let env = TestEnv::new().await;
        let args = AddTransactionArgs {
            amount: f64::INFINITY,
            description: "x".to_string(),
            category: "y".to_string(),
            transaction_type: TransactionType::Expense,
        };
        let err = add_transaction(&env.finance().await, args)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(env.finance().await.transactions().await.unwrap().len(), 12);
    }
}
