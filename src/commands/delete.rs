//! Delete command handlers.

use crate::args::DeleteTransactionArgs;
use crate::commands::Out;
use crate::{Finance, Result};

/// Deletes one transaction by id. The structured output is `true` if a transaction was deleted and
/// `false` if there was no transaction with that id, which is not an error.
pub async fn delete_transaction(
    finance: &Finance,
    args: DeleteTransactionArgs,
) -> Result<Out<bool>> {
    let deleted = finance.delete_transaction(&args.id).await?;
    let message = if deleted {
        format!("Deleted transaction {}", args.id)
    } else {
        format!("Transaction {} does not exist, nothing was deleted", args.id)
    };
    Ok(Out::new(message, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_delete_transaction() {
        let env = TestEnv::new().await;
        let finance = env.finance().await;
        let args = DeleteTransactionArgs {
            id: "tx-008".to_string(),
        };
        let out = delete_transaction(&finance, args.clone()).await.unwrap();
        assert_eq!(out.message(), "Deleted transaction tx-008");
        assert_eq!(out.structure(), Some(&true));

        // Deleting again is not an error.
        let out = delete_transaction(&finance, args).await.unwrap();
        assert_eq!(out.structure(), Some(&false));
        assert_eq!(finance.transactions().await.unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_delete_missing_changes_nothing() {
        let env = TestEnv::new().await;
        let before = env.get_state();
        let args = DeleteTransactionArgs {
            id: "nope".to_string(),
        };
        let out = delete_transaction(&env.finance().await, args).await.unwrap();
        assert_eq!(out.structure(), Some(&false));
        assert_eq!(env.get_state(), before);
    }
}
