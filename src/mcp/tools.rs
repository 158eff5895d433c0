//! The tools exposed by the fintrack MCP server.

use crate::args::{
    AddTransactionArgs, ByCategoryArgs, DeleteTransactionArgs, SearchArgs, UpdateTransactionArgs,
};
use crate::commands;
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::FinanceServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::info;

#[tool_router(vis = "pub(super)")]
impl FinanceServer {
    #[tool]
    /// Initialize the fintrack MCP service for this session and return usage instructions. You
    /// **MUST** call this **ONCE** before using other tools so that you have the full usage
    /// instructions. You **MAY** call it more than once if you have forgotten the usage
    /// instructions.
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            include_str!("docs/INSTRUCTIONS.md"),
        )]))
    }

    /// List every transaction, newest first. Transactions on the same date keep the order they
    /// have in the sheet.
    #[tool]
    async fn transactions(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: transactions called");
        tool_result(commands::transactions(&self.finance).await)
    }

    /// Get the dashboard: the total balance, this month's income and expenses, expenses by
    /// category with percentages, income and expenses for each of the last six months, and the
    /// ten most recent transactions.
    #[tool]
    async fn dashboard(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: dashboard called");
        tool_result(commands::dashboard(&self.finance).await)
    }

    /// List the transactions in one category, newest first. The category must match exactly,
    /// including case.
    #[tool]
    async fn transactions_by_category(
        &self,
        Parameters(args): Parameters<ByCategoryArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: transactions_by_category called with {:?}", args);
        tool_result(commands::transactions_by_category(&self.finance, args).await)
    }

    /// Find transactions whose description or category contains the query, ignoring case.
    #[tool]
    async fn search_transactions(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: search_transactions called with {:?}", args);
        tool_result(commands::search_transactions(&self.finance, args).await)
    }

    /// List the categories in use with how many transactions each has and whether they are
    /// income or expense categories. Useful for picking a category before adding a transaction.
    #[tool]
    async fn get_user_categories(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: get_user_categories called");
        tool_result(commands::user_categories(&self.finance).await)
    }

    /// Add a transaction dated today. The id is generated and returned with the new transaction.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "amount": 54.20,
    ///   "description": "Trader Joe's",
    ///   "category": "Groceries",
    ///   "type": "EXPENSE"
    /// }
    /// ```
    #[tool]
    async fn add_transaction(
        &self,
        Parameters(args): Parameters<AddTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: add_transaction called with {:?}", args);
        tool_result(commands::add_transaction(&self.finance, args).await)
    }

    /// Update a transaction by id. Only the fields that are given change. Returns an error if the
    /// id does not exist.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "id": "tx-004",
    ///   "category": "Dining",
    ///   "date": "2025-10-02"
    /// }
    /// ```
    #[tool]
    async fn update_transaction(
        &self,
        Parameters(args): Parameters<UpdateTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: update_transaction called with {:?}", args);
        tool_result(commands::update_transaction(&self.finance, args).await)
    }

    /// Delete a transaction by id. Returns `true` if it was deleted and `false` if no
    /// transaction had that id.
    #[tool]
    async fn delete_transaction(
        &self,
        Parameters(args): Parameters<DeleteTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: delete_transaction called with {:?}", args);
        tool_result(commands::delete_transaction(&self.finance, args).await)
    }
}
