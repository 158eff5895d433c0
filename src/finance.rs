//! The query and mutation layer.
//!
//! `Finance` is what both the CLI commands and the MCP tools talk to. It owns the cache, the store
//! and the clock, and it is cheap to share behind an `Arc` for the lifetime of a server.

use crate::aggregate::{aggregate, user_categories};
use crate::api::{self, Mode};
use crate::cache::{Cache, DASHBOARD_DATA};
use crate::clock::{Clock, SystemClock};
use crate::model::{
    DashboardData, NewTransaction, Transaction, TransactionUpdates, UserCategory,
};
use crate::store::{SheetRepository, Store, TransactionRepository};
use crate::{Config, Result};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Finance {
    store: Store,
    cache: Cache,
    clock: Arc<dyn Clock>,
}

impl Finance {
    /// Creates a `Finance` over `repository`. `cache` may be a clone of a cache held elsewhere.
    pub fn new(
        repository: Box<dyn TransactionRepository>,
        cache: Cache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Store::new(repository, cache.clone(), clock.clone()),
            cache,
            clock,
        }
    }

    /// Creates a `Finance` backed by the spreadsheet described in `config`, using the system
    /// clock.
    pub async fn connect(config: &Config, mode: Mode) -> Result<Self> {
        Self::connect_with_clock(config, mode, Arc::new(SystemClock)).await
    }

    pub(crate) async fn connect_with_clock(
        config: &Config,
        mode: Mode,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let sheet = api::sheet(config, mode).await?;
        let repository = SheetRepository::new(sheet, config.sheet_name());
        Ok(Self::new(
            Box::new(repository),
            Cache::new(config.cache_ttl()),
            clock,
        ))
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// All transactions, newest first.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.store.fetch_all().await
    }

    /// The dashboard, from the cache when possible.
    pub async fn dashboard(&self) -> Result<DashboardData> {
        if let Some(dashboard) = self.cache.get_json(DASHBOARD_DATA).await {
            debug!("Cache hit for {DASHBOARD_DATA}");
            return Ok(dashboard);
        }
        debug!("Cache miss for {DASHBOARD_DATA}");
        self.compute_dashboard().await
    }

    /// Transactions whose category is exactly `category`. The match is case-sensitive.
    pub async fn transactions_by_category(&self, category: &str) -> Result<Vec<Transaction>> {
        let mut transactions = self.store.fetch_all().await?;
        transactions.retain(|t| t.category() == category);
        Ok(transactions)
    }

    /// Transactions whose description or category contains `query`, ignoring case. A blank query
    /// matches everything.
    pub async fn search_transactions(&self, query: &str) -> Result<Vec<Transaction>> {
        let mut transactions = self.store.fetch_all().await?;
        let needle = query.trim().to_lowercase();
        if !needle.is_empty() {
            transactions.retain(|t| {
                t.description().to_lowercase().contains(&needle)
                    || t.category().to_lowercase().contains(&needle)
            });
        }
        Ok(transactions)
    }

    /// Each distinct (category, type) pair with its number of transactions, most used first.
    pub async fn user_categories(&self) -> Result<Vec<UserCategory>> {
        let transactions = self.store.fetch_all().await?;
        Ok(user_categories(&transactions))
    }

    pub async fn add_transaction(&self, fields: NewTransaction) -> Result<Transaction> {
        let transaction = self.store.create(fields).await?;
        self.warm().await;
        Ok(transaction)
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        updates: &TransactionUpdates,
    ) -> Result<Transaction> {
        let transaction = self.store.update(id, updates).await?;
        self.warm().await;
        Ok(transaction)
    }

    /// Returns `false`, and changes nothing, if there is no transaction with `id`.
    pub async fn delete_transaction(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            self.warm().await;
        }
        Ok(deleted)
    }

    async fn compute_dashboard(&self) -> Result<DashboardData> {
        let today = self.clock.today();
        self.store
            .fetch_derived(DASHBOARD_DATA, |transactions| aggregate(transactions, today))
            .await
    }

    /// Recomputes the dashboard after a write so the next read is served from the cache. The
    /// write has already happened, so a failure here is only logged.
    async fn warm(&self) {
        if let Err(e) = self.compute_dashboard().await {
            warn!("Unable to refresh the dashboard after a write: {e}");
        }
    }
}
