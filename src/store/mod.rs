//! The transaction store: a `TransactionRepository` behind the shared `Cache`.
//!
//! `Store::fetch_all` is cache-backed under `ALL_TRANSACTIONS`. Every successful write drops both
//! `ALL_TRANSACTIONS` and `DASHBOARD_DATA` so the next read sees the new data. Cache fills and
//! invalidations both happen under the repository lock.

mod sheet_repository;

use crate::cache::{Cache, ALL_TRANSACTIONS, DASHBOARD_DATA};
use crate::clock::Clock;
use crate::model::{NewTransaction, Transaction, TransactionUpdates};
use crate::{utils, Result};
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub(crate) use sheet_repository::SheetRepository;

/// Where transactions are persisted. The spreadsheet is one implementation (`SheetRepository`);
/// anything that can list, append, patch and remove records can stand in for it.
#[async_trait::async_trait]
pub trait TransactionRepository: Send {
    /// Returns every transaction, newest first. Transactions sharing a date keep the order in
    /// which they are stored.
    async fn fetch_all(&mut self) -> Result<Vec<Transaction>>;

    /// Persists a new transaction. The id and date have already been assigned.
    async fn create(&mut self, transaction: &Transaction) -> Result<()>;

    /// Applies `updates` to the transaction with `id` and returns the result. Fails with a
    /// `NotFound` error if there is no such transaction.
    async fn update(&mut self, id: &str, updates: &TransactionUpdates) -> Result<Transaction>;

    /// Removes the transaction with `id`. Returns `false` if there was no such transaction.
    async fn delete(&mut self, id: &str) -> Result<bool>;
}

/// Serializes access to a `TransactionRepository` and keeps the cache coherent with it.
///
/// Each operation holds the repository lock from its read to its write, so two mutations never
/// interleave their read-modify-write against the sheet.
pub struct Store {
    repository: Mutex<Box<dyn TransactionRepository>>,
    cache: Cache,
    clock: Arc<dyn Clock>,
}

impl Debug for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("cache", &self.cache)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(
        repository: Box<dyn TransactionRepository>,
        cache: Cache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository: Mutex::new(repository),
            cache,
            clock,
        }
    }

    /// Returns all transactions sorted by date, newest first, from the cache when possible.
    pub async fn fetch_all(&self) -> Result<Vec<Transaction>> {
        if let Some(transactions) = self.cache.get_json(ALL_TRANSACTIONS).await {
            debug!("Cache hit for {ALL_TRANSACTIONS}");
            return Ok(transactions);
        }
        let mut repository = self.repository.lock().await;
        self.load(&mut repository).await
    }

    /// Computes a value from all transactions and caches it under `key`. The repository stays
    /// locked until the value is cached, so a concurrent write cannot be overtaken by it.
    pub(crate) async fn fetch_derived<T, F>(&self, key: &str, derive: F) -> Result<T>
    where
        T: Serialize,
        F: FnOnce(&[Transaction]) -> T,
    {
        let mut repository = self.repository.lock().await;
        let transactions = self.load(&mut repository).await?;
        let derived = derive(&transactions);
        self.cache.set_json(key, &derived).await;
        Ok(derived)
    }

    /// Assigns a fresh id and today's date to `fields`, appends the transaction and returns it.
    pub async fn create(&self, fields: NewTransaction) -> Result<Transaction> {
        let transaction = Transaction::new(
            utils::generate_transaction_id(),
            self.clock.today(),
            fields,
        );
        let mut repository = self.repository.lock().await;
        repository.create(&transaction).await?;
        info!("Created transaction {}", transaction.id());
        self.invalidate().await;
        Ok(transaction)
    }

    /// Applies the provided fields to the transaction with `id`, leaving the others unchanged.
    pub async fn update(&self, id: &str, updates: &TransactionUpdates) -> Result<Transaction> {
        let mut repository = self.repository.lock().await;
        let transaction = repository.update(id, updates).await?;
        info!("Updated transaction {id}");
        self.invalidate().await;
        Ok(transaction)
    }

    /// Removes the transaction with `id`. An unknown id is not an error: it returns `false` and
    /// leaves the cache alone.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut repository = self.repository.lock().await;
        let deleted = repository.delete(id).await?;
        if deleted {
            info!("Deleted transaction {id}");
            self.invalidate().await;
        } else {
            debug!("Nothing to delete for transaction {id}");
        }
        Ok(deleted)
    }

    /// Reads through the cache with the repository already locked. Writers invalidate under the
    /// same lock, so whatever is cached here is never older than the last write.
    async fn load(
        &self,
        repository: &mut Box<dyn TransactionRepository>,
    ) -> Result<Vec<Transaction>> {
        if let Some(transactions) = self.cache.get_json(ALL_TRANSACTIONS).await {
            return Ok(transactions);
        }
        debug!("Cache miss for {ALL_TRANSACTIONS}");
        let transactions = repository.fetch_all().await?;
        self.cache.set_json(ALL_TRANSACTIONS, &transactions).await;
        Ok(transactions)
    }

    async fn invalidate(&self) {
        debug!("Invalidating {ALL_TRANSACTIONS} and {DASHBOARD_DATA}");
        self.cache.clear(Some(ALL_TRANSACTIONS)).await;
        self.cache.clear(Some(DASHBOARD_DATA)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::{Error, ErrorType};
    use crate::model::{Amount, TransactionType};
    use chrono::NaiveDate;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A repository held in memory that counts how often it is read.
    #[derive(Debug, Default)]
    struct MemoryRepository {
        transactions: Vec<Transaction>,
        fetches: Arc<AtomicUsize>,
        fail: bool,
        /// How long each `fetch_all` takes.
        latency: Option<Duration>,
    }

    #[async_trait::async_trait]
    impl TransactionRepository for MemoryRepository {
        async fn fetch_all(&mut self) -> Result<Vec<Transaction>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if self.fail {
                return Err(Error::new(
                    ErrorType::StoreUnavailable,
                    anyhow::anyhow!("offline"),
                ));
            }
            let mut all = self.transactions.clone();
            all.sort_by(|a, b| b.date().cmp(&a.date()));
            Ok(all)
        }

        async fn create(&mut self, transaction: &Transaction) -> Result<()> {
            self.transactions.push(transaction.clone());
            Ok(())
        }

        async fn update(&mut self, id: &str, updates: &TransactionUpdates) -> Result<Transaction> {
            let transaction = self
                .transactions
                .iter_mut()
                .find(|t| t.id() == id)
                .ok_or_else(|| Error::not_found(id))?;
            updates.apply(transaction);
            Ok(transaction.clone())
        }

        async fn delete(&mut self, id: &str) -> Result<bool> {
            let before = self.transactions.len();
            self.transactions.retain(|t| t.id() != id);
            Ok(self.transactions.len() != before)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn store(repository: MemoryRepository) -> (Store, Cache) {
        let cache = Cache::default();
        let store = Store::new(
            Box::new(repository),
            cache.clone(),
            Arc::new(FixedClock::new(today())),
        );
        (store, cache)
    }

    fn coffee() -> NewTransaction {
        NewTransaction {
            amount: Amount::from_str("4.50").unwrap(),
            description: "Latte".to_string(),
            category: "Coffee".to_string(),
            transaction_type: TransactionType::Expense,
        }
    }

    #[tokio::test]
    async fn test_fetch_all_is_cached() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let (store, _) = store(MemoryRepository {
            fetches: fetches.clone(),
            ..Default::default()
        });
        store.fetch_all().await.unwrap();
        store.fetch_all().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_cached() {
        let (store, cache) = store(MemoryRepository {
            fail: true,
            ..Default::default()
        });
        let err = store.fetch_all().await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::StoreUnavailable);
        assert!(cache.get(ALL_TRANSACTIONS).await.is_none());
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_date_and_invalidates() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let (store, cache) = store(MemoryRepository {
            fetches: fetches.clone(),
            ..Default::default()
        });
        assert!(store.fetch_all().await.unwrap().is_empty());
        cache.set(DASHBOARD_DATA, b"{}".to_vec()).await;

        let created = store.create(coffee()).await.unwrap();
        assert_eq!(created.date(), today());
        assert_eq!(created.id().len(), 36);
        assert!(cache.get(ALL_TRANSACTIONS).await.is_none());
        assert!(cache.get(DASHBOARD_DATA).await.is_none());

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all, vec![created]);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (store, _) = store(MemoryRepository::default());
        let a = store.create(coffee()).await.unwrap();
        let b = store.create(coffee()).await.unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (store, cache) = store(MemoryRepository::default());
        cache.set(ALL_TRANSACTIONS, b"[]".to_vec()).await;
        let updates = TransactionUpdates {
            category: Some("Tea".to_string()),
            ..Default::default()
        };
        let err = store.update("nope", &updates).await.unwrap_err();
        assert!(err.is_not_found());
        // A failed update leaves the cache alone.
        assert!(cache.get(ALL_TRANSACTIONS).await.is_some());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (store, cache) = store(MemoryRepository::default());
        let created = store.create(coffee()).await.unwrap();
        store.fetch_all().await.unwrap();

        let updates = TransactionUpdates {
            amount: Some(Amount::from_str("5").unwrap()),
            ..Default::default()
        };
        let updated = store.update(created.id(), &updates).await.unwrap();
        assert_eq!(updated.amount(), Amount::from_str("5").unwrap());
        assert_eq!(updated.description(), "Latte");
        assert!(cache.get(ALL_TRANSACTIONS).await.is_none());

        store.fetch_all().await.unwrap();
        assert!(!store.delete("nope").await.unwrap());
        assert!(cache.get(ALL_TRANSACTIONS).await.is_some());

        assert!(store.delete(created.id()).await.unwrap());
        assert!(cache.get(ALL_TRANSACTIONS).await.is_none());
        assert!(store.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_during_read_is_not_overwritten_by_the_read() {
        let (store, cache) = store(MemoryRepository {
            latency: Some(Duration::from_millis(50)),
            ..Default::default()
        });

        // Whichever side takes the lock first, the list cached afterwards includes the write.
        let (read, created) = tokio::join!(store.fetch_all(), store.create(coffee()));
        read.unwrap();
        let created = created.unwrap();
        assert_eq!(store.fetch_all().await.unwrap(), vec![created.clone()]);
        let cached: Option<Vec<Transaction>> = cache.get_json(ALL_TRANSACTIONS).await;
        assert_eq!(cached, Some(vec![created]));
    }

    #[tokio::test]
    async fn test_fetch_derived_caches_under_key() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let (store, cache) = store(MemoryRepository {
            fetches: fetches.clone(),
            ..Default::default()
        });
        store.create(coffee()).await.unwrap();

        let count = store
            .fetch_derived(DASHBOARD_DATA, |all| all.len())
            .await
            .unwrap();
        assert_eq!(count, 1);
        let cached: Option<usize> = cache.get_json(DASHBOARD_DATA).await;
        assert_eq!(cached, Some(1));
        assert!(cache.get(ALL_TRANSACTIONS).await.is_some());

        store.fetch_derived(DASHBOARD_DATA, |all| all.len()).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
