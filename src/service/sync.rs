use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::db::{Row, TableStore};
use crate::error::{AppError, StoreError};
use crate::models::{OrderInput, OrderRecord, TableLayout, WriteMode};
use crate::service::retry_if_missing;

/// Result of one sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub table: String,
    pub restaurant: String,
    pub date: NaiveDate,
    /// Stale rows of this partition that were dropped
    pub removed: usize,
    /// Rows of other partitions left as they were
    pub kept: usize,
    pub written: usize,
}

/// Holds the in-flight flag; clears it when dropped
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Keeps the stored rows of a (date, restaurant) partition equal to the
/// client's current order list
pub struct OrderSyncService {
    store: Arc<dyn TableStore>,
    layout: TableLayout,
    syncing: AtomicBool,
    timeout: Duration,
}

impl OrderSyncService {
    pub fn new(store: Arc<dyn TableStore>, layout: TableLayout, timeout: Duration) -> Self {
        Self {
            store,
            layout,
            syncing: AtomicBool::new(false),
            timeout,
        }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Replace the stored orders of (restaurant, date) with `orders`.
    ///
    /// An empty list clears the partition. Returns [`AppError::Busy`] without
    /// touching the store while another sync is running.
    pub async fn sync(
        &self,
        restaurant: &str,
        date: NaiveDate,
        orders: Vec<OrderInput>,
    ) -> Result<SyncOutcome, AppError> {
        let restaurant = restaurant.trim();
        if restaurant.is_empty() {
            return Err(AppError::Validation("Please select a restaurant.".to_string()));
        }

        self.exclusive(restaurant, date, self.reconcile(restaurant, date, orders))
            .await
    }

    /// Run `work` holding the in-flight flag, bounded by the sync timeout
    async fn exclusive<T, F>(&self, restaurant: &str, date: NaiveDate, work: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            tracing::warn!("Sync for {} on {} dropped: another sync is in flight", restaurant, date);
            return Err(AppError::Busy);
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Sync for {} on {} timed out after {:?}", restaurant, date, self.timeout);
                Err(StoreError::Transient(format!("sync timed out after {:?}", self.timeout)).into())
            }
        }
    }

    async fn reconcile(
        &self,
        restaurant: &str,
        date: NaiveDate,
        orders: Vec<OrderInput>,
    ) -> Result<SyncOutcome, AppError> {
        let table = self.layout.table_name(restaurant, date);
        let header = self.layout.header();

        // 1. make sure the table exists
        self.store.ensure_table(&table, header).await?;

        // 2. read the whole table
        let rows = retry_if_missing(self.store.as_ref(), &table, header, || {
            self.store.read_all(&table)
        })
        .await?;

        // 3. split into this partition (dropped) and everything else (kept in order)
        let mut stale = Vec::new();
        let mut kept: Vec<Row> = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if self.layout.matches(&row, restaurant, date) {
                stale.push(index);
            } else {
                kept.push(row);
            }
        }

        // 4. serialize the submitted orders with a fresh timestamp
        let now = Utc::now();
        let fresh: Vec<Row> = orders
            .into_iter()
            .map(|order| self.layout.encode(&order.into_record(restaurant, date, now)))
            .collect();

        // 5. write back
        match self.layout.write_mode() {
            WriteMode::Replace => {
                let mut all = kept.clone();
                all.extend(fresh.iter().cloned());
                retry_if_missing(self.store.as_ref(), &table, header, || {
                    self.store.replace_range(&table, &all)
                })
                .await?;
            }
            WriteMode::DeleteAppend => {
                if !stale.is_empty() {
                    self.store.delete_rows(&table, &stale).await?;
                }
                if !fresh.is_empty() {
                    retry_if_missing(self.store.as_ref(), &table, header, || {
                        self.store.append_rows(&table, &fresh)
                    })
                    .await?;
                }
            }
        }

        let outcome = SyncOutcome {
            table,
            restaurant: restaurant.to_string(),
            date,
            removed: stale.len(),
            kept: kept.len(),
            written: fresh.len(),
        };
        tracing::info!(
            "Synced {} on {}: removed {}, wrote {}, kept {} in {}",
            restaurant,
            date,
            outcome.removed,
            outcome.written,
            outcome.kept,
            outcome.table
        );
        Ok(outcome)
    }

    /// Stored orders of (restaurant, date), in stored order
    pub async fn load(&self, restaurant: &str, date: NaiveDate) -> Result<Vec<OrderRecord>, AppError> {
        let restaurant = restaurant.trim();
        if restaurant.is_empty() {
            return Err(AppError::Validation("Please select a restaurant.".to_string()));
        }
        self.read_partition(restaurant, date).await
    }

    async fn read_partition(&self, restaurant: &str, date: NaiveDate) -> Result<Vec<OrderRecord>, AppError> {
        let table = self.layout.table_name(restaurant, date);
        let header = self.layout.header();
        self.store.ensure_table(&table, header).await?;
        let rows = retry_if_missing(self.store.as_ref(), &table, header, || {
            self.store.read_all(&table)
        })
        .await?;

        Ok(rows
            .iter()
            .filter(|row| self.layout.matches(row, restaurant, date))
            .filter_map(|row| self.layout.decode(&table, row))
            .collect())
    }

    /// Remove the `index`-th stored order of (restaurant, date) and sync the rest.
    ///
    /// The read and the rewrite both run under the in-flight flag.
    pub async fn delete_order(
        &self,
        restaurant: &str,
        date: NaiveDate,
        index: usize,
    ) -> Result<SyncOutcome, AppError> {
        let restaurant = restaurant.trim();
        if restaurant.is_empty() {
            return Err(AppError::Validation("Please select a restaurant.".to_string()));
        }

        self.exclusive(restaurant, date, async {
            let mut orders: Vec<OrderInput> = self
                .read_partition(restaurant, date)
                .await?
                .iter()
                .map(OrderInput::from)
                .collect();

            if index >= orders.len() {
                return Err(AppError::Validation(format!(
                    "No order #{} for {} on {}",
                    index, restaurant, date
                )));
            }
            orders.remove(index);

            self.reconcile(restaurant, date, orders).await
        })
        .await
    }
}
