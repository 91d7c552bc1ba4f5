pub mod aggregate;
pub mod favorites;
pub mod report;
pub mod restaurants;
pub mod sync;

pub use aggregate::{aggregate, render_report};
pub use favorites::{FavoritesService, SaveKind};
pub use report::{ReportService, WeeklyReport};
pub use restaurants::{RestaurantCatalog, DEFAULT_RESTAURANTS};
pub use sync::{OrderSyncService, SyncOutcome};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::TableStore;
use crate::error::StoreError;
use crate::models::TableLayout;

/// All services sharing one table store
#[derive(Clone)]
pub struct Services {
    pub orders: Arc<OrderSyncService>,
    pub reports: Arc<ReportService>,
    pub restaurants: Arc<RestaurantCatalog>,
    pub favorites: Arc<FavoritesService>,
}

impl Services {
    pub fn new(store: Arc<dyn TableStore>, config: &AppConfig) -> Self {
        let layout = TableLayout::from_config(config.store.layout, &config.store.orders_table);
        let timeout = Duration::from_secs(config.sync.timeout_secs);

        Self {
            orders: Arc::new(OrderSyncService::new(store.clone(), layout.clone(), timeout)),
            reports: Arc::new(ReportService::new(
                store.clone(),
                layout,
                &config.store.report_table,
            )),
            restaurants: Arc::new(RestaurantCatalog::new(
                store.clone(),
                &config.store.restaurants_table,
            )),
            favorites: Arc::new(FavoritesService::new(store, &config.store.favorites_table)),
        }
    }
}

/// Run `op`; if the table is missing, create it and retry exactly once
pub(crate) async fn retry_if_missing<T, F, Fut>(
    store: &dyn TableStore,
    table: &str,
    header: &[&str],
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match op().await {
        Err(StoreError::NotFound(_)) => {
            tracing::warn!("Table {} not found, creating it and retrying once", table);
            store.ensure_table(table, header).await?;
            op().await
        }
        other => other,
    }
}
