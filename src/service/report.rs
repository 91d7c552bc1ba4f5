use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use crate::db::{Row, TableStore};
use crate::error::{AppError, StoreError};
use crate::models::{split_table_name, OrderRecord, TableLayout, WeekWindow, WeeklyStats};
use crate::service::aggregate::{aggregate, render_report};
use crate::service::retry_if_missing;

/// A generated weekly report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub week: WeekWindow,
    pub table: String,
    pub stats: WeeklyStats,
}

/// Builds the weekly report from stored orders
pub struct ReportService {
    store: Arc<dyn TableStore>,
    layout: TableLayout,
    report_table: String,
}

impl ReportService {
    pub fn new(store: Arc<dyn TableStore>, layout: TableLayout, report_table: &str) -> Self {
        Self {
            store,
            layout,
            report_table: report_table.to_string(),
        }
    }

    /// Orders stored for the dates inside `week`, read one table at a time
    pub async fn week_records(&self, week: &WeekWindow) -> Result<Vec<OrderRecord>, StoreError> {
        match &self.layout {
            TableLayout::Shared { table } => {
                let rows = match self.store.read_all(table).await {
                    Ok(rows) => rows,
                    Err(StoreError::NotFound(_)) => {
                        tracing::info!("No {} table yet, reporting an empty week", table);
                        Vec::new()
                    }
                    Err(e) => return Err(e),
                };
                Ok(rows
                    .iter()
                    .filter_map(|row| self.layout.decode(table, row))
                    .filter(|record| week.contains(record.date))
                    .collect())
            }
            TableLayout::PerRestaurant => {
                let mut records = Vec::new();
                for table in self.store.list_tables().await? {
                    let Some((_, date)) = split_table_name(&table) else {
                        continue;
                    };
                    if !week.contains(date) {
                        continue;
                    }
                    let rows = self.store.read_all(&table).await?;
                    records.extend(rows.iter().filter_map(|row| self.layout.decode(&table, row)));
                }
                Ok(records)
            }
        }
    }

    /// Recompute the week containing `today` and overwrite the report table
    pub async fn generate(&self, today: NaiveDate) -> Result<WeeklyReport, AppError> {
        let week = WeekWindow::containing(today);
        let records = self.week_records(&week).await?;
        let stats = aggregate(&records, &week);
        let rows = render_report(&stats, &week);

        // no write at all unless the destination exists
        if let Err(e) = self.store.ensure_table(&self.report_table, &[]).await {
            tracing::error!("Cannot prepare {}: {}, report not written", self.report_table, e);
            return Err(e.into());
        }
        retry_if_missing(self.store.as_ref(), &self.report_table, &[], || {
            self.store.replace_range(&self.report_table, &rows)
        })
        .await?;

        tracing::info!(
            "Weekly report for {} written: {} orders, total {}",
            week.label(),
            stats.total_orders,
            stats.total_amount
        );

        Ok(WeeklyReport {
            week,
            table: self.report_table.clone(),
            stats,
        })
    }

    /// Render the week containing `today` as CSV without touching the report table
    pub async fn export_csv(&self, today: NaiveDate) -> Result<String, AppError> {
        let week = WeekWindow::containing(today);
        let records = self.week_records(&week).await?;
        let rows = render_report(&aggregate(&records, &week), &week);
        to_csv(&rows)
    }
}

/// Serialize report rows; rows may differ in width
fn to_csv(rows: &[Row]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{LayoutKind, OrderInput};
    use crate::service::OrderSyncService;
    use async_trait::async_trait;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    async fn seeded(layout: TableLayout) -> (Arc<MemoryStore>, ReportService) {
        let store = Arc::new(MemoryStore::new());
        let orders = OrderSyncService::new(store.clone(), layout.clone(), Duration::from_secs(5));
        orders
            .sync("A", day(3), vec![OrderInput::new("Alice", "Burger", "10")])
            .await
            .unwrap();
        orders
            .sync("B", day(4), vec![OrderInput::new("Bob", "Pizza", "12")])
            .await
            .unwrap();
        // previous week
        orders
            .sync("A", day(1), vec![OrderInput::new("Alice", "Burger", "99")])
            .await
            .unwrap();

        let reports = ReportService::new(store.clone(), layout, "Weekly Report");
        (store, reports)
    }

    #[tokio::test]
    async fn generate_writes_report_for_current_week() {
        let (store, reports) =
            seeded(TableLayout::from_config(LayoutKind::Shared, "Orders")).await;

        let report = reports.generate(day(5)).await.unwrap();

        assert_eq!(report.stats.total_orders, 2);
        assert_eq!(report.stats.total_amount, bigdecimal::BigDecimal::from(22));
        let written = store.read_all("Weekly Report").await.unwrap();
        assert_eq!(written[0][0], "Weekly Report");
        assert!(written.contains(&vec!["Total Orders".to_string(), "2".to_string()]));
    }

    #[tokio::test]
    async fn per_restaurant_layout_reads_tables_of_the_week() {
        let (_, reports) = seeded(TableLayout::PerRestaurant).await;

        let report = reports.generate(day(5)).await.unwrap();

        assert_eq!(report.stats.total_orders, 2);
        assert_eq!(report.stats.orders_by_restaurant.get("B"), Some(&1));
    }

    #[tokio::test]
    async fn regenerating_replaces_the_previous_report() {
        let (store, reports) =
            seeded(TableLayout::from_config(LayoutKind::Shared, "Orders")).await;

        reports.generate(day(5)).await.unwrap();
        let first = store.read_all("Weekly Report").await.unwrap();
        reports.generate(day(5)).await.unwrap();

        assert_eq!(store.read_all("Weekly Report").await.unwrap(), first);
    }

    #[tokio::test]
    async fn empty_store_reports_zero_orders() {
        let store = Arc::new(MemoryStore::new());
        let reports = ReportService::new(
            store,
            TableLayout::from_config(LayoutKind::Shared, "Orders"),
            "Weekly Report",
        );

        let report = reports.generate(day(5)).await.unwrap();
        assert_eq!(report.stats, WeeklyStats::default());
    }

    #[tokio::test]
    async fn csv_export_renders_without_writing() {
        let (store, reports) =
            seeded(TableLayout::from_config(LayoutKind::Shared, "Orders")).await;

        let csv = reports.export_csv(day(5)).await.unwrap();

        assert!(csv.starts_with("Weekly Report,\"Jun 2, 2024 to Jun 8, 2024\""));
        assert!(csv.contains("Total Orders,2"));
        assert!(csv.contains("2024-06-04,$12.00"));
        assert!(store.read_all("Weekly Report").await.is_err());
    }

    /// Refuses to create tables
    struct LockedStore(MemoryStore);

    #[async_trait]
    impl TableStore for LockedStore {
        async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
            self.0.list_tables().await
        }
        async fn ensure_table(&self, name: &str, _header: &[&str]) -> Result<bool, StoreError> {
            Err(StoreError::Permission(name.to_string()))
        }
        async fn read_all(&self, name: &str) -> Result<Vec<Row>, StoreError> {
            self.0.read_all(name).await
        }
        async fn replace_range(&self, name: &str, rows: &[Row]) -> Result<(), StoreError> {
            self.0.replace_range(name, rows).await
        }
        async fn delete_rows(&self, name: &str, indexes: &[usize]) -> Result<(), StoreError> {
            self.0.delete_rows(name, indexes).await
        }
        async fn append_rows(&self, name: &str, rows: &[Row]) -> Result<(), StoreError> {
            self.0.append_rows(name, rows).await
        }
    }

    #[tokio::test]
    async fn unreachable_report_table_aborts_without_writing() {
        let inner = MemoryStore::new();
        inner.ensure_table("Orders", &[]).await.unwrap();
        let store = Arc::new(LockedStore(inner));
        let reports = ReportService::new(
            store.clone(),
            TableLayout::from_config(LayoutKind::Shared, "Orders"),
            "Weekly Report",
        );

        let err = reports.generate(day(5)).await.unwrap_err();

        assert!(matches!(err, AppError::Store(StoreError::Permission(_))));
        assert_eq!(store.list_tables().await.unwrap(), vec!["Orders".to_string()]);
    }
}
