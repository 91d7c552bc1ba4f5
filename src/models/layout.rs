use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Row;
use crate::models::order::{parse_price, OrderRecord, DATE_FORMAT};

pub const SHARED_HEADER: [&str; 6] = ["Date", "Restaurant", "Name", "Order", "Price", "Timestamp"];
pub const PER_RESTAURANT_HEADER: [&str; 4] = ["Name", "Order", "Price", "Timestamp"];

/// Which row layout orders are kept in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    /// One shared table keyed by Date + Restaurant columns
    #[default]
    Shared,
    /// One table per restaurant and day
    PerRestaurant,
}

/// How a sync writes its final row set back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    DeleteAppend,
}

/// Maps orders to and from table rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLayout {
    Shared { table: String },
    PerRestaurant,
}

impl TableLayout {
    pub fn from_config(kind: LayoutKind, orders_table: &str) -> Self {
        match kind {
            LayoutKind::Shared => TableLayout::Shared {
                table: orders_table.to_string(),
            },
            LayoutKind::PerRestaurant => TableLayout::PerRestaurant,
        }
    }

    pub fn kind(&self) -> LayoutKind {
        match self {
            TableLayout::Shared { .. } => LayoutKind::Shared,
            TableLayout::PerRestaurant => LayoutKind::PerRestaurant,
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            TableLayout::Shared { .. } => &SHARED_HEADER,
            TableLayout::PerRestaurant => &PER_RESTAURANT_HEADER,
        }
    }

    pub fn write_mode(&self) -> WriteMode {
        match self {
            TableLayout::Shared { .. } => WriteMode::DeleteAppend,
            TableLayout::PerRestaurant => WriteMode::Replace,
        }
    }

    /// Table holding the (restaurant, date) partition
    pub fn table_name(&self, restaurant: &str, date: NaiveDate) -> String {
        match self {
            TableLayout::Shared { table } => table.clone(),
            TableLayout::PerRestaurant => {
                format!("{}_{}", restaurant, date.format(DATE_FORMAT))
            }
        }
    }

    /// Whether a stored row belongs to the (restaurant, date) partition.
    /// Keys compare as exact strings.
    pub fn matches(&self, row: &[String], restaurant: &str, date: NaiveDate) -> bool {
        match self {
            TableLayout::Shared { .. } => {
                let date = date.format(DATE_FORMAT).to_string();
                row.first().map(String::as_str) == Some(date.as_str())
                    && row.get(1).map(String::as_str) == Some(restaurant)
            }
            // the table itself is the partition
            TableLayout::PerRestaurant => true,
        }
    }

    pub fn encode(&self, record: &OrderRecord) -> Row {
        let timestamp = record
            .timestamp
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();

        match self {
            TableLayout::Shared { .. } => vec![
                record.date.format(DATE_FORMAT).to_string(),
                record.restaurant.clone(),
                record.person.clone(),
                record.order_text.clone(),
                record.price.to_string(),
                timestamp,
            ],
            TableLayout::PerRestaurant => vec![
                record.person.clone(),
                record.order_text.clone(),
                record.price.to_string(),
                timestamp,
            ],
        }
    }

    /// Decode a stored row read from `table`. Rows without a usable date are skipped.
    pub fn decode(&self, table: &str, row: &[String]) -> Option<OrderRecord> {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();

        match self {
            TableLayout::Shared { .. } => {
                let date = NaiveDate::parse_from_str(row.first()?.trim(), DATE_FORMAT).ok()?;
                Some(OrderRecord {
                    date,
                    restaurant: cell(1),
                    person: cell(2),
                    order_text: cell(3),
                    price: parse_price(&cell(4)),
                    timestamp: parse_timestamp(&cell(5)),
                })
            }
            TableLayout::PerRestaurant => {
                let (restaurant, date) = split_table_name(table)?;
                Some(OrderRecord {
                    date,
                    restaurant: restaurant.to_string(),
                    person: cell(0),
                    order_text: cell(1),
                    price: parse_price(&cell(2)),
                    timestamp: parse_timestamp(&cell(3)),
                })
            }
        }
    }
}

/// Split a per-restaurant table name `{restaurant}_{YYYY-MM-DD}`
pub fn split_table_name(table: &str) -> Option<(&str, NaiveDate)> {
    let (restaurant, date) = table.rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    Some((restaurant, date))
}

fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(cell.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
