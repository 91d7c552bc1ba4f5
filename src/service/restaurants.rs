use std::sync::Arc;

use crate::db::TableStore;

/// Offered when the restaurant table is missing, empty or unreachable
pub const DEFAULT_RESTAURANTS: [&str; 5] = [
    "Burger Place",
    "Pizza Corner",
    "Sushi Bar",
    "Taco Shop",
    "Salad Bowl",
];

/// Restaurant names, one per row in the first column
pub struct RestaurantCatalog {
    store: Arc<dyn TableStore>,
    table: String,
}

impl RestaurantCatalog {
    pub fn new(store: Arc<dyn TableStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    pub async fn list(&self) -> Vec<String> {
        let rows = match self.store.read_all(&self.table).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Could not load restaurants from {}: {}, using defaults", self.table, e);
                return defaults();
            }
        };

        let names: Vec<String> = rows
            .iter()
            .filter_map(|row| row.first())
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            tracing::info!("No restaurants in {}, using defaults", self.table);
            return defaults();
        }
        names
    }
}

fn defaults() -> Vec<String> {
    DEFAULT_RESTAURANTS.iter().map(|r| r.to_string()).collect()
}
