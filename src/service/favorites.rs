use serde::Serialize;
use std::sync::Arc;

use crate::db::{Row, TableStore};
use crate::error::AppError;
use crate::models::{Favorite, FAVORITES_HEADER};
use crate::service::retry_if_missing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveKind {
    Created,
    Updated,
}

/// Saved favorite orders, one per (name, restaurant)
pub struct FavoritesService {
    store: Arc<dyn TableStore>,
    table: String,
}

impl FavoritesService {
    pub fn new(store: Arc<dyn TableStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    async fn read_rows(&self) -> Result<Vec<Row>, AppError> {
        self.store.ensure_table(&self.table, &FAVORITES_HEADER).await?;
        let rows = retry_if_missing(self.store.as_ref(), &self.table, &FAVORITES_HEADER, || {
            self.store.read_all(&self.table)
        })
        .await?;
        Ok(rows)
    }

    /// Row index of the favorite for (name, restaurant), skipping rows that
    /// are not favorites
    fn position(rows: &[Row], name: &str, restaurant: &str) -> Option<usize> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| Favorite::from_row(row).map(|f| (index, f)))
            .find(|(_, f)| f.is_same(name, restaurant))
            .map(|(index, _)| index)
    }

    /// All favorites sorted by restaurant
    pub async fn list(&self) -> Result<Vec<Favorite>, AppError> {
        let rows = self.read_rows().await?;
        let mut favorites: Vec<Favorite> = rows.iter().filter_map(|row| Favorite::from_row(row)).collect();
        favorites.sort_by(|a, b| a.restaurant.cmp(&b.restaurant));
        Ok(favorites)
    }

    /// Insert or overwrite the favorite for (name, restaurant)
    pub async fn save(&self, mut favorite: Favorite) -> Result<SaveKind, AppError> {
        favorite.name = favorite.name.trim().to_string();
        favorite.restaurant = favorite.restaurant.trim().to_string();
        favorite.order = favorite.order.trim().to_string();
        if favorite.name.is_empty() || favorite.order.is_empty() || favorite.restaurant.is_empty() {
            return Err(AppError::Validation(
                "Please enter your name, order, and select a restaurant before saving as a favorite."
                    .to_string(),
            ));
        }

        let mut rows = self.read_rows().await?;
        let kind = match Self::position(&rows, &favorite.name, &favorite.restaurant) {
            Some(index) => {
                // rewrite in place; rows that are not favorites stay where they are
                rows[index] = favorite.to_row();
                self.store.replace_range(&self.table, &rows).await?;
                SaveKind::Updated
            }
            None => {
                self.store.append_rows(&self.table, &[favorite.to_row()]).await?;
                SaveKind::Created
            }
        };

        tracing::info!(
            "Favorite {:?} for {} at {}",
            kind,
            favorite.name,
            favorite.restaurant
        );
        Ok(kind)
    }

    /// Returns whether a favorite was removed
    pub async fn remove(&self, name: &str, restaurant: &str) -> Result<bool, AppError> {
        let rows = self.read_rows().await?;
        let Some(index) = Self::position(&rows, name, restaurant) else {
            return Ok(false);
        };

        self.store.delete_rows(&self.table, &[index]).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use bigdecimal::BigDecimal;

    fn favorite(name: &str, restaurant: &str, order: &str, price: i32) -> Favorite {
        Favorite {
            name: name.into(),
            restaurant: restaurant.into(),
            order: order.into(),
            price: BigDecimal::from(price),
        }
    }

    fn service() -> FavoritesService {
        FavoritesService::new(Arc::new(MemoryStore::new()), "Favorites")
    }

    #[tokio::test]
    async fn save_upserts_by_name_and_restaurant() {
        let svc = service();

        let first = svc.save(favorite("Alice", "Taco Shop", "Burrito", 9)).await.unwrap();
        let second = svc.save(favorite("Alice", "Taco Shop", "Nachos", 7)).await.unwrap();
        let other = svc.save(favorite("Alice", "Pizza Corner", "Margherita", 11)).await.unwrap();

        assert_eq!(first, SaveKind::Created);
        assert_eq!(second, SaveKind::Updated);
        assert_eq!(other, SaveKind::Created);

        let all = svc.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].restaurant, "Pizza Corner");
        assert_eq!(all[1].order, "Nachos");
    }

    #[tokio::test]
    async fn incomplete_favorite_is_rejected() {
        let err = service()
            .save(favorite("Alice", " ", "Burrito", 9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn remove_deletes_only_the_matching_favorite() {
        let svc = service();
        svc.save(favorite("Alice", "Taco Shop", "Burrito", 9)).await.unwrap();
        svc.save(favorite("Bob", "Taco Shop", "Tacos", 8)).await.unwrap();

        assert!(svc.remove("Alice", "Taco Shop").await.unwrap());
        assert!(!svc.remove("Alice", "Taco Shop").await.unwrap());

        let names: Vec<String> = svc.list().await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Bob"]);
    }

    #[tokio::test]
    async fn stray_rows_do_not_shift_which_favorite_is_touched() {
        let store = Arc::new(MemoryStore::new());
        store.ensure_table("Favorites", &FAVORITES_HEADER).await.unwrap();
        store
            .append_rows(
                "Favorites",
                &[
                    vec![],
                    favorite("Alice", "Taco Shop", "Burrito", 1).to_row(),
                    favorite("Bob", "Taco Shop", "Tacos", 1).to_row(),
                ],
            )
            .await
            .unwrap();
        let svc = FavoritesService::new(store.clone(), "Favorites");

        let kind = svc.save(favorite("Alice", "Taco Shop", "Nachos", 7)).await.unwrap();
        assert_eq!(kind, SaveKind::Updated);
        assert!(svc.remove("Bob", "Taco Shop").await.unwrap());

        let rows = store.read_all("Favorites").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], favorite("Alice", "Taco Shop", "Nachos", 7).to_row());
    }
}
