use async_trait::async_trait;
use dashmap::DashMap;

use crate::db::store::{descending_indexes, Row, TableStore};
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
struct Sheet {
    header: Vec<String>,
    rows: Vec<Row>,
}

/// Table store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: DashMap<String, Sheet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header row of `name`, if the table exists
    pub fn header(&self, name: &str) -> Option<Vec<String>> {
        self.sheets.get(name).map(|s| s.header.clone())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.sheets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<bool, StoreError> {
        let mut created = false;
        self.sheets.entry(name.to_string()).or_insert_with(|| {
            created = true;
            Sheet {
                header: header.iter().map(|h| h.to_string()).collect(),
                rows: Vec::new(),
            }
        });
        if created {
            tracing::debug!("Created table {}", name);
        }
        Ok(created)
    }

    async fn read_all(&self, name: &str) -> Result<Vec<Row>, StoreError> {
        self.sheets
            .get(name)
            .map(|s| s.rows.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn replace_range(&self, name: &str, rows: &[Row]) -> Result<(), StoreError> {
        let mut sheet = self
            .sheets
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        sheet.rows = rows.to_vec();
        Ok(())
    }

    async fn delete_rows(&self, name: &str, indexes: &[usize]) -> Result<(), StoreError> {
        let mut sheet = self
            .sheets
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        for index in descending_indexes(name, indexes, sheet.rows.len())? {
            sheet.rows.remove(index);
        }
        Ok(())
    }

    async fn append_rows(&self, name: &str, rows: &[Row]) -> Result<(), StoreError> {
        let mut sheet = self
            .sheets
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        sheet.rows.extend_from_slice(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn ensure_table_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.ensure_table("Orders", &["Name", "Order"]).await.unwrap());
        store.append_rows("Orders", &[row(&["Alice", "Soup"])]).await.unwrap();

        assert!(!store.ensure_table("Orders", &["Other"]).await.unwrap());
        assert_eq!(store.header("Orders").unwrap(), vec!["Name", "Order"]);
        assert_eq!(store.read_all("Orders").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let store = MemoryStore::new();
        let err = store.read_all("Nope").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("Nope".into()));
        assert!(store.append_rows("Nope", &[]).await.is_err());
    }

    #[tokio::test]
    async fn delete_rows_removes_exactly_the_given_indexes() {
        let store = MemoryStore::new();
        store.ensure_table("T", &[]).await.unwrap();
        let rows: Vec<Row> = ["a", "b", "c", "d", "e"].iter().map(|c| row(&[c])).collect();
        store.append_rows("T", &rows).await.unwrap();

        store.delete_rows("T", &[1, 3]).await.unwrap();

        let left = store.read_all("T").await.unwrap();
        assert_eq!(left, vec![row(&["a"]), row(&["c"]), row(&["e"])]);
    }

    #[tokio::test]
    async fn out_of_range_delete_leaves_rows_untouched() {
        let store = MemoryStore::new();
        store.ensure_table("T", &[]).await.unwrap();
        store.append_rows("T", &[row(&["a"]), row(&["b"])]).await.unwrap();

        assert!(store.delete_rows("T", &[0, 2]).await.is_err());
        assert_eq!(store.read_all("T").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn replace_range_clears_previous_rows() {
        let store = MemoryStore::new();
        store.ensure_table("T", &["H"]).await.unwrap();
        store.append_rows("T", &[row(&["old"])]).await.unwrap();

        store.replace_range("T", &[row(&["x"]), row(&["y"])]).await.unwrap();

        assert_eq!(store.read_all("T").await.unwrap(), vec![row(&["x"]), row(&["y"])]);
        assert_eq!(store.list_tables().await.unwrap(), vec!["T".to_string()]);
    }
}
