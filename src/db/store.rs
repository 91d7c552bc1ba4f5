use async_trait::async_trait;

use crate::error::StoreError;

/// One data row: ordered text cells
pub type Row = Vec<String>;

/// Row-level access to named tables ("sheets").
///
/// Row indexes are zero-based over data rows; the header row is never
/// returned or addressed. Every operation on a missing table fails with
/// [`StoreError::NotFound`] except `ensure_table` and `list_tables`.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Create `name` with `header` unless it exists. Returns whether it was created.
    /// An empty header creates a table without a header row.
    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<bool, StoreError>;

    /// All data rows, oldest appended first
    async fn read_all(&self, name: &str) -> Result<Vec<Row>, StoreError>;

    /// Clear every data row and write `rows` in order
    async fn replace_range(&self, name: &str, rows: &[Row]) -> Result<(), StoreError>;

    /// Remove rows by index, processed highest to lowest
    async fn delete_rows(&self, name: &str, indexes: &[usize]) -> Result<(), StoreError>;

    /// Add rows after the existing data
    async fn append_rows(&self, name: &str, rows: &[Row]) -> Result<(), StoreError>;
}

/// Deduplicated indexes, highest first. Fails if any index is past `len`.
pub fn descending_indexes(
    table: &str,
    indexes: &[usize],
    len: usize,
) -> Result<Vec<usize>, StoreError> {
    let mut sorted = indexes.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    if let Some(&index) = sorted.first().filter(|&&i| i >= len) {
        return Err(StoreError::RowOutOfRange {
            table: table.to_string(),
            index,
        });
    }

    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_are_sorted_high_to_low_without_duplicates() {
        assert_eq!(descending_indexes("t", &[1, 4, 1, 2], 5).unwrap(), vec![4, 2, 1]);
        assert!(descending_indexes("t", &[], 0).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let err = descending_indexes("Orders", &[0, 3], 3).unwrap_err();
        assert_eq!(
            err,
            StoreError::RowOutOfRange {
                table: "Orders".into(),
                index: 3
            }
        );
    }
}
