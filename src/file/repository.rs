//! Stored item repository.

use std::collections::{HashSet, VecDeque};

use sqlx::SqlitePool;
use tracing::debug;

use super::item::{DownloadedFile, NewFile, StoredItem};
use super::FOLDER_CONTENT_TYPE;
use crate::{MechError, Result};

const ITEM_COLUMNS: &str = "id, filename, size, content_type, is_folder, parent_id, created_at";

/// Repository for file and folder rows.
pub struct ItemRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new ItemRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List the direct children of a folder (`None` for the root), in
    /// insertion order.
    pub async fn list_by_parent(&self, parent_id: Option<i64>) -> Result<Vec<StoredItem>> {
        let items = sqlx::query_as::<_, StoredItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stored_items WHERE parent_id IS ? ORDER BY id"
        ))
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Get an item by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<StoredItem>> {
        let item = sqlx::query_as::<_, StoredItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stored_items WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// Get a file and its content. Folders are not returned.
    pub async fn get_file(&self, id: i64) -> Result<Option<DownloadedFile>> {
        let file = sqlx::query_as::<_, DownloadedFile>(
            "SELECT id, filename, content_type, data FROM stored_items
             WHERE id = ? AND is_folder = 0",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }

    /// Create a folder. The parent is not checked for existence.
    pub async fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<StoredItem> {
        let result = sqlx::query(
            "INSERT INTO stored_items (filename, size, content_type, is_folder, parent_id)
             VALUES (?, 0, ?, 1, ?)",
        )
        .bind(name)
        .bind(FOLDER_CONTENT_TYPE)
        .bind(parent_id)
        .execute(self.pool)
        .await?;

        self.fetch_inserted(result.last_insert_rowid()).await
    }

    /// Insert a file, replacing any file with the same name in the same
    /// folder. Folders of that name are left alone.
    ///
    /// Returns the new row and the number of rows replaced.
    pub async fn replace_file(&self, file: &NewFile) -> Result<(StoredItem, u64)> {
        let mut tx = self.pool.begin().await?;

        let replaced = sqlx::query(
            "DELETE FROM stored_items
             WHERE filename = ? AND parent_id IS ? AND is_folder = 0",
        )
        .bind(&file.filename)
        .bind(file.parent_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let result = sqlx::query(
            "INSERT INTO stored_items (filename, size, content_type, data, is_folder, parent_id)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&file.filename)
        .bind(file.data.len() as i64)
        .bind(&file.content_type)
        .bind(&file.data)
        .bind(file.parent_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let item = self.fetch_inserted(result.last_insert_rowid()).await?;
        Ok((item, replaced))
    }

    /// Delete an item and everything beneath it.
    ///
    /// The subtree is collected breadth-first and removed in reverse, so
    /// every child row goes before its container. Returns the number of rows
    /// deleted.
    pub async fn delete_tree(&self, id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM stored_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(MechError::NotFound("item".to_string()));
        }

        let mut order = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            order.push(current);

            let children: Vec<(i64,)> =
                sqlx::query_as("SELECT id FROM stored_items WHERE parent_id = ? ORDER BY id")
                    .bind(current)
                    .fetch_all(&mut *tx)
                    .await?;

            for (child,) in children {
                // parent_id is unchecked, so a malformed tree may loop
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        let mut deleted = 0;
        for item_id in order.iter().rev() {
            deleted += sqlx::query("DELETE FROM stored_items WHERE id = ?")
                .bind(item_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;

        debug!(root = id, deleted, "Deleted item subtree");
        Ok(deleted)
    }

    /// Count all rows.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stored_items")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    async fn fetch_inserted(&self, id: i64) -> Result<StoredItem> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| MechError::NotFound("item".to_string()))
    }
}
