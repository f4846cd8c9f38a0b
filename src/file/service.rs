//! File service.
//!
//! Applies the upload size limit and content-type defaults on top of
//! [`ItemRepository`].

use tracing::info;

use super::item::{DownloadedFile, NewFile, StoredItem};
use super::repository::ItemRepository;
use super::{DEFAULT_CONTENT_TYPE, DEFAULT_MAX_UPLOAD_SIZE};
use crate::db::Database;
use crate::{MechError, Result};

/// Request data for a file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original filename.
    pub filename: String,
    /// Content type sent by the client, if any.
    pub content_type: Option<String>,
    /// File content.
    pub content: Vec<u8>,
    /// Destination folder, `None` for the root.
    pub parent_id: Option<i64>,
}

impl UploadRequest {
    /// Create a new root-level upload request.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            content,
            parent_id: None,
        }
    }

    /// Set the client-supplied content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the destination folder.
    pub fn in_folder(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// File service for listing, uploading, downloading and deleting items.
pub struct FileService<'a> {
    db: &'a Database,
    max_upload_size: u64,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Create a new FileService with a custom upload limit.
    pub fn with_max_upload_size(mut self, max_size: u64) -> Self {
        self.max_upload_size = max_size;
        self
    }

    fn repo(&self) -> ItemRepository<'a> {
        ItemRepository::new(self.db.pool())
    }

    /// List the children of a folder (`None` for the root).
    pub async fn list(&self, parent_id: Option<i64>) -> Result<Vec<StoredItem>> {
        self.repo().list_by_parent(parent_id).await
    }

    /// Create a folder.
    pub async fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<StoredItem> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MechError::Validation(
                "folder name must not be empty".to_string(),
            ));
        }

        let folder = self.repo().create_folder(name, parent_id).await?;
        info!(folder_id = folder.id, parent_id = ?parent_id, name, "Folder created");
        Ok(folder)
    }

    /// Upload a file, replacing a file of the same name in the same folder.
    ///
    /// # Validation
    /// - Filename: non-empty
    /// - File size: at most the configured limit (default 10MB)
    pub async fn upload(&self, request: UploadRequest) -> Result<StoredItem> {
        if request.filename.trim().is_empty() {
            return Err(MechError::Validation(
                "filename must not be empty".to_string(),
            ));
        }

        if request.content.len() as u64 > self.max_upload_size {
            let max_mb = self.max_upload_size / 1024 / 1024;
            return Err(MechError::Validation(format!(
                "file too large (max {max_mb}MB)"
            )));
        }

        let content_type = resolve_content_type(&request.filename, request.content_type.as_deref());
        let new_file = NewFile::new(request.filename, content_type, request.content)
            .in_folder(request.parent_id);

        let (item, replaced) = self.repo().replace_file(&new_file).await?;

        info!(
            item_id = item.id,
            parent_id = ?item.parent_id,
            filename = %item.filename,
            size = item.size,
            replaced,
            "File uploaded"
        );

        Ok(item)
    }

    /// Fetch a file's content. Missing items and folders are not found.
    pub async fn download(&self, item_id: i64) -> Result<DownloadedFile> {
        self.repo()
            .get_file(item_id)
            .await?
            .ok_or_else(|| MechError::NotFound("file".to_string()))
    }

    /// Delete an item and, for folders, everything beneath it.
    pub async fn delete(&self, item_id: i64) -> Result<u64> {
        let deleted = self.repo().delete_tree(item_id).await?;
        info!(item_id, deleted, "Item deleted");
        Ok(deleted)
    }
}

/// Pick the stored content type: the client's value if present, otherwise a
/// guess from the file extension.
fn resolve_content_type(filename: &str, supplied: Option<&str>) -> String {
    match supplied.map(str::trim) {
        Some(ct) if !ct.is_empty() => ct.to_string(),
        _ => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
    }
}
