//! Stored item types.

use chrono::{DateTime, Utc};

/// A file or folder row, without its content.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredItem {
    /// Unique item ID.
    pub id: i64,
    /// Display name.
    pub filename: String,
    /// Content length in bytes (0 for folders).
    pub size: i64,
    /// MIME type, or the directory marker for folders.
    pub content_type: String,
    /// Whether this row is a folder.
    pub is_folder: bool,
    /// Containing folder, `None` at the root.
    pub parent_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
}

impl StoredItem {
    /// Human-readable size, `-` for folders.
    pub fn size_label(&self) -> String {
        if self.is_folder {
            "-".to_string()
        } else {
            format_size(self.size)
        }
    }

    /// Get the created_at as DateTime<Utc>.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        crate::db::parse_timestamp(&self.created_at)
    }

    /// Type shown in listings: `folder` or the content type.
    pub fn type_label(&self) -> &str {
        if self.is_folder {
            "folder"
        } else {
            &self.content_type
        }
    }
}

/// A file row together with its bytes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DownloadedFile {
    /// Unique item ID.
    pub id: i64,
    /// Display name, used as the attachment filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// File content.
    pub data: Vec<u8>,
}

/// Data for inserting a file.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Display name.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// File content.
    pub data: Vec<u8>,
    /// Containing folder, `None` at the root.
    pub parent_id: Option<i64>,
}

impl NewFile {
    /// Create a new root-level file.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
            parent_id: None,
        }
    }

    /// Place the file inside a folder.
    pub fn in_folder(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Format a byte count as `N B`, `X.Y KB` or `X.Y MB`.
///
/// ```
/// use mechdept::file::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
/// ```
pub fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
