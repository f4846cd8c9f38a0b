//! Hierarchical file store.
//!
//! Files and folders share one table; a folder is a row with `is_folder` set
//! and other rows point at it through `parent_id`. A `NULL` parent is the
//! root.

mod item;
mod repository;
mod service;

pub use item::{format_size, DownloadedFile, NewFile, StoredItem};
pub use repository::ItemRepository;
pub use service::{FileService, UploadRequest};

/// Content type recorded for folder rows.
pub const FOLDER_CONTENT_TYPE: &str = "application/x-directory";

/// Content type used when none is supplied and none can be guessed.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Default maximum upload size (10MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;
