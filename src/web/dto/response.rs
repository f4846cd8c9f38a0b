//! Response DTOs for Web API.

use serde::Serialize;

use crate::db::User;
use crate::file::StoredItem;

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role (`student` or `teacher`).
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
        }
    }
}

/// One row of a folder listing.
#[derive(Debug, Serialize)]
pub struct ItemSummary {
    /// Item ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Human-readable size, `-` for folders.
    pub size: String,
    /// Content type, or `folder`.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Whether the item is a folder.
    pub is_folder: bool,
    /// Containing folder.
    pub parent_id: Option<i64>,
}

impl From<&StoredItem> for ItemSummary {
    fn from(item: &StoredItem) -> Self {
        Self {
            id: item.id,
            name: item.filename.clone(),
            size: item.size_label(),
            item_type: item.type_label().to_string(),
            is_folder: item.is_folder,
            parent_id: item.parent_id,
        }
    }
}

/// Newly created folder.
#[derive(Debug, Serialize)]
pub struct FolderSummary {
    /// Folder ID.
    pub id: i64,
    /// Folder name.
    pub name: String,
    /// Always `true`.
    pub is_folder: bool,
}

impl From<&StoredItem> for FolderSummary {
    fn from(item: &StoredItem) -> Self {
        Self {
            id: item.id,
            name: item.filename.clone(),
            is_folder: item.is_folder,
        }
    }
}

/// Upload result.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Stored filename.
    pub filename: String,
}

/// Plain confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(is_folder: bool) -> StoredItem {
        StoredItem {
            id: 7,
            filename: "spindle.pdf".to_string(),
            size: if is_folder { 0 } else { 2560 },
            content_type: if is_folder {
                "application/x-directory".to_string()
            } else {
                "application/pdf".to_string()
            },
            is_folder,
            parent_id: Some(3),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_item_summary_file() {
        let json = serde_json::to_value(ItemSummary::from(&stored(false))).unwrap();
        assert_eq!(json["name"], "spindle.pdf");
        assert_eq!(json["size"], "2.5 KB");
        assert_eq!(json["type"], "application/pdf");
        assert_eq!(json["is_folder"], false);
        assert_eq!(json["parent_id"], 3);
    }

    #[test]
    fn test_item_summary_folder() {
        let json = serde_json::to_value(ItemSummary::from(&stored(true))).unwrap();
        assert_eq!(json["size"], "-");
        assert_eq!(json["type"], "folder");
        assert_eq!(json["is_folder"], true);
    }

    #[test]
    fn test_folder_summary_fields() {
        let json = serde_json::to_value(FolderSummary::from(&stored(true))).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "spindle.pdf");
        assert_eq!(json["is_folder"], true);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_message_response_is_flat() {
        let json = serde_json::to_value(MessageResponse::new("ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "ok" }));
    }
}
