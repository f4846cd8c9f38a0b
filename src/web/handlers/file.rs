//! File and folder handlers for Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::{FileService, UploadRequest};
use crate::web::dto::{
    CreateFolderRequest, FolderSummary, ItemSummary, ListQuery, MessageResponse, UploadResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::MechError;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters (CR, LF) are dropped and quotes and backslashes are
/// replaced in the plain `filename` parameter. Names that needed changing, or
/// are not ASCII, also get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{filename}\"");
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let clean: String = filename.chars().filter(|c| !c.is_control()).collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(&clean)
    )
}

fn file_service(state: &AppState) -> FileService<'_> {
    FileService::new(&state.db).with_max_upload_size(state.max_upload_size)
}

/// Parse the optional `parent_id` multipart field. Empty and `null` mean the
/// root.
fn parse_parent_id(raw: &str) -> Result<Option<i64>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::bad_request("Invalid parent_id"))
}

/// GET /files/list - List a folder's direct children.
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ItemSummary>>, ApiError> {
    let items = file_service(&state).list(query.parent_id).await?;

    Ok(Json(items.iter().map(ItemSummary::from).collect()))
}

/// POST /folders/create - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<Json<FolderSummary>, ApiError> {
    let folder = file_service(&state)
        .create_folder(&req.name, req.parent_id)
        .await?;

    Ok(Json(FolderSummary::from(&folder)))
}

/// POST /files/upload - Upload a file (multipart).
///
/// Fields: `file` (required) and `parent_id` (optional).
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut parent_id: Option<i64> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            tracing::warn!("Failed to read file content: {}", e);
                            ApiError::bad_request("Failed to read file")
                        })?
                        .to_vec(),
                );
            }
            "parent_id" => {
                let raw = field.text().await.map_err(|e| {
                    tracing::warn!("Failed to read parent_id: {}", e);
                    ApiError::bad_request("Invalid parent_id")
                })?;
                parent_id = parse_parent_id(&raw)?;
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let content = content.ok_or_else(|| ApiError::bad_request("No file content"))?;

    let mut request = UploadRequest::new(filename, content).in_folder(parent_id);
    if let Some(content_type) = content_type {
        request = request.with_content_type(content_type);
    }

    let item = file_service(&state).upload(request).await?;

    Ok(Json(UploadResponse {
        filename: item.filename,
    }))
}

/// DELETE /files/delete/{id} - Delete a file, or a folder and its contents.
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    file_service(&state)
        .delete(item_id)
        .await
        .map_err(|e| match e {
            MechError::NotFound(_) => ApiError::not_found("Item not found"),
            e => e.into(),
        })?;

    Ok(Json(MessageResponse::new("Item deleted successfully")))
}

/// GET /files/download/{id} - Download a file's bytes.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> Result<Response, ApiError> {
    let file = file_service(&state)
        .download(item_id)
        .await
        .map_err(|e| match e {
            MechError::NotFound(_) => ApiError::not_found("File not found or is a folder"),
            e => e.into(),
        })?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, &file.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&file.filename),
        )
        .header(header::CONTENT_LENGTH, file.data.len())
        .body(Body::from(file.data))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition_header("bearing.pdf"),
            "attachment; filename=\"bearing.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_strips_crlf() {
        let header = content_disposition_header("evil\r\nSet-Cookie: x=1.txt");
        assert!(!header.contains('\r'));
        assert!(!header.contains('\n'));
        assert!(header.starts_with("attachment; filename=\"evilSet-Cookie: x=1.txt\""));
    }

    #[test]
    fn test_content_disposition_quotes() {
        let header = content_disposition_header("say \"hi\".txt");
        assert!(header.contains("filename=\"say _hi_.txt\""));
        assert!(header.contains("filename*=UTF-8''say%20%22hi%22.txt"));
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let header = content_disposition_header("régua.txt");
        assert!(header.contains("filename*=UTF-8''r%C3%A9gua.txt"));
    }

    #[test]
    fn test_parse_parent_id() {
        assert_eq!(parse_parent_id("").unwrap(), None);
        assert_eq!(parse_parent_id("null").unwrap(), None);
        assert_eq!(parse_parent_id(" 12 ").unwrap(), Some(12));
        assert!(parse_parent_id("abc").is_err());
    }
}
