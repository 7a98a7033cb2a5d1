use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use common::types::Message;
use service::file::uploads::{FileMetadata, UploadInput};
use tracing::{debug, info};

use crate::errors::JsonApiError;
use crate::routes::Saved;
use crate::state::UploadState;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

pub async fn root() -> Json<Message> {
    Json(Message::new("File Upload API is running"))
}

/// Receive the `file` field in full, then hand it to the store, which
/// applies the size check before anything is written.
pub async fn upload_file(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Saved<FileMetadata>>, JsonApiError> {
    let mut multipart = multipart?;
    let mut input: Option<UploadInput> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JsonApiError::from_multipart(e, state.limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "skipping multipart field");
            continue;
        }
        let original_filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| JsonApiError::validation("Field 'file' must be a file upload"))?;
        let content_type = field.content_type().map(str::to_string);
        let payload = field
            .bytes()
            .await
            .map_err(|e| JsonApiError::from_multipart(e, state.limit))?;

        input = Some(UploadInput { original_filename, content_type, payload: payload.to_vec() });
        break;
    }

    let input = input.ok_or_else(|| JsonApiError::validation("Field required: file"))?;
    let meta = state.store.upload(input).await?;
    info!(id = %meta.id, file_size = meta.file_size, "file uploaded");
    Ok(Json(Saved::new(meta, "File uploaded successfully")))
}

pub async fn list_files(
    State(state): State<UploadState>,
) -> Result<Json<Vec<FileMetadata>>, JsonApiError> {
    Ok(Json(state.store.list().await?))
}

pub async fn get_file(
    State(state): State<UploadState>,
    Path(id): Path<String>,
) -> Result<Json<FileMetadata>, JsonApiError> {
    Ok(Json(state.store.get(&id).await?))
}
