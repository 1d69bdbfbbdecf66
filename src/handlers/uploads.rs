use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    routing::post,
};
use tracing::info;

use crate::{
    api::AppState,
    error::AppError,
    models::{
        response::Envelope,
        upload::{DEFAULT_CONTENT_TYPE, FILE_FIELD, UploadedFile, object_key, sanitize_file_name},
    },
};

const PARSE_ERROR: &str = "Error parsing the files";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(upload_file))
}

struct FilePart {
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Stores the multipart `file` field in the object store. Other fields are ignored.
async fn upload_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Envelope<UploadedFile>, AppError> {
    let mut multipart = payload.map_err(|_| AppError::Validation(PARSE_ERROR.to_string()))?;
    let mut part = None;

    while let Some(field) = multipart.next_field().await.map_err(field_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = sanitize_file_name(field.file_name().unwrap_or_default())?;
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let data = field.bytes().await.map_err(field_error)?;

        part = Some(FilePart {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    let part = part.ok_or_else(|| AppError::Validation("File is required".to_string()))?;
    let key = object_key(&part.file_name);
    let size = part.data.len();

    let url = state
        .objects
        .put_object(&key, &part.content_type, part.data)
        .await?;

    info!(key = %key, size, content_type = %part.content_type, "File uploaded");

    Ok(Envelope::success(
        StatusCode::OK,
        format!("File {} uploaded successfully", part.file_name),
        UploadedFile {
            file_name: part.file_name,
            key,
            url,
            size,
            content_type: part.content_type,
        },
    ))
}

fn field_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File exceeds the upload size limit".to_string())
    } else {
        AppError::Validation(PARSE_ERROR.to_string())
    }
}
