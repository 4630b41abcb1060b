use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ApiResponse, BatchResponse, UploadedFile};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
};
use bytes::BytesMut;

/// Multipart field that carries the files
pub const FILES_FIELD: &str = "images";

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = Multipart, description = "Up to 5 files in the `images` field"),
    responses(
        (status = 200, description = "Batch processed; inspect failedUploads for per-file outcomes", body = BatchResponse),
        (status = 400, description = "No files, too many files or malformed body"),
        (status = 413, description = "A file exceeds the size limit")
    ),
    tag = "upload"
)]
pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<BatchResponse>>, AppError> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let files = read_files(
        multipart,
        state.config.max_files,
        state.config.max_file_size,
    )
    .await?;

    if files.is_empty() {
        return Err(AppError::NoFiles);
    }

    tracing::info!("Processing batch of {} file(s)", files.len());
    let batch = state.upload_service.process_batch(files).await;

    Ok(Json(ApiResponse::ok(batch.summary(), batch)))
}

/// Buffer every file part, enforcing the count and per-file size limits as
/// the body is read.
async fn read_files(
    mut multipart: Multipart,
    max_files: usize,
    max_file_size: usize,
) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILES_FIELD) {
            tracing::debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let Some(original_name) = field.file_name().map(|n| n.to_string()) else {
            return Err(AppError::BadRequest(format!(
                "Field '{}' must contain files",
                FILES_FIELD
            )));
        };

        if files.len() == max_files {
            return Err(AppError::TooManyFiles(max_files));
        }

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if buffer.len() + chunk.len() > max_file_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "'{}' exceeds the {} byte limit",
                    original_name, max_file_size
                )));
            }
            buffer.extend_from_slice(&chunk);
        }

        files.push(UploadedFile::new(original_name, buffer.freeze()));
    }

    Ok(files)
}

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}
