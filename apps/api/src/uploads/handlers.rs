use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::warn;

use crate::errors::AppError;
use crate::flows::validation::{check_image_mime, check_image_size, Checks};
use crate::state::AppState;
use crate::uploads::{store_face_image, StoredBlob};

const FILE_FIELD: &str = "file";

/// POST /api/v1/uploads/face
///
/// Multipart form with a single `file` part.
pub async fn handle_upload_face(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StoredBlob>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed upload: {e}");
        AppError::validation(FILE_FIELD, "The upload could not be read.")
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = field.bytes().await.map_err(|e| {
            warn!("Upload body could not be read: {e}");
            AppError::validation(FILE_FIELD, "The upload could not be read.")
        })?;
        upload = Some((content_type, body));
        break;
    }

    let (content_type, body) =
        upload.ok_or_else(|| AppError::validation(FILE_FIELD, "Please upload an image."))?;

    let mut checks = Checks::new();
    checks.check(FILE_FIELD, check_image_size(body.len()));
    let extension = checks.check(FILE_FIELD, check_image_mime(&content_type));
    let extension = checks.finish_with(extension)?;

    let stored = store_face_image(
        &state.s3,
        &state.config.s3_bucket,
        &state.config.s3_public_base_url,
        body,
        &content_type,
        extension,
    )
    .await
    .map_err(|e| AppError::Storage(e.to_string()))?;

    Ok(Json(stored))
}
