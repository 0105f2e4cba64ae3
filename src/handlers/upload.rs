use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use serde_json::json;

use crate::errors::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

fn bad_multipart(err: MultipartError) -> AppError {
    log::debug!("Failed to read multipart data: {}", err);
    AppError::BadRequest(format!("Failed to read multipart data: {}", err))
}

/// Reads the `file` field, enforcing the image type and size limit while
/// streaming so oversized bodies are rejected early.
async fn read_image(payload: &mut Multipart) -> Result<Option<(String, Vec<u8>)>> {
    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .filter(|mime| mime.type_().as_str() == "image")
            .map(|mime| mime.to_string())
            .ok_or_else(|| AppError::BadRequest("File must be an image".to_string()))?;

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest(
                    "File size must be less than 5MB".to_string(),
                ));
            }
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Ok(None);
        }
        return Ok(Some((content_type, data)));
    }
    Ok(None)
}

pub async fn upload_image(
    _admin: RequireAdmin,
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let (content_type, data) = read_image(&mut payload)
        .await?
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let size = data.len();
    let url = state.media.upload(data, &content_type).await?;

    log::info!(
        "Uploaded {} byte {} image to {}",
        size,
        content_type,
        state.media.folder()
    );
    Ok(HttpResponse::Ok().json(json!({ "url": url })))
}
