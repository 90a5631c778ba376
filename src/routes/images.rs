// SPDX-License-Identifier: MIT

//! Image generation, upload, and deletion routes.

use crate::error::{AppError, Result};
use crate::routes::ApiResponse;
use crate::services::{GeneratedImage, ImageService};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/images/generate", post(generate_image))
        .route("/api/images/upload", post(upload_image))
        .route("/api/images/{filename}", delete(delete_image))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    art_style: String,
    #[serde(default)]
    negative_prompt: String,
    seed: Option<u32>,
}

/// Generate one image from a prompt and art style.
async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GeneratedImage>>> {
    let style = ImageService::validate_generate(&body.prompt, &body.art_style)?;

    let generated = state
        .images
        .generate(&body.prompt, style, &body.negative_prompt, body.seed)
        .await?;

    Ok(ApiResponse::of(generated))
}

#[derive(Serialize)]
struct UploadResponse {
    #[serde(rename = "imageUrl")]
    image_url: String,
    filename: String,
    mimetype: String,
    size: usize,
}

/// Upload an image file (multipart field `image`).
async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let mimetype = field.content_type().unwrap_or_default().to_string();
        if !mimetype.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Only image files are allowed".to_string(),
            ));
        }

        let original_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed reading upload: {e}")))?;

        if bytes.len() > state.config.max_file_size {
            return Err(AppError::BadRequest("File too large".to_string()));
        }

        let (image_url, filename) = state
            .images
            .save_upload(&bytes, original_name.as_deref())
            .await?;

        return Ok(ApiResponse::of(UploadResponse {
            image_url,
            filename,
            mimetype,
            size: bytes.len(),
        }));
    }

    Err(AppError::BadRequest("No image file provided".to_string()))
}

/// Delete a stored image by filename.
async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    state.images.delete_image(&filename).await?;
    Ok(ApiResponse::empty())
}
