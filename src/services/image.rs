// SPDX-License-Identifier: MIT

//! Image generation via the Segmind API, plus local asset storage.
//!
//! Handles:
//! - Prompt enrichment with style modifiers and quality negative prompts
//! - The single outbound txt2img call (no retry; one failure is terminal)
//! - Saving generated/uploaded bytes under UUID filenames
//! - Asset deletion with a directory-traversal guard

use crate::config::Config;
use crate::error::{AppError, FieldError};
use crate::models::ArtStyle;
use anyhow::Context;
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROMPT_MIN_CHARS: usize = 3;
const PROMPT_MAX_CHARS: usize = 1000;

/// Quality-degrading terms appended to every negative prompt to
/// suppress known failure modes of the underlying model.
const NEGATIVE_PROMPT_SUFFIX: &str = "deformed, distorted, disfigured, poorly drawn, bad anatomy, \
    wrong anatomy, extra limb, missing limb, floating limbs, disconnected limbs, mutation, \
    mutated, ugly, disgusting, blurry, out of focus";

/// Fixed per-style modifier phrases.
pub fn style_modifier(style: ArtStyle) -> &'static str {
    match style {
        ArtStyle::Realistic => "photorealistic, detailed, high resolution",
        ArtStyle::Cartoon => "cartoon style, vibrant colors, simplified shapes",
        ArtStyle::Watercolor => "watercolor painting, soft edges, flowing colors",
        ArtStyle::Pixar => "Pixar animation style, 3D, colorful, expressive",
        ArtStyle::Anime => "anime style, cel shaded, vibrant, detailed",
        ArtStyle::DigitalArt => "digital art, detailed, vibrant colors, high resolution",
        ArtStyle::OilPainting => "oil painting, textured, rich colors, classical style",
        ArtStyle::PencilSketch => "pencil sketch, detailed linework, shading, monochrome",
        ArtStyle::ComicBook => "comic book style, bold lines, flat colors, dynamic",
        ArtStyle::Fantasy => "fantasy art, magical, ethereal, detailed, vibrant",
    }
}

/// Append the style modifier unless the prompt already contains it
/// (case-insensitive).
pub fn enrich_prompt(prompt: &str, style: ArtStyle) -> String {
    let modifier = style_modifier(style);

    if prompt.to_lowercase().contains(&modifier.to_lowercase()) {
        return prompt.to_string();
    }

    format!("{}, {}", prompt, modifier)
}

/// Append the fixed quality suffix to whatever negative prompt was
/// supplied (possibly empty).
pub fn enrich_negative_prompt(negative_prompt: &str) -> String {
    format!("{}, {}", negative_prompt, NEGATIVE_PROMPT_SUFFIX)
}

/// Result of a successful generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_url: String,
    /// The enriched prompt actually sent to the vendor
    pub prompt: String,
    pub art_style: ArtStyle,
}

/// txt2img request body. Fixed parameters beyond prompt/seed.
#[derive(Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    samples: u32,
    scheduler: &'a str,
    num_inference_steps: u32,
    guidance_scale: f32,
    strength: f32,
    seed: u32,
    img_width: u32,
    img_height: u32,
    model_id: &'a str,
}

/// Stateless image generation adapter.
#[derive(Clone)]
pub struct ImageService {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    upload_dir: PathBuf,
}

impl ImageService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.image_api_timeout_secs))
            .build()
            .context("failed building image API HTTP client")?;

        Ok(Self {
            http,
            api_url: config.segmind_api_url.clone(),
            api_key: config.segmind_api_key.clone(),
            upload_dir: PathBuf::from(&config.upload_path),
        })
    }

    /// Validate a generation request, accumulating every field violation.
    ///
    /// Returns the parsed art style on success.
    pub fn validate_generate(prompt: &str, art_style: &str) -> Result<ArtStyle, AppError> {
        let mut errors = Vec::new();

        let prompt = prompt.trim();
        if prompt.is_empty() {
            errors.push(FieldError::new("prompt", "Prompt is required"));
        } else if prompt.chars().count() < PROMPT_MIN_CHARS
            || prompt.chars().count() > PROMPT_MAX_CHARS
        {
            errors.push(FieldError::new(
                "prompt",
                "Prompt must be between 3 and 1000 characters",
            ));
        }

        let style = if art_style.is_empty() {
            errors.push(FieldError::new("artStyle", "Art style is required"));
            None
        } else {
            match ArtStyle::parse(art_style) {
                Some(style) => Some(style),
                None => {
                    errors.push(FieldError::new("artStyle", "Invalid art style"));
                    None
                }
            }
        };

        match (style, errors.is_empty()) {
            (Some(style), true) => Ok(style),
            _ => Err(AppError::Validation(errors)),
        }
    }

    /// Generate one image and persist it under the upload directory.
    ///
    /// A vendor 429/402 surfaces as the matching upstream error; any
    /// other vendor or transport failure becomes a generic 500.
    pub async fn generate(
        &self,
        prompt: &str,
        art_style: ArtStyle,
        negative_prompt: &str,
        seed: Option<u32>,
    ) -> Result<GeneratedImage, AppError> {
        let enriched_prompt = enrich_prompt(prompt.trim(), art_style);
        let enriched_negative = enrich_negative_prompt(negative_prompt);
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen_range(0..1_000_000));

        let request = Txt2ImgRequest {
            prompt: &enriched_prompt,
            negative_prompt: &enriched_negative,
            samples: 1,
            scheduler: "UniPC",
            num_inference_steps: 25,
            guidance_scale: 7.5,
            strength: 0.9,
            seed,
            img_width: 512,
            img_height: 512,
            model_id: "sd1.5",
        };

        tracing::debug!(
            art_style = %art_style,
            seed,
            "Requesting image generation"
        );

        let response = self
            .http
            .post(format!("{}/txt2img", self.api_url))
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ImageGeneration(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => AppError::UpstreamRateLimited,
                402 => AppError::UpstreamQuotaExceeded,
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    AppError::ImageGeneration(format!("vendor HTTP {}: {}", status, body))
                }
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::ImageGeneration(format!("failed reading body: {e}")))?;

        let image_url = self.save_image(&bytes).await?;

        Ok(GeneratedImage {
            image_url,
            prompt: enriched_prompt,
            art_style,
        })
    }

    /// Persist generated image bytes as `<uuid>.png`, returning the URL.
    pub async fn save_image(&self, bytes: &[u8]) -> Result<String, AppError> {
        let filename = format!("{}.png", uuid::Uuid::new_v4());
        self.write_asset(&filename, bytes).await?;
        Ok(format!("/uploads/{}", filename))
    }

    /// Persist an uploaded file under a UUID name, keeping its extension.
    ///
    /// Returns `(imageUrl, filename)`.
    pub async fn save_upload(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
    ) -> Result<(String, String), AppError> {
        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .unwrap_or("png");

        let filename = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        self.write_asset(&filename, bytes).await?;
        Ok((format!("/uploads/{}", filename), filename))
    }

    async fn write_asset(&self, filename: &str, bytes: &[u8]) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("failed creating upload directory: {e}"))
            })?;

        let path = self.upload_dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed writing image file: {e}")))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Image saved");
        Ok(())
    }

    /// Delete a stored asset by bare filename.
    ///
    /// Filenames containing path separators are rejected before any
    /// filesystem access.
    pub async fn delete_image(&self, filename: &str) -> Result<(), AppError> {
        if filename.contains('/') || filename.contains('\\') {
            return Err(AppError::BadRequest("Invalid filename".to_string()));
        }

        let path = self.upload_dir.join(filename);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename, "Image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Image not found".to_string()))
            }
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "failed deleting image: {e}"
            ))),
        }
    }
}
