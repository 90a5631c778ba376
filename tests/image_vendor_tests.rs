// SPDX-License-Identifier: MIT

//! Vendor error mapping for image generation.
//!
//! Runs the image service against a local stub listener standing in for
//! the generation API, so the status-code triage is exercised without
//! touching the real vendor.

use axum::{http::StatusCode, routing::post, Router};
use dreamstudio::config::Config;
use dreamstudio::error::AppError;
use dreamstudio::models::ArtStyle;
use dreamstudio::services::ImageService;

/// Serve a fixed status from /txt2img on an ephemeral port.
async fn stub_vendor(status: StatusCode) -> String {
    let app = Router::new().route("/txt2img", post(move || async move { status }));
    serve_stub(app).await
}

async fn serve_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn service_for(api_url: String, upload_dir: &std::path::Path) -> ImageService {
    let mut config = Config::test_default();
    config.segmind_api_url = api_url;
    config.upload_path = upload_dir.to_string_lossy().into_owned();
    ImageService::new(&config).unwrap()
}

#[tokio::test]
async fn vendor_429_surfaces_as_rate_limited() {
    let dir = tempfile::tempdir().unwrap();
    let api_url = stub_vendor(StatusCode::TOO_MANY_REQUESTS).await;
    let service = service_for(api_url, dir.path());

    let err = service
        .generate("a cat", ArtStyle::Anime, "", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamRateLimited));
    assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn vendor_402_surfaces_as_quota_exceeded() {
    let dir = tempfile::tempdir().unwrap();
    let api_url = stub_vendor(StatusCode::PAYMENT_REQUIRED).await;
    let service = service_for(api_url, dir.path());

    let err = service
        .generate("a cat", ArtStyle::Anime, "", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamQuotaExceeded));
    assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn vendor_5xx_surfaces_as_generic_failure() {
    let dir = tempfile::tempdir().unwrap();
    let api_url = stub_vendor(StatusCode::INTERNAL_SERVER_ERROR).await;
    let service = service_for(api_url, dir.path());

    let err = service
        .generate("a cat", ArtStyle::Anime, "", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ImageGeneration(_)));
    assert_eq!(err.to_string(), "Failed to generate image");
}

#[tokio::test]
async fn vendor_success_saves_png_with_enriched_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let app = Router::new().route(
        "/txt2img",
        post(|| async { vec![0x89u8, b'P', b'N', b'G'] }),
    );
    let api_url = serve_stub(app).await;
    let service = service_for(api_url, dir.path());

    let generated = service
        .generate("a cat", ArtStyle::Anime, "", None)
        .await
        .unwrap();

    assert!(generated.image_url.starts_with("/uploads/"));
    assert!(generated.image_url.ends_with(".png"));
    assert!(generated
        .prompt
        .ends_with("anime style, cel shaded, vibrant, detailed"));

    let filename = generated.image_url.strip_prefix("/uploads/").unwrap();
    assert!(dir.path().join(filename).exists());
}
