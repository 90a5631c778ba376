// SPDX-License-Identifier: MIT

//! HTTP route handlers.

pub mod exports;
pub mod images;
pub mod stories;

use crate::middleware::auth::require_auth;
use crate::services::story::PageInfo;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Standard success envelope: `{ "success": true, "data": ... }`.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn of(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

impl ApiResponse<serde_json::Value> {
    /// `{ "success": true, "data": {} }`, used by delete endpoints.
    pub fn empty() -> Json<Self> {
        Self::of(serde_json::json!({}))
    }
}

/// List envelope with pagination metadata.
#[derive(Serialize)]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    /// Items in this page
    pub count: usize,
    /// Items matching the filter overall
    pub total: usize,
    pub pagination: PageInfo,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn of(data: Vec<T>, total: usize, pagination: PageInfo) -> Json<Self> {
        Json(Self {
            success: true,
            count: data.len(),
            total,
            pagination,
            data,
        })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_path));

    // Protected routes (identity resolved by the auth gate)
    let protected_routes = Router::new()
        .merge(stories::routes())
        .merge(images::routes())
        .merge(exports::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.config.max_file_size))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
