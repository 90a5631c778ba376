// SPDX-License-Identifier: MIT

//! Story CRUD routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::StoryResponse;
use crate::routes::{ApiResponse, ListResponse};
use crate::services::story::{CreateStoryRequest, PageParams, UpdateStoryRequest};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stories", get(list_stories).post(create_story))
        .route(
            "/api/stories/{id}",
            get(get_story).put(update_story).delete(delete_story),
        )
        .route("/api/stories/public/featured", get(list_public_stories))
}

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<u32>,
    page: Option<u32>,
    sort: Option<String>,
    style: Option<String>,
}

impl ListQuery {
    fn page_params(&self) -> PageParams {
        let defaults = PageParams::default();
        PageParams {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

/// List the caller's stories.
async fn list_stories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse<StoryResponse>>> {
    let page = state
        .stories
        .list_stories(
            &user.uid,
            params.style.as_deref(),
            params.page_params(),
            params.sort.as_deref(),
        )
        .await?;

    let data = page.stories.into_iter().map(StoryResponse::from).collect();
    Ok(ListResponse::of(data, page.total, page.pagination))
}

/// List public stories.
async fn list_public_stories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse<StoryResponse>>> {
    let page = state
        .stories
        .list_public_stories(params.page_params())
        .await?;

    let data = page.stories.into_iter().map(StoryResponse::from).collect();
    Ok(ListResponse::of(data, page.total, page.pagination))
}

/// Get a single story (owner or public).
async fn get_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoryResponse>>> {
    let story = state.stories.get_story(&id, &user.uid).await?;
    Ok(ApiResponse::of(story.into()))
}

/// Create a story owned by the caller.
async fn create_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateStoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StoryResponse>>)> {
    let story = state.stories.create_story(body, &user).await?;
    Ok((StatusCode::CREATED, ApiResponse::of(story.into())))
}

/// Partially update a story (owner only).
async fn update_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStoryRequest>,
) -> Result<Json<ApiResponse<StoryResponse>>> {
    let story = state.stories.update_story(&id, body, &user).await?;
    Ok(ApiResponse::of(story.into()))
}

/// Hard-delete a story (owner only).
async fn delete_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    state.stories.delete_story(&id, &user.uid).await?;
    Ok(ApiResponse::empty())
}
