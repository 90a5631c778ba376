// SPDX-License-Identifier: MIT

//! Export routes (stubs).
//!
//! Access checks are real; artifact generation is not. Each endpoint
//! acknowledges the request with story metadata instead of producing
//! the named file.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/exports/story/{id}/pdf", get(export_pdf))
        .route("/api/exports/story/{id}/epub", get(export_epub))
        .route("/api/exports/story/{id}/images", get(export_images))
        .route("/api/exports/user/data", get(export_user_data))
}

/// Stub acknowledgment envelope.
#[derive(Serialize)]
struct StubResponse<T: Serialize> {
    success: bool,
    message: String,
    data: T,
}

impl<T: Serialize> StubResponse<T> {
    fn of(what: &str, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: format!("{what} export functionality will be implemented in the future"),
            data,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoryExportData {
    story_id: String,
    title: String,
    scene_count: usize,
}

async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<StubResponse<StoryExportData>>> {
    let story = state.stories.get_story(&id, &user.uid).await?;

    Ok(StubResponse::of(
        "PDF",
        StoryExportData {
            story_id: story.id,
            title: story.title,
            scene_count: story.scenes.len(),
        },
    ))
}

async fn export_epub(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<StubResponse<StoryExportData>>> {
    let story = state.stories.get_story(&id, &user.uid).await?;

    Ok(StubResponse::of(
        "EPUB",
        StoryExportData {
            story_id: story.id,
            title: story.title,
            scene_count: story.scenes.len(),
        },
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagesExportData {
    story_id: String,
    title: String,
    image_count: usize,
    image_urls: Vec<String>,
}

async fn export_images(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<StubResponse<ImagesExportData>>> {
    let story = state.stories.get_story(&id, &user.uid).await?;

    let image_urls: Vec<String> = story.scenes.iter().map(|s| s.image_url.clone()).collect();

    Ok(StubResponse::of(
        "Image",
        ImagesExportData {
            story_id: story.id,
            title: story.title,
            image_count: image_urls.len(),
            image_urls,
        },
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserExportData {
    user: UserIdentityData,
    stories: UserStoriesData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserIdentityData {
    uid: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Serialize)]
struct UserStoriesData {
    count: usize,
    titles: Vec<String>,
}

async fn export_user_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StubResponse<UserExportData>>> {
    let stories = state.stories.list_all_by_owner(&user.uid).await?;

    Ok(StubResponse::of(
        "User data",
        UserExportData {
            user: UserIdentityData {
                uid: user.uid.clone(),
                email: user.email.clone(),
                display_name: user.display_name.clone(),
            },
            stories: UserStoriesData {
                count: stories.len(),
                titles: stories.into_iter().map(|s| s.title).collect(),
            },
        },
    ))
}
