// SPDX-License-Identifier: MIT

//! Story service: validation, ownership, pagination, usage counters.
//!
//! All story access goes through here; route handlers never talk to the
//! store directly. Listing is ownership-scoped: callers only see their
//! own stories, except through the public listing.

use crate::db::{FirestoreDb, StoryQuery};
use crate::error::{AppError, FieldError};
use crate::middleware::auth::AuthUser;
use crate::models::{ArtStyle, Scene, Story, User};
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 100;
const SCENE_TEXT_MAX_CHARS: usize = 1000;
const DEFAULT_PAGE_LIMIT: u32 = 10;
const MAX_PAGE_LIMIT: u32 = 100;
const DEFAULT_SORT: &str = "-createdAt";

/// Incoming scene payload. Fields are optional so that every violation
/// can be reported instead of failing on the first missing field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneInput {
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub title: Option<String>,
    pub art_style: Option<String>,
    pub scenes: Option<Vec<SceneInput>>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update: only provided top-level fields replace existing ones.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub art_style: Option<String>,
    pub scenes: Option<Vec<SceneInput>>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<String>,
}

/// Pagination request parameters (1-indexed page).
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

/// One page of stories with totals.
#[derive(Debug)]
pub struct StoryPage {
    pub stories: Vec<Story>,
    pub total: usize,
    pub pagination: PageInfo,
}

#[derive(Clone)]
pub struct StoryService {
    db: FirestoreDb,
}

impl StoryService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// List the caller's stories with optional style filter.
    pub async fn list_stories(
        &self,
        caller_id: &str,
        style: Option<&str>,
        params: PageParams,
        sort: Option<&str>,
    ) -> Result<StoryPage, AppError> {
        let style = style
            .map(|s| ArtStyle::parse(s).ok_or_else(|| AppError::BadRequest("Invalid art style".to_string())))
            .transpose()?;

        let query = StoryQuery {
            owner: Some(caller_id.to_string()),
            style,
            public_only: false,
        };

        self.page_query(query, params, sort).await
    }

    /// List public stories; accessible regardless of identity.
    pub async fn list_public_stories(&self, params: PageParams) -> Result<StoryPage, AppError> {
        let query = StoryQuery {
            owner: None,
            style: None,
            public_only: true,
        };

        self.page_query(query, params, None).await
    }

    async fn page_query(
        &self,
        query: StoryQuery,
        params: PageParams,
        sort: Option<&str>,
    ) -> Result<StoryPage, AppError> {
        if params.page < 1 {
            return Err(AppError::BadRequest(
                "Page must be greater than 0".to_string(),
            ));
        }

        let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
        let skip = (params.page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))?;

        let (sort_field, descending) = parse_sort(sort.unwrap_or(DEFAULT_SORT))?;

        let stories = self
            .db
            .query_stories(&query, sort_field, descending, limit, skip)
            .await?;
        let total = self.db.count_stories(&query).await?;

        Ok(StoryPage {
            stories,
            total,
            pagination: PageInfo {
                page: params.page,
                limit,
                pages: compute_pages(total, limit),
            },
        })
    }

    /// Fetch a single story, enforcing visibility.
    pub async fn get_story(&self, story_id: &str, caller_id: &str) -> Result<Story, AppError> {
        let story = self
            .db
            .get_story(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".to_string()))?;

        if !story.is_owned_by(caller_id) && !story.is_public {
            return Err(AppError::Forbidden(
                "Not authorized to access this story".to_string(),
            ));
        }

        Ok(story)
    }

    /// Create a story for the caller and bump their usage counters.
    pub async fn create_story(
        &self,
        request: CreateStoryRequest,
        caller: &AuthUser,
    ) -> Result<Story, AppError> {
        let (title, art_style, scenes) = validate_create(&request)?;

        let now = chrono::Utc::now().to_rfc3339();
        let mut story = Story {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            user_id: caller.uid.clone(),
            art_style,
            scenes,
            is_public: request.is_public,
            tags: request.tags,
            cover_image: String::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        story.sort_scenes();
        story.cover_image = story
            .scenes
            .first()
            .map(|s| s.image_url.clone())
            .unwrap_or_default();

        let image_count = story.scenes.len() as u64;
        self.db.set_story(&story).await?;
        self.db
            .increment_usage(&caller.uid, 1, image_count, fallback_user(caller))
            .await?;

        tracing::info!(
            story_id = %story.id,
            user_id = %caller.uid,
            scenes = story.scenes.len(),
            "Story created"
        );

        Ok(story)
    }

    /// Apply a partial update; owner only.
    ///
    /// Scenes whose image URL did not previously appear in the story
    /// count as newly generated images for the owner's usage counter.
    pub async fn update_story(
        &self,
        story_id: &str,
        patch: UpdateStoryRequest,
        caller: &AuthUser,
    ) -> Result<Story, AppError> {
        let mut story = self
            .db
            .get_story(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".to_string()))?;

        if !story.is_owned_by(&caller.uid) {
            return Err(AppError::Forbidden(
                "Not authorized to update this story".to_string(),
            ));
        }

        let validated = validate_update(&patch)?;

        let mut new_images = 0u64;
        if let Some(scenes) = validated.scenes {
            new_images = count_new_images(&story.scenes, &scenes);
            story.scenes = scenes;
        }
        if let Some(title) = validated.title {
            story.title = title;
        }
        if let Some(art_style) = validated.art_style {
            story.art_style = art_style;
        }
        if let Some(is_public) = patch.is_public {
            story.is_public = is_public;
        }
        if let Some(tags) = patch.tags {
            story.tags = tags;
        }
        if let Some(cover_image) = patch.cover_image {
            story.cover_image = cover_image;
        }

        story.sort_scenes();
        story.updated_at = chrono::Utc::now().to_rfc3339();

        self.db.set_story(&story).await?;

        if new_images > 0 {
            self.db
                .increment_usage(&caller.uid, 0, new_images, fallback_user(caller))
                .await?;
        }

        tracing::info!(story_id = %story.id, user_id = %caller.uid, new_images, "Story updated");

        Ok(story)
    }

    /// Fetch every story owned by the caller, newest first.
    ///
    /// Used by the user-data export; capped to keep the stub bounded.
    pub async fn list_all_by_owner(&self, caller_id: &str) -> Result<Vec<Story>, AppError> {
        const EXPORT_CAP: u32 = 1000;

        let query = StoryQuery {
            owner: Some(caller_id.to_string()),
            style: None,
            public_only: false,
        };

        self.db
            .query_stories(&query, "createdAt", true, EXPORT_CAP, 0)
            .await
    }

    /// Hard-delete a story; owner only.
    ///
    /// Referenced images are intentionally left in place; nothing tracks
    /// whether other stories still point at them.
    pub async fn delete_story(&self, story_id: &str, caller_id: &str) -> Result<(), AppError> {
        let story = self
            .db
            .get_story(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".to_string()))?;

        if !story.is_owned_by(caller_id) {
            return Err(AppError::Forbidden(
                "Not authorized to delete this story".to_string(),
            ));
        }

        self.db.delete_story(story_id).await?;
        tracing::info!(story_id, user_id = %caller_id, "Story deleted");
        Ok(())
    }
}

/// Scenes validated during an update.
struct ValidatedUpdate {
    title: Option<String>,
    art_style: Option<ArtStyle>,
    scenes: Option<Vec<Scene>>,
}

fn validate_create(request: &CreateStoryRequest) -> Result<(String, ArtStyle, Vec<Scene>), AppError> {
    let mut errors = Vec::new();

    let title = validate_title(request.title.as_deref(), &mut errors);

    let art_style = match request.art_style.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("artStyle", "Art style is required"));
            None
        }
        Some(raw) => match ArtStyle::parse(raw) {
            Some(style) => Some(style),
            None => {
                errors.push(FieldError::new("artStyle", "Invalid art style"));
                None
            }
        },
    };

    let scenes = match &request.scenes {
        None => {
            errors.push(FieldError::new("scenes", "Scenes must be an array"));
            None
        }
        Some(inputs) => Some(validate_scenes(inputs, &mut errors)),
    };

    match (title, art_style, scenes, errors.is_empty()) {
        (Some(title), Some(style), Some(scenes), true) => Ok((title, style, scenes)),
        _ => Err(AppError::Validation(errors)),
    }
}

fn validate_update(patch: &UpdateStoryRequest) -> Result<ValidatedUpdate, AppError> {
    let mut errors = Vec::new();

    let title = match patch.title.as_deref() {
        None => None,
        Some(raw) => validate_title(Some(raw), &mut errors),
    };

    let art_style = match patch.art_style.as_deref() {
        None => None,
        Some(raw) => match ArtStyle::parse(raw) {
            Some(style) => Some(style),
            None => {
                errors.push(FieldError::new("artStyle", "Invalid art style"));
                None
            }
        },
    };

    let scenes = patch
        .scenes
        .as_ref()
        .map(|inputs| validate_scenes(inputs, &mut errors));

    if errors.is_empty() {
        Ok(ValidatedUpdate {
            title,
            art_style,
            scenes,
        })
    } else {
        Err(AppError::Validation(errors))
    }
}

fn validate_title(title: Option<&str>, errors: &mut Vec<FieldError>) -> Option<String> {
    let trimmed = title.unwrap_or_default().trim();

    if trimmed.is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
        return None;
    }

    if trimmed.chars().count() > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            "title",
            "Title cannot be more than 100 characters",
        ));
        return None;
    }

    Some(trimmed.to_string())
}

fn validate_scenes(inputs: &[SceneInput], errors: &mut Vec<FieldError>) -> Vec<Scene> {
    let mut scenes = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.iter().enumerate() {
        let mut valid = true;

        let text = input.text.as_deref().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            errors.push(FieldError::new(
                format!("scenes[{i}].text"),
                "Scene text is required",
            ));
            valid = false;
        } else if text.chars().count() > SCENE_TEXT_MAX_CHARS {
            errors.push(FieldError::new(
                format!("scenes[{i}].text"),
                "Scene text cannot be more than 1000 characters",
            ));
            valid = false;
        }

        let image_url = input.image_url.clone().unwrap_or_default();
        if image_url.is_empty() {
            errors.push(FieldError::new(
                format!("scenes[{i}].imageUrl"),
                "Scene image URL is required",
            ));
            valid = false;
        }

        let order = match input.order {
            Some(order) => order,
            None => {
                errors.push(FieldError::new(
                    format!("scenes[{i}].order"),
                    "Scene order must be a number",
                ));
                valid = false;
                0
            }
        };

        if valid {
            scenes.push(Scene {
                text,
                image_url,
                image_prompt: input.image_prompt.clone(),
                order,
            });
        }
    }

    scenes
}

/// Count incoming scenes whose image URL is not present among the
/// existing scenes' URLs.
fn count_new_images(existing: &[Scene], incoming: &[Scene]) -> u64 {
    incoming
        .iter()
        .filter(|scene| !existing.iter().any(|e| e.image_url == scene.image_url))
        .count() as u64
}

fn compute_pages(total: usize, limit: u32) -> u32 {
    (total as u32).div_ceil(limit)
}

/// Allowed sort keys; a leading `-` means descending.
fn parse_sort(sort: &str) -> Result<(&'static str, bool), AppError> {
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort, false),
    };

    let field = match field {
        "createdAt" => "createdAt",
        "updatedAt" => "updatedAt",
        "title" => "title",
        _ => {
            return Err(AppError::BadRequest(format!(
                "Unsupported sort field: {sort}"
            )))
        }
    };

    Ok((field, descending))
}

/// Default account record written if the caller has none yet.
fn fallback_user(caller: &AuthUser) -> User {
    User::from_identity(
        &caller.uid,
        caller.email.as_deref().unwrap_or_default(),
        caller.display_name.as_deref(),
        caller.photo_url.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_input(text: &str, url: &str, order: i64) -> SceneInput {
        SceneInput {
            text: Some(text.to_string()),
            image_url: Some(url.to_string()),
            image_prompt: None,
            order: Some(order),
        }
    }

    fn valid_request() -> CreateStoryRequest {
        CreateStoryRequest {
            title: Some("The Moon Rabbit".to_string()),
            art_style: Some("watercolor".to_string()),
            scenes: Some(vec![scene_input("Once upon a time", "/uploads/a.png", 1)]),
            is_public: false,
            tags: vec![],
        }
    }

    #[test]
    fn create_accepts_valid_payload() {
        let (title, style, scenes) = validate_create(&valid_request()).unwrap();
        assert_eq!(title, "The Moon Rabbit");
        assert_eq!(style, ArtStyle::Watercolor);
        assert_eq!(scenes.len(), 1);
    }

    #[test]
    fn title_boundary_at_100_chars() {
        let mut request = valid_request();
        request.title = Some("x".repeat(100));
        assert!(validate_create(&request).is_ok());

        request.title = Some("x".repeat(101));
        let err = validate_create(&request).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].field, "title");
        assert_eq!(fields[0].message, "Title cannot be more than 100 characters");
    }

    #[test]
    fn title_is_trimmed_before_checking() {
        let mut request = valid_request();
        request.title = Some("   ".to_string());
        let err = validate_create(&request).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].message, "Title is required");
    }

    #[test]
    fn create_reports_every_violation() {
        let request = CreateStoryRequest {
            title: None,
            art_style: Some("cubism".to_string()),
            scenes: Some(vec![SceneInput {
                text: None,
                image_url: None,
                image_prompt: None,
                order: None,
            }]),
            is_public: false,
            tags: vec![],
        };

        let err = validate_create(&request).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };

        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            names,
            vec!["title", "artStyle", "scenes[0].text", "scenes[0].imageUrl", "scenes[0].order"]
        );
    }

    #[test]
    fn scene_text_boundary_at_1000_chars() {
        let mut request = valid_request();
        request.scenes = Some(vec![scene_input(&"y".repeat(1000), "/uploads/a.png", 1)]);
        assert!(validate_create(&request).is_ok());

        request.scenes = Some(vec![scene_input(&"y".repeat(1001), "/uploads/a.png", 1)]);
        assert!(validate_create(&request).is_err());
    }

    #[test]
    fn missing_scenes_is_rejected() {
        let mut request = valid_request();
        request.scenes = None;
        let err = validate_create(&request).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].field, "scenes");
    }

    #[test]
    fn update_validates_only_provided_fields() {
        let patch = UpdateStoryRequest {
            is_public: Some(true),
            ..Default::default()
        };
        assert!(validate_update(&patch).is_ok());

        let patch = UpdateStoryRequest {
            art_style: Some("bauhaus".to_string()),
            ..Default::default()
        };
        assert!(validate_update(&patch).is_err());
    }

    fn scene(url: &str) -> Scene {
        Scene {
            text: "text".to_string(),
            image_url: url.to_string(),
            image_prompt: None,
            order: 0,
        }
    }

    #[test]
    fn new_image_count_ignores_existing_urls() {
        let existing = vec![scene("/uploads/a.png"), scene("/uploads/b.png")];
        let incoming = vec![
            scene("/uploads/a.png"),
            scene("/uploads/c.png"),
            scene("/uploads/d.png"),
        ];

        assert_eq!(count_new_images(&existing, &incoming), 2);
        assert_eq!(count_new_images(&existing, &existing), 0);
        assert_eq!(count_new_images(&[], &incoming), 3);
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(compute_pages(25, 10), 3);
        assert_eq!(compute_pages(20, 10), 2);
        assert_eq!(compute_pages(0, 10), 0);
        assert_eq!(compute_pages(1, 10), 1);
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(parse_sort("-createdAt").unwrap(), ("createdAt", true));
        assert_eq!(parse_sort("title").unwrap(), ("title", false));
        assert!(parse_sort("password").is_err());
    }
}
