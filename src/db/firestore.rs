// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Stories (documents with embedded scenes)
//! - Users (accounts keyed by Firebase UID, with usage counters)

use crate::db::collections;
use crate::error::{AppError, FieldError};
use crate::models::{ArtStyle, Story, User};

/// Filter for story queries. All set fields are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct StoryQuery {
    /// Restrict to stories owned by this caller
    pub owner: Option<String>,
    /// Restrict to one art style
    pub style: Option<ArtStyle>,
    /// Restrict to publicly visible stories
    pub public_only: bool,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Story Operations ────────────────────────────────────────

    /// Get a story by its document ID.
    pub async fn get_story(&self, story_id: &str) -> Result<Option<Story>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STORIES)
            .obj()
            .one(story_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or fully replace a story document.
    pub async fn set_story(&self, story: &Story) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::STORIES)
            .document_id(&story.id)
            .object(story)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Hard-delete a story document.
    pub async fn delete_story(&self, story_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::STORIES)
            .document_id(story_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Query stories with filtering, sorting, and offset pagination.
    pub async fn query_stories(
        &self,
        query: &StoryQuery,
        sort_field: &str,
        descending: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Story>, AppError> {
        let direction = if descending {
            firestore::FirestoreQueryDirection::Descending
        } else {
            firestore::FirestoreQueryDirection::Ascending
        };

        let owner = query.owner.clone();
        let style = query.style;
        let public_only = query.public_only;

        self.get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .filter(move |fb| {
                let mut conds = Vec::new();
                if let Some(owner) = owner.clone() {
                    conds.push(fb.field("userId").eq(owner));
                }
                if let Some(style) = style {
                    conds.push(fb.field("artStyle").eq(style.as_str()));
                }
                if public_only {
                    conds.push(fb.field("isPublic").eq(true));
                }
                fb.for_all(conds)
            })
            .order_by([(sort_field, direction)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count stories matching a filter.
    ///
    /// Fetches matching documents and counts them. Collections are
    /// small per user; revisit with an aggregate query if that changes.
    pub async fn count_stories(&self, query: &StoryQuery) -> Result<usize, AppError> {
        let owner = query.owner.clone();
        let style = query.style;
        let public_only = query.public_only;

        let stories: Vec<Story> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .filter(move |fb| {
                let mut conds = Vec::new();
                if let Some(owner) = owner.clone() {
                    conds.push(fb.field("userId").eq(owner));
                }
                if let Some(style) = style {
                    conds.push(fb.field("artStyle").eq(style.as_str()));
                }
                if public_only {
                    conds.push(fb.field("isPublic").eq(true));
                }
                fb.for_all(conds)
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(stories.len())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their Firebase UID.
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    ///
    /// Rejects records with an email that fails the basic pattern, the
    /// same constraint the account schema declares.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        if !user.has_valid_email() {
            return Err(AppError::Validation(vec![FieldError::new(
                "email",
                "Please provide a valid email",
            )]));
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.firebase_uid)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a user by UID, creating the given default record if absent.
    ///
    /// Returns the stored (or newly created) user.
    pub async fn find_or_create_user(&self, fallback: User) -> Result<User, AppError> {
        if let Some(existing) = self.get_user(&fallback.firebase_uid).await? {
            return Ok(existing);
        }

        tracing::info!(uid = %fallback.firebase_uid, "Creating user on first authentication");
        self.upsert_user(&fallback).await?;
        Ok(fallback)
    }

    /// Increment a user's usage counters and bump `lastActive`.
    ///
    /// Firestore lacks a fluent increment here, so this does a
    /// read-modify-write: the write commits through a transaction, but
    /// the read is a plain lookup, so two concurrent increments can
    /// lose one. The counters are informational, not billing-grade.
    /// If no account exists yet, `fallback` is written with the
    /// increments applied (lazy creation covers the guest identity).
    pub async fn increment_usage(
        &self,
        uid: &str,
        stories_delta: u64,
        images_delta: u64,
        fallback: User,
    ) -> Result<(), AppError> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<User> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read user: {}", e)))?;

        let mut user = match current {
            Some(user) => user,
            None => {
                if !fallback.has_valid_email() {
                    return Err(AppError::Validation(vec![FieldError::new(
                        "email",
                        "Please provide a valid email",
                    )]));
                }
                fallback
            }
        };
        user.usage.stories_created += stories_delta;
        user.usage.images_generated += images_delta;
        user.usage.last_active = now.clone();
        user.updated_at = now;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            uid,
            stories_delta,
            images_delta,
            "Usage counters incremented"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_rejects_invalid_email() {
        let db = FirestoreDb::new_mock();
        let user = User::from_identity("uid-1", "not-an-email", None, None);

        // The email check runs before any store access, so the offline
        // mock client surfaces the validation error, not a connection one.
        let err = db.upsert_user(&user).await.unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].field, "email");
        assert_eq!(fields[0].message, "Please provide a valid email");
    }

    #[tokio::test]
    async fn upsert_with_valid_email_reaches_the_store() {
        let db = FirestoreDb::new_mock();
        let user = User::from_identity("uid-2", "ada@example.com", None, None);

        let err = db.upsert_user(&user).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
