// SPDX-License-Identifier: MIT

//! User model for storage and API.

use crate::models::story::ArtStyle;
use serde::{Deserialize, Serialize};

/// User account stored in Firestore, keyed by the identity provider's
/// subject ID. Created lazily on first successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Firebase subject ID (also used as document ID)
    pub firebase_uid: String,
    pub display_name: String,
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub default_art_style: ArtStyle,
    pub email_notifications: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_art_style: ArtStyle::Realistic,
            email_notifications: true,
            theme: Theme::System,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

/// Usage counters, incremented by the story service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub stories_created: u64,
    pub images_generated: u64,
    /// RFC 3339
    pub last_active: String,
}

impl Default for Usage {
    fn default() -> Self {
        Self {
            stories_created: 0,
            images_generated: 0,
            last_active: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Build a fresh account from a resolved caller identity.
    ///
    /// Display name falls back to the local part of the email when the
    /// provider did not supply one.
    pub fn from_identity(
        uid: &str,
        email: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();

        let display_name = display_name
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());

        Self {
            firebase_uid: uid.to_string(),
            display_name,
            email: email.to_lowercase(),
            photo_url: photo_url.unwrap_or_default().to_string(),
            preferences: Preferences::default(),
            usage: Usage::default(),
            role: Role::default(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Basic email pattern check, mirroring the store-level constraint.
    pub fn has_valid_email(&self) -> bool {
        use validator::ValidateEmail;
        self.email.validate_email()
    }
}
