// SPDX-License-Identifier: MIT

//! Story and scene models.
//!
//! Stories are stored as single Firestore documents with the scenes
//! embedded; scenes are never addressable on their own.

use serde::{Deserialize, Serialize};

/// The closed set of supported art styles.
///
/// The wire names (kebab-case) are shared by the story model, the user
/// preferences, and the image generation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtStyle {
    Realistic,
    Cartoon,
    Watercolor,
    Pixar,
    Anime,
    DigitalArt,
    OilPainting,
    PencilSketch,
    ComicBook,
    Fantasy,
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 10] = [
        ArtStyle::Realistic,
        ArtStyle::Cartoon,
        ArtStyle::Watercolor,
        ArtStyle::Pixar,
        ArtStyle::Anime,
        ArtStyle::DigitalArt,
        ArtStyle::OilPainting,
        ArtStyle::PencilSketch,
        ArtStyle::ComicBook,
        ArtStyle::Fantasy,
    ];

    /// Wire name of the style tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtStyle::Realistic => "realistic",
            ArtStyle::Cartoon => "cartoon",
            ArtStyle::Watercolor => "watercolor",
            ArtStyle::Pixar => "pixar",
            ArtStyle::Anime => "anime",
            ArtStyle::DigitalArt => "digital-art",
            ArtStyle::OilPainting => "oil-painting",
            ArtStyle::PencilSketch => "pencil-sketch",
            ArtStyle::ComicBook => "comic-book",
            ArtStyle::Fantasy => "fantasy",
        }
    }

    /// Parse a style tag; `None` for anything outside the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        ArtStyle::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered narrative unit of a story, paired with one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Narrative text (1-1000 characters after trimming)
    pub text: String,
    /// Opaque reference to the generated/uploaded image
    pub image_url: String,
    /// The enriched prompt used to produce the image, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    /// Display sequence position
    pub order: i64,
}

/// Story document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Document ID (UUID, generated at creation, immutable)
    pub id: String,
    /// Title (1-100 characters after trimming)
    pub title: String,
    /// Owning caller's subject ID
    pub user_id: String,
    pub art_style: ArtStyle,
    /// Scenes, always persisted sorted ascending by `order`
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Gates read access for non-owners
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults to the lowest-order scene's image at creation, else empty
    #[serde(default)]
    pub cover_image: String,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

impl Story {
    /// Sort scenes ascending by `order`. Called on every persistence of
    /// the parent story so reads always see display order.
    pub fn sort_scenes(&mut self) {
        self.scenes.sort_by_key(|s| s.order);
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// API representation of a story: the stored document plus the derived
/// scene count, which is computed on read and never stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    #[serde(flatten)]
    pub story: Story,
    pub scene_count: usize,
}

impl From<Story> for StoryResponse {
    fn from(story: Story) -> Self {
        let scene_count = story.scenes.len();
        Self { story, scene_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn art_style_wire_names() {
        assert_eq!(ArtStyle::DigitalArt.as_str(), "digital-art");
        assert_eq!(ArtStyle::OilPainting.as_str(), "oil-painting");
        assert_eq!(
            serde_json::to_string(&ArtStyle::PencilSketch).unwrap(),
            "\"pencil-sketch\""
        );

        let parsed: ArtStyle = serde_json::from_str("\"comic-book\"").unwrap();
        assert_eq!(parsed, ArtStyle::ComicBook);
    }

    #[test]
    fn art_style_parse_rejects_unknown() {
        assert_eq!(ArtStyle::parse("anime"), Some(ArtStyle::Anime));
        assert_eq!(ArtStyle::parse("cubism"), None);
        assert_eq!(ArtStyle::parse(""), None);
    }

    #[test]
    fn scenes_sort_by_order() {
        let mut story = Story {
            id: "s1".into(),
            title: "Test".into(),
            user_id: "u1".into(),
            art_style: ArtStyle::Realistic,
            scenes: vec![
                Scene {
                    text: "third".into(),
                    image_url: "/uploads/c.png".into(),
                    image_prompt: None,
                    order: 3,
                },
                Scene {
                    text: "first".into(),
                    image_url: "/uploads/a.png".into(),
                    image_prompt: None,
                    order: 1,
                },
                Scene {
                    text: "second".into(),
                    image_url: "/uploads/b.png".into(),
                    image_prompt: None,
                    order: 2,
                },
            ],
            is_public: false,
            tags: vec![],
            cover_image: String::new(),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };

        story.sort_scenes();

        let orders: Vec<i64> = story.scenes.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(story.scenes[0].text, "first");
    }

    #[test]
    fn scene_count_is_derived() {
        let story = Story {
            id: "s1".into(),
            title: "Test".into(),
            user_id: "u1".into(),
            art_style: ArtStyle::Anime,
            scenes: vec![Scene {
                text: "only".into(),
                image_url: "/uploads/a.png".into(),
                image_prompt: None,
                order: 1,
            }],
            is_public: true,
            tags: vec![],
            cover_image: "/uploads/a.png".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };

        let response = StoryResponse::from(story);
        assert_eq!(response.scene_count, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sceneCount"], 1);
        assert_eq!(json["artStyle"], "anime");
    }
}
