// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod story;
pub mod user;

pub use story::{ArtStyle, Scene, Story, StoryResponse};
pub use user::{Role, Theme, Usage, User};
