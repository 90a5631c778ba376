// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod firebase;
pub mod image;
pub mod story;

pub use firebase::{AuthError, FirebaseAuthVerifier, FirebaseIdentity};
pub use image::{GeneratedImage, ImageService};
pub use story::{PageParams, StoryService};
