// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, StoryQuery};

/// Collection names as constants.
pub mod collections {
    pub const STORIES: &str = "stories";
    /// User accounts, keyed by Firebase UID
    pub const USERS: &str = "users";
}
