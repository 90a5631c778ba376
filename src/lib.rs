// SPDX-License-Identifier: MIT

//! DreamStudio: create illustrated short stories with AI-generated art.
//!
//! This crate provides the backend API for story CRUD, per-scene image
//! generation via the Segmind API, and stubbed export endpoints.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use middleware::AuthGate;
use services::{ImageService, StoryService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub auth: AuthGate,
    pub stories: StoryService,
    pub images: ImageService,
}
