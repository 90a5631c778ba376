// SPDX-License-Identifier: MIT

//! DreamStudio API Server
//!
//! Serves the story CRUD API, generates per-scene images through the
//! Segmind API, and stores everything in Firestore.

use dreamstudio::{
    config::{AuthMode, Config},
    db::FirestoreDb,
    middleware::AuthGate,
    services::{FirebaseAuthVerifier, ImageService, StoryService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting DreamStudio API");

    // Initialize Firestore database; unreachable store at boot is fatal
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Select the authentication gate once at startup
    let auth = match config.auth_mode {
        AuthMode::Firebase => {
            let verifier = FirebaseAuthVerifier::new(&config)
                .expect("Failed to initialize Firebase verifier");
            AuthGate::Firebase(verifier)
        }
        AuthMode::Guest => {
            tracing::warn!("Auth bypass enabled: all requests run as the guest user");
            AuthGate::Guest
        }
    };

    let images = ImageService::new(&config).expect("Failed to initialize image service");
    let stories = StoryService::new(db.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        auth,
        stories,
        images,
    });

    // Build router
    let app = dreamstudio::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dreamstudio=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
