// SPDX-License-Identifier: MIT

use dreamstudio::config::Config;
use dreamstudio::db::FirestoreDb;
use dreamstudio::middleware::AuthGate;
use dreamstudio::routes::create_router;
use dreamstudio::services::{FirebaseAuthVerifier, ImageService, StoryService};
use dreamstudio::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build an app with the given auth gate, offline db, and a throwaway
/// upload directory. The TempDir guard must outlive the test.
#[allow(dead_code)]
fn build_test_app(auth: AuthGate) -> (axum::Router, Arc<AppState>, tempfile::TempDir) {
    let upload_dir = tempfile::tempdir().expect("Failed to create temp upload dir");

    let mut config = Config::test_default();
    config.upload_path = upload_dir.path().to_string_lossy().into_owned();

    let db = test_db_offline();
    let images = ImageService::new(&config).expect("Failed to build image service");
    let stories = StoryService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        auth,
        stories,
        images,
    });

    (create_router(state.clone()), state, upload_dir)
}

/// Test app with the guest (bypass) auth gate.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, tempfile::TempDir) {
    build_test_app(AuthGate::Guest)
}

/// Test app with the Firebase auth gate (no valid tokens exist for it,
/// so every request should be rejected before reaching a handler).
#[allow(dead_code)]
pub fn create_firebase_test_app() -> (axum::Router, Arc<AppState>, tempfile::TempDir) {
    let config = Config::test_default();
    let verifier = FirebaseAuthVerifier::new(&config).expect("Failed to build verifier");
    build_test_app(AuthGate::Firebase(verifier))
}
