// SPDX-License-Identifier: MIT

//! Firebase ID token verification.
//!
//! Verifies RS256-signed ID tokens against Google's published JWKS for
//! the `securetoken` service account. Keys are cached in memory with a
//! TTL taken from the response's Cache-Control header.

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Resolved caller identity from a verified ID token.
#[derive(Debug, Clone)]
pub struct FirebaseIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Verification failure categories.
#[derive(Debug)]
pub enum AuthError {
    /// The credential is missing, malformed, expired, or forged.
    Unauthorized(String),
    /// Infrastructure failure while fetching keys; not the caller's fault.
    Transient(String),
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase-issued ID tokens.
pub struct FirebaseAuthVerifier {
    http_client: reqwest::Client,
    expected_issuer: String,
    expected_audience: String,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseAuthVerifier {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        let expected_issuer = format!(
            "https://securetoken.google.com/{}",
            config.firebase_project_id
        );

        tracing::info!(
            issuer = %expected_issuer,
            "Initialized Firebase token verifier"
        );

        Ok(Self {
            http_client,
            expected_issuer,
            expected_audience: config.firebase_project_id.clone(),
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify a bearer ID token and resolve the caller identity.
    pub async fn verify(&self, token: &str) -> Result<FirebaseIdentity, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::Unauthorized(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::Unauthorized(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::Unauthorized("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.expected_issuer.as_str()]);
        validation.set_audience(&[self.expected_audience.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let token_data = decode::<IdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| AuthError::Unauthorized(format!("JWT validation failed: {e}")))?;

        let claims = token_data.claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::Unauthorized("empty sub claim".to_string()));
        }

        tracing::debug!(
            uid = %claims.sub,
            email = claims.email.as_deref().unwrap_or("<missing>"),
            "Firebase ID token verified"
        );

        Ok(FirebaseIdentity {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
            display_name: claims.name,
            photo_url: claims.picture,
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Retry once with a forced refresh to pick up rotated keys.
        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(AuthError::Unauthorized(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!("Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| AuthError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AuthError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let mut keys_by_kid: HashMap<String, Arc<DecodingKey>> = HashMap::new();

        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
                continue;
            }

            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys_by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                }
            }
        }

        if keys_by_kid.is_empty() {
            return Err(AuthError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    for directive in value.split(',') {
        let directive = directive.trim();

        if let Some(raw) = directive.strip_prefix("max-age=") {
            let raw = raw.trim_matches('"');
            if let Ok(seconds) = raw.parse::<u64>() {
                return Some(seconds);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cache_control_max_age_valid() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=3600"),
            Some(3600)
        );
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
    }

    #[test]
    fn parse_cache_control_max_age_invalid() {
        assert_eq!(parse_cache_control_max_age("public, immutable"), None);
        assert_eq!(parse_cache_control_max_age("max-age=abc"), None);
        assert_eq!(parse_cache_control_max_age(""), None);
    }

    #[tokio::test]
    async fn verify_rejects_garbage_token() {
        let config = Config::test_default();
        let verifier = FirebaseAuthVerifier::new(&config).unwrap();

        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }
}
