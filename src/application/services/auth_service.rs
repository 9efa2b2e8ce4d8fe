//! Authentication service for API token validation.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::entities::Identity;
use crate::domain::repositories::{AdminRepository, ApiToken, TokenRepository};
use crate::error::AppError;
use crate::utils::deadline::bounded;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes in a generated API token.
const TOKEN_BYTES: usize = 32;

/// Service for authenticating API requests via Bearer tokens.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before storage
/// and comparison. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret.
pub struct AuthService {
    tokens: Arc<dyn TokenRepository>,
    admins: Arc<dyn AdminRepository>,
    signing_secret: String,
    storage_timeout: Duration,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value used when tokens were created.
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        admins: Arc<dyn AdminRepository>,
        signing_secret: String,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            admins,
            signing_secret,
            storage_timeout,
        }
    }

    /// Hashes a raw token with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Generates a new random token: 32 bytes, URL-safe base64 without padding.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the system random number generator fails.
    pub fn generate_token() -> Result<String, AppError> {
        let mut buffer = [0u8; TOKEN_BYTES];
        getrandom::fill(&mut buffer).map_err(|e| {
            AppError::internal(
                "Failed to generate token",
                json!({ "reason": e.to_string() }),
            )
        })?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
    }

    /// Resolves a raw token to the identity of its owner.
    ///
    /// On success, updates the token's `last_used_at` best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown or revoked,
    /// or its account no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        let token_hash = self.hash_token(token);

        let Some(api_token) =
            bounded(self.storage_timeout, self.tokens.find_active(&token_hash)).await?
        else {
            return Err(invalid_token());
        };

        let Some(admin) = bounded(
            self.storage_timeout,
            self.admins.find_by_id(api_token.admin_id),
        )
        .await?
        else {
            warn!(token_id = api_token.id, "Token belongs to a deleted account");
            return Err(invalid_token());
        };

        if let Err(e) = self.tokens.update_last_used(&token_hash).await {
            debug!(error = %e, "Failed to update token last_used_at");
        }

        Ok(Identity::from(&admin))
    }

    /// Creates a fresh token for an account and returns it with its raw value.
    ///
    /// The raw value is shown once; only the hash is stored.
    pub async fn issue_token(
        &self,
        admin_id: i64,
        name: &str,
    ) -> Result<(ApiToken, String), AppError> {
        let raw = Self::generate_token()?;
        let token = self.register_token(admin_id, name, &raw).await?;
        Ok((token, raw))
    }

    /// Stores the hash of a caller-supplied raw token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the same token is already registered.
    pub async fn register_token(
        &self,
        admin_id: i64,
        name: &str,
        raw: &str,
    ) -> Result<ApiToken, AppError> {
        let token_hash = self.hash_token(raw);
        bounded(
            self.storage_timeout,
            self.tokens.create_token(admin_id, name, &token_hash),
        )
        .await
    }
}

fn invalid_token() -> AppError {
    AppError::unauthorized(
        "Unauthorized",
        json!({"reason": "Invalid or revoked token"}),
    )
}
