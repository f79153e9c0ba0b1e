//! JWT token creation for operator tooling and tests.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use cinebook_core::config::AuthConfig;
use cinebook_core::error::AppError;
use cinebook_core::types::id::UserId;
use cinebook_entity::user::UserRole;

use super::claims::Claims;

/// Creates signed HS256 tokens accepted by [`super::JwtDecoder`].
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").field("ttl", &self.ttl).finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: chrono::Duration::minutes(config.dev_token_ttl_minutes as i64),
        }
    }

    /// Signs a token with the configured lifetime.
    pub fn encode(&self, user_id: UserId, role: UserRole) -> Result<String, AppError> {
        self.encode_with_ttl(user_id, role, self.ttl)
    }

    /// Signs a token with an explicit lifetime.
    pub fn encode_with_ttl(
        &self,
        user_id: UserId,
        role: UserRole,
        ttl: chrono::Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }
}
