use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64, // user id
    pub email: String,
    pub kind: TokenKind,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Access and refresh token issued together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService;

impl AuthService {
    /// Hash a password using Argon2
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let result = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();

        Ok(result)
    }

    /// Generate a JWT of the given kind for a user
    pub fn generate_token(
        user_id: i64,
        email: &str,
        kind: TokenKind,
        config: &ServerConfig,
    ) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let lifetime = match kind {
            TokenKind::Access => config.jwt_expiration_hours,
            TokenKind::Refresh => config.refresh_expiration_hours,
        };
        let exp = now + Duration::hours(lifetime);

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            kind,
            exp: exp.unix_timestamp(),
            iat: now.unix_timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(token)
    }

    pub fn generate_pair(user_id: i64, email: &str, config: &ServerConfig) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: Self::generate_token(user_id, email, TokenKind::Access, config)?,
            refresh_token: Self::generate_token(user_id, email, TokenKind::Refresh, config)?,
        })
    }

    /// Verify and decode a JWT, rejecting tokens of the wrong kind
    pub fn verify_token(token: &str, kind: TokenKind, config: &ServerConfig) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        if token_data.claims.kind != kind {
            return Err(AppError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateFormat;
    use crate::models::MilestoneDeletePolicy;
    use crate::telemetry::LogFormat;

    fn config() -> ServerConfig {
        ServerConfig {
            jwt_secret: "unit-test-secret-that-is-long-enough".to_string(),
            jwt_expiration_hours: 1,
            refresh_expiration_hours: 24,
            host: "127.0.0.1".to_string(),
            port: 0,
            date_format: DateFormat::Array,
            milestone_delete_policy: MilestoneDeletePolicy::Unlink,
            log_format: LogFormat::Pretty,
        }
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = AuthService::hash_password("hunter22").unwrap();
        assert!(AuthService::verify_password("hunter22", &hash).unwrap());
        assert!(!AuthService::verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let config = config();
        let pair = AuthService::generate_pair(7, "a@b.c", &config).unwrap();

        let claims = AuthService::verify_token(&pair.access_token, TokenKind::Access, &config).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "a@b.c");

        assert!(matches!(
            AuthService::verify_token(&pair.refresh_token, TokenKind::Access, &config),
            Err(AppError::InvalidToken)
        ));
        assert!(AuthService::verify_token(&pair.refresh_token, TokenKind::Refresh, &config).is_ok());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let config = config();
        let token = AuthService::generate_token(1, "a@b.c", TokenKind::Access, &config).unwrap();

        let other = ServerConfig {
            jwt_secret: "a-different-secret-of-enough-length".to_string(),
            ..config
        };
        assert!(AuthService::verify_token(&token, TokenKind::Access, &other).is_err());
    }
}
