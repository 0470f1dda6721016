use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::Role;

mod password;

pub use password::{hash_password, verify_password};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unexpected token kind")]
    WrongTokenKind,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub kind: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token_type: &'static str,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs and verifies HS256 tokens with the configured secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(config: &SecurityConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let secret = config.jwt_secret.as_bytes();
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::minutes(config.access_expiry_minutes),
            refresh_ttl: Duration::days(config.refresh_expiry_days),
        })
    }

    fn sign(&self, user_id: i64, role: Role, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            role,
            kind,
            jti: Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn issue(&self, user_id: i64, role: Role) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            token_type: "Bearer",
            access_token: self.sign(user_id, role, TokenKind::Access)?,
            refresh_token: self.sign(user_id, role, TokenKind::Refresh)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Decode and validate a token, requiring it to be of `kind`
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(format!("Invalid JWT token: {}", e)))?
            .claims;

        if claims.kind != kind {
            return Err(AuthError::WrongTokenKind);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(&SecurityConfig {
            jwt_secret: "test-secret".into(),
            access_expiry_minutes: 5,
            refresh_expiry_days: 1,
            cors_origins: vec![],
        })
        .unwrap()
    }

    #[test]
    fn issued_tokens_verify_with_their_kind() {
        let keys = keys();
        let pair = keys.issue(42, Role::User).unwrap();
        let claims = keys.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::User);
        assert_eq!(pair.expires_in, 300);

        let refresh = keys.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.kind, TokenKind::Refresh);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys();
        let pair = keys.issue(1, Role::Admin).unwrap();
        assert!(matches!(
            keys.verify(&pair.refresh_token, TokenKind::Access),
            Err(AuthError::WrongTokenKind)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            keys().verify("not.a.jwt", TokenKind::Access),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn empty_secret_is_refused() {
        let config = SecurityConfig {
            jwt_secret: String::new(),
            access_expiry_minutes: 5,
            refresh_expiry_days: 1,
            cors_origins: vec![],
        };
        assert!(matches!(JwtKeys::new(&config), Err(AuthError::MissingSecret)));
    }
}
