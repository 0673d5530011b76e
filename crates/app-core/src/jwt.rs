//! Creation and validation of the signed session token (a JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token format or signature")]
    InvalidToken,

    #[error("Failed to create token")]
    TokenCreation,
}

/// Claims carried by the session token. `sub` is the identity provider's
/// user id; the profile claims travel with it so pages can render without
/// a database read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub iss: String,
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

/// The identity half of [`Claims`]: everything the caller supplies; the
/// registered claims (`iss`, `jti`, `iat`, `exp`) are stamped at signing.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionIdentity {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenManager: Send + Sync {
    fn create_session_token(&self, identity: &SessionIdentity) -> Result<String, JwtError>;
    fn validate_session_token(&self, token: &str) -> Result<Claims, JwtError>;
}

pub struct JwtConfig {
    pub secret: String,
    pub max_age_secs: i64,
    pub issuer: String,
}

pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl TokenManager for JwtService {
    fn create_session_token(&self, identity: &SessionIdentity) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = (now + Duration::seconds(self.config.max_age_secs)).timestamp() as usize;
        let iat = now.timestamp() as usize;

        let claims = Claims {
            sub: identity.id.clone(),
            username: identity.username.clone(),
            name: identity.name.clone(),
            picture: identity.picture.clone(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
            exp,
            iat,
        };

        let header = Header::new(Algorithm::HS512);
        encode(&header, &claims, &EncodingKey::from_secret(self.config.secret.as_ref()))
            .map_err(|_| JwtError::TokenCreation)
    }

    fn validate_session_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<Claims>(token, &DecodingKey::from_secret(self.config.secret.as_ref()), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn create_test_config() -> JwtConfig {
        JwtConfig {
            secret: "test_session_secret_key_12345".to_string(),
            max_age_secs: 2_592_000, // 30 days
            issuer: "test_issuer".to_string(),
        }
    }

    fn create_jwt_service() -> JwtService {
        JwtService::new(create_test_config())
    }

    fn test_identity() -> SessionIdentity {
        SessionIdentity {
            id: "42".to_string(),
            username: Some("alice".to_string()),
            name: Some("Alice".to_string()),
            picture: Some("https://cdn.example.com/alice.jpg".to_string()),
        }
    }

    #[test]
    fn test_create_token_success() {
        let service = create_jwt_service();

        let result = service.create_session_token(&test_identity());

        assert!(result.is_ok());
        let token = result.unwrap();
        assert!(!token.is_empty());
        assert!(token.contains("."));
    }

    #[test]
    fn test_validate_token_success() {
        let service = create_jwt_service();

        let token = service.create_session_token(&test_identity()).unwrap();
        let result = service.validate_session_token(&token);

        assert!(result.is_ok());
        let claims = result.unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.name.as_deref(), Some("Alice"));
        assert_eq!(claims.picture.as_deref(), Some("https://cdn.example.com/alice.jpg"));
        assert_eq!(claims.iss, "test_issuer");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_optional_claims_absent() {
        let service = create_jwt_service();
        let identity = SessionIdentity { id: "7".to_string(), username: None, name: None, picture: None };

        let token = service.create_session_token(&identity).unwrap();
        let claims = service.validate_session_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert!(claims.username.is_none());
        assert!(claims.name.is_none());
        assert!(claims.picture.is_none());
    }

    #[test]
    fn test_unique_jti_for_each_token() {
        let service = create_jwt_service();

        let token1 = service.create_session_token(&test_identity()).unwrap();
        let token2 = service.create_session_token(&test_identity()).unwrap();

        let claims1 = service.validate_session_token(&token1).unwrap();
        let claims2 = service.validate_session_token(&token2).unwrap();

        assert_ne!(claims1.jti, claims2.jti);
        assert_eq!(claims1.sub, claims2.sub); // Same user
    }

    #[test]
    fn test_claims_timestamps() {
        let service = create_jwt_service();

        let before_creation = Utc::now().timestamp() as usize;
        let token = service.create_session_token(&test_identity()).unwrap();
        let after_creation = Utc::now().timestamp() as usize;

        let claims = service.validate_session_token(&token).unwrap();

        assert!(claims.iat >= before_creation);
        assert!(claims.iat <= after_creation);
        assert!(claims.exp > claims.iat);

        let expected_exp = claims.iat + service.config.max_age_secs as usize;
        assert_eq!(claims.exp, expected_exp);
    }

    #[test]
    fn test_validate_token_with_wrong_secret() {
        let service = create_jwt_service();
        let other = JwtService::new(JwtConfig {
            secret: "a_completely_different_secret".to_string(),
            max_age_secs: 3600,
            issuer: "test_issuer".to_string(),
        });

        let token = other.create_session_token(&test_identity()).unwrap();
        let result = service.validate_session_token(&token);

        assert!(result.is_err());
        match result.unwrap_err() {
            JwtError::InvalidToken => (),
            _ => panic!("Expected InvalidToken error"),
        }
    }

    #[test]
    fn test_validate_malformed_token() {
        let service = create_jwt_service();
        let malformed_token = "not_a_valid_jwt_at_all";

        let result = service.validate_session_token(malformed_token);

        assert!(result.is_err());
        match result.unwrap_err() {
            JwtError::InvalidToken => (),
            _ => panic!("Expected InvalidToken error"),
        }
    }

    #[test]
    fn test_token_expiration() {
        let mut config = create_test_config();
        config.max_age_secs = -1_000_000; // already expired at creation
        let service = JwtService::new(config);

        let token = service.create_session_token(&test_identity()).unwrap();
        let result = service.validate_session_token(&token);

        assert!(result.is_err());
        match result.unwrap_err() {
            JwtError::TokenExpired => (),
            _ => panic!("Expected TokenExpired error"),
        }
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let token = JwtService::new(JwtConfig {
            secret: "test_session_secret_key_12345".to_string(),
            max_age_secs: 3600,
            issuer: "someone-else".to_string(),
        })
        .create_session_token(&test_identity())
        .unwrap();

        let result = create_jwt_service().validate_session_token(&token);

        assert!(result.is_err());
        match result.unwrap_err() {
            JwtError::InvalidToken => (),
            _ => panic!("Expected InvalidToken error"),
        }
    }
}
