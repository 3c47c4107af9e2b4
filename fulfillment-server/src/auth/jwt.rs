//! JWT token service
//!
//! Token generation, validation and the per-request user context.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::models::Role;
use thiserror::Error;

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret (at least 32 bytes)
    pub secret: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        let secret = match load_jwt_secret() {
            Ok(secret) => secret,
            Err(e) => {
                #[cfg(debug_assertions)]
                {
                    tracing::warn!("JWT configuration error: {}, generating temporary key", e);
                    generate_printable_secret()
                }
                #[cfg(not(debug_assertions))]
                {
                    panic!("FATAL: JWT_SECRET configuration failed: {}", e);
                }
            }
        };

        Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "fulfillment-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "brewhaul-clients".to_string()),
        }
    }
}

/// Claims carried in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject)
    pub sub: String,
    pub username: String,
    /// Role name: customer | rider | admin
    pub role: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Generate a printable random secret, for development only
fn generate_printable_secret() -> String {
    let allowed =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

    let rng = SystemRandom::new();
    let mut key = String::with_capacity(64);
    for _ in 0..64 {
        let mut byte = [0u8; 1];
        if rng.fill(&mut byte).is_err() {
            return "BrewhaulDevelopmentFallbackSecret2026!".to_string();
        }
        let idx = (byte[0] as usize) % allowed.len();
        key.push(allowed.as_bytes()[idx] as char);
    }
    key
}

/// Load JWT secret from the environment
fn load_jwt_secret() -> Result<String, JwtError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) => {
            if secret.len() < 32 {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET must be at least 32 characters long".to_string(),
                ));
            }
            Ok(secret)
        }
        Err(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!("JWT_SECRET not set, generating temporary development key");
                Ok(generate_printable_secret())
            }
            #[cfg(not(debug_assertions))]
            {
                Err(JwtError::ConfigError(
                    "JWT_SECRET environment variable must be set in production".to_string(),
                ))
            }
        }
    }
}

/// JWT token service
#[derive(Debug, Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new()
    }
}

impl JwtService {
    pub fn new() -> Self {
        Self::with_config(JwtConfig::default())
    }

    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate a new access token for the user
    pub fn generate_token(
        &self,
        user_id: &str,
        username: &str,
        role: Role,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.as_str().to_string(),
            token_type: "access".to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Extract the bearer token from an Authorization header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// Authenticated user for the current request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role: Role = claims.role.parse()?;
        Ok(Self {
            id: claims.sub,
            username: claims.username,
            role,
        })
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_rider(&self) -> bool {
        self.role == Role::Rider
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-at-least-32-characters-long!".to_string(),
            expiration_minutes: 60,
            issuer: "fulfillment-server".to_string(),
            audience: "brewhaul-clients".to_string(),
        })
    }

    #[test]
    fn test_generate_and_validate() {
        let svc = test_service();
        let token = svc.generate_token("USR-1", "alice", Role::Rider).unwrap();
        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "USR-1");
        assert_eq!(claims.role, "rider");

        let user = CurrentUser::try_from(claims).unwrap();
        assert!(user.is_rider());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_reject_tampered_token() {
        let svc = test_service();
        let token = svc.generate_token("USR-1", "alice", Role::Admin).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(svc.validate_token(&tampered).is_err());
    }

    #[test]
    fn test_reject_unknown_role_claim() {
        let claims = Claims {
            sub: "USR-1".into(),
            username: "alice".into(),
            role: "superuser".into(),
            token_type: "access".into(),
            exp: 0,
            iat: 0,
            iss: "fulfillment-server".into(),
            aud: "brewhaul-clients".into(),
        };
        assert!(CurrentUser::try_from(claims).is_err());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(
            JwtService::extract_from_header("Bearer abc.def.ghi"),
            Some("abc.def.ghi")
        );
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
