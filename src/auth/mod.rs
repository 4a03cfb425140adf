pub mod identity;
pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::User;

/// Bearer token claims: registered claims plus the user's profile and roles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub izaro_code: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// A signed token and the instant it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates HS256 bearer tokens
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
    issuer: String,
    audience: String,
    expiry: Duration,
    leeway_secs: u64,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>, expiry: Duration) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            expiry,
            leeway_secs: 0,
        }
    }

    pub fn from_config() -> Self {
        let security = &config::config().security;
        Self {
            leeway_secs: security.jwt_leeway_secs,
            ..Self::new(
                security.jwt_secret.clone(),
                security.jwt_issuer.clone(),
                security.jwt_audience.clone(),
                Duration::minutes(security.jwt_expiry_minutes),
            )
        }
    }

    pub fn issue(&self, user: &User, roles: &[String]) -> Result<IssuedToken, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let now = Utc::now();
        let expires_at = now + self.expiry;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            izaro_code: user.izaro_code.clone(),
            roles: roles.to_vec(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, issuer, audience and lifetime
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway_secs;

        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            normalized_email: "ANA@EXAMPLE.COM".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Etxeberria".to_string(),
            izaro_code: "IZ-001".to_string(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret-test-secret-test-secret", "zero-api", "zero-frontend", Duration::minutes(5))
    }

    #[test]
    fn token_round_trips_custom_claims() {
        let user = user();
        let issued = issuer().issue(&user, &["Admin".to_string()]).unwrap();
        let claims = issuer().validate(&issued.token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.first_name, "Ana");
        assert_eq!(claims.last_name, "Etxeberria");
        assert_eq!(claims.izaro_code, "IZ-001");
        assert!(claims.has_role("admin"));
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn rejects_wrong_audience() {
        let issued = issuer().issue(&user(), &[]).unwrap();
        let other = TokenIssuer::new("test-secret-test-secret-test-secret", "zero-api", "someone-else", Duration::minutes(5));
        assert!(matches!(other.validate(&issued.token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_wrong_secret() {
        let issued = issuer().issue(&user(), &[]).unwrap();
        let other = TokenIssuer::new("another-secret-another-secret-xx", "zero-api", "zero-frontend", Duration::minutes(5));
        assert!(other.validate(&issued.token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let expired = TokenIssuer::new("test-secret-test-secret-test-secret", "zero-api", "zero-frontend", Duration::minutes(-10));
        let issued = expired.issue(&user(), &[]).unwrap();
        assert!(issuer().validate(&issued.token).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let blank = TokenIssuer::new("", "zero-api", "zero-frontend", Duration::minutes(5));
        assert!(matches!(blank.issue(&user(), &[]), Err(JwtError::MissingSecret)));
    }
}
