// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::ValidatedConfig;
use crate::iam::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // Subject (user email)
    pub name: String, // User's display name
    pub role: String, // Role at issue time; the middleware re-reads the store
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub enum JwtError {
    TokenCreation(String),
    TokenVerification(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenCreation(msg) => write!(f, "Failed to create token: {}", msg),
            JwtError::TokenVerification(msg) => write!(f, "Failed to verify token: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}

pub struct JwtService {
    secret: String,
    issuer: String,
    audience: String,
    expiration_hours: u64,
    cookie_name: String,
    secure_cookies: bool,
}

impl JwtService {
    pub fn new(config: &ValidatedConfig) -> Self {
        let jwt = &config.auth.jwt;
        // Localhost deployments run plain HTTP; everything else gets Secure.
        let secure_cookies =
            !matches!(config.server.host.as_str(), "127.0.0.1" | "localhost" | "::1");
        JwtService {
            secret: jwt.secret.clone(),
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            expiration_hours: jwt.expiration_hours,
            cookie_name: jwt.cookie_name.clone(),
            secure_cookies,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn create_token(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.expiration_hours as i64);

        let claims = Claims {
            sub: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| JwtError::TokenCreation(e.to_string()))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| JwtError::TokenVerification(e.to_string()))
    }

    /// HTTP-only auth cookie carrying the JWT.
    pub fn create_auth_cookie<'a>(&self, token: &str) -> actix_web::cookie::Cookie<'a> {
        let expiration = Utc::now() + Duration::hours(self.expiration_hours as i64);
        let expires = actix_web::cookie::time::OffsetDateTime::from_unix_timestamp(
            expiration.timestamp(),
        )
        .unwrap_or(actix_web::cookie::time::OffsetDateTime::UNIX_EPOCH);

        actix_web::cookie::Cookie::build(self.cookie_name.clone(), token.to_string())
            .path("/")
            .secure(self.secure_cookies)
            .http_only(true)
            .same_site(actix_web::cookie::SameSite::Lax)
            .expires(expires)
            .finish()
    }

    /// Expired empty cookie used to clear the session on logout.
    pub fn create_logout_cookie<'a>(&self) -> actix_web::cookie::Cookie<'a> {
        actix_web::cookie::Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .secure(self.secure_cookies)
            .http_only(true)
            .same_site(actix_web::cookie::SameSite::Lax)
            .expires(actix_web::cookie::time::OffsetDateTime::UNIX_EPOCH)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::iam::types::{Role, UserStatus};

    fn test_service() -> JwtService {
        let config: Config =
            serde_yaml::from_str("auth:\n  jwt:\n    secret: \"unit-test-secret-key\"\n").unwrap();
        JwtService::new(&config.validate().unwrap())
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "teacher@example.edu".to_string(),
            name: "Some Teacher".to_string(),
            role: Role::Teacher,
            status: UserStatus::Active,
            password_hash: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips() {
        let service = test_service();
        let token = service.create_token(&test_user()).unwrap();
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "teacher@example.edu");
        assert_eq!(claims.role, "teacher");
        assert_eq!(claims.iss, "campanile");
    }

    #[test]
    fn tampered_token_fails_verification() {
        let service = test_service();
        let mut token = service.create_token(&test_user()).unwrap();
        token.push('x');
        assert!(service.verify_token(&token).is_err());
    }

    #[test]
    fn auth_cookie_is_http_only() {
        let service = test_service();
        let cookie = service.create_auth_cookie("token-value");
        assert_eq!(cookie.name(), "campanile_auth");
        assert_eq!(cookie.http_only(), Some(true));
    }
}
