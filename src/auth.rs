//! User registration, login and bearer tokens.
//!
//! Passwords are hashed with bcrypt. Login issues an HS256 JWT carrying the
//! user id and email, valid for `token_ttl` (24 hours by default).
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{is_unique_violation, Database};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingFields,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token signing secret is not configured")]
    MissingSecret,
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AuthError {
    /// True for errors caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingFields
                | AuthError::EmailTaken
                | AuthError::PasswordMismatch
                | AuthError::InvalidCredentials
                | AuthError::InvalidToken(_)
        )
    }
}

/// Registration form: the password must be entered twice.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub email: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

pub struct AuthService {
    secret: SecretString,
    bcrypt_cost: u32,
    token_ttl: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("secret", &"[REDACTED]")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: SecretString, bcrypt_cost: u32, token_ttl: Duration) -> Self {
        Self {
            secret,
            bcrypt_cost,
            token_ttl,
        }
    }

    /// Creates an account and returns the new user id.
    pub async fn register(&self, db: &Database, registration: &Registration) -> Result<i64, AuthError> {
        let email = registration.email.trim();
        if email.is_empty() || registration.password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if registration.password != registration.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if db.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password = registration.password.clone();
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        match db.create_user(email, &hash).await {
            Ok(user_id) => {
                tracing::info!(user_id, "Registered user");
                Ok(user_id)
            }
            // Another request registered the same email since the check above
            Err(e) if is_unique_violation(&e) => Err(AuthError::EmailTaken),
            Err(e) => Err(AuthError::Database(e)),
        }
    }

    /// Checks credentials and returns a signed token.
    pub async fn login(&self, db: &Database, email: &str, password: &str) -> Result<String, AuthError> {
        let Some(user) = db.get_user_by_email(email.trim()).await? else {
            tracing::debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        if !valid {
            tracing::debug!(user_id = user.user_id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token(user.user_id, &user.email)
    }

    /// Signs a token for the given user.
    pub fn issue_token(&self, user_id: i64, email: &str) -> Result<String, AuthError> {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let claims = Claims {
            user_id,
            email: email.to_string(),
            exp: (Utc::now() + self.token_ttl).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Validates signature and expiry and returns the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}
