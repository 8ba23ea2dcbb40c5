// src/session.rs
//! Signed-in user as supplied by the identity provider.
//!
//! The client never manages sessions itself. It only reads who is signed in,
//! either from explicit values or from the provider's session token.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Read-only view of the current session.
pub trait Identity: Send + Sync {
    fn current_user(&self) -> Option<User>;

    fn is_signed_in(&self) -> bool {
        self.current_user().is_some()
    }

    fn user_id(&self) -> Option<String> {
        self.current_user().map(|u| u.id)
    }

    /// Name for greetings, "User" when unknown.
    fn greeting_name(&self) -> String {
        self.current_user()
            .and_then(|u| u.display_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "User".to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<User>,
}

impl StaticIdentity {
    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl Identity for StaticIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Session token has no subject")]
    MissingSubject,
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    first_name: Option<String>,
    email: Option<String>,
}

/// Identity read from a session token issued by the identity provider.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    user: User,
}

impl TokenIdentity {
    /// Read the user claims from a JWT. The signature is not checked here;
    /// the analysis service does that on its side.
    pub fn from_token(token: &str) -> Result<Self, SessionError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<SessionClaims>(token.trim(), &DecodingKey::from_secret(&[]), &validation)?;
        let claims = data.claims;

        let id = claims
            .sub
            .filter(|s| !s.trim().is_empty())
            .ok_or(SessionError::MissingSubject)?;
        debug!("Session token resolved to user {}", id);

        let display_name = claims.first_name.or(claims.given_name).or(claims.name);
        if display_name.is_none() {
            warn!("Session token for {} carries no display name", id);
        }

        Ok(Self {
            user: User {
                id,
                display_name,
                email: claims.email,
            },
        })
    }
}

impl Identity for TokenIdentity {
    fn current_user(&self) -> Option<User> {
        Some(self.user.clone())
    }
}
