//! Identity collaborator: sign-up, sign-in, sign-out, current-session.
//!
//! Accounts and bearer sessions live in memory next to the rest of the data.
//! Passwords are bcrypt-hashed; a session is an opaque uuid presented as
//! `Authorization: Bearer <token>`. Input validation happens here, before
//! anything is stored, so handlers can surface the message inline.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug)]
struct Account {
    id: String,
    email: String,
    password_hash: String,
}

/// A freshly opened session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Clone, Default)]
pub struct AuthService {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    by_email: Arc<RwLock<HashMap<String, String>>>,
    sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl AuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account. Local validation first; only then the uniqueness
    /// check and the hash. Returns the new user id.
    #[instrument(level = "info", skip(self, password), fields(%email))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<String, AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }

        let mut by_email = self.by_email.write().await;
        if by_email.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }

        let password_hash =
            bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AuthError::Hash(e.to_string()))?;
        let id = Uuid::new_v4().to_string();
        let account = Account {
            id: id.clone(),
            email: email.to_string(),
            password_hash,
        };

        by_email.insert(email.to_string(), id.clone());
        self.accounts.write().await.insert(id.clone(), account);
        info!(target: "designgym_backend", user_id = %id, "Account created");
        Ok(id)
    }

    /// Open a session for valid credentials.
    #[instrument(level = "info", skip(self, password), fields(%email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        let account = {
            let by_email = self.by_email.read().await;
            let accounts = self.accounts.read().await;
            by_email
                .get(email)
                .and_then(|id| accounts.get(id))
                .cloned()
                .ok_or(AuthError::InvalidCredentials)?
        };

        let ok = bcrypt::verify(password, &account.password_hash)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let token = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), account.id.clone());
        Ok(SessionHandle {
            token,
            user_id: account.id,
        })
    }

    /// Drop a session. Returns whether the token was known.
    #[instrument(level = "info", skip(self, token))]
    pub async fn sign_out(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Current-session retrieval: token -> user id.
    pub async fn current_user(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn email_for(&self, user_id: &str) -> Option<String> {
        self.accounts
            .read()
            .await
            .get(user_id)
            .map(|a| a.email.clone())
    }
}
