use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::storage::{Storage, StorageError};
use crate::validation::{is_valid_password, is_valid_username};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid username: use 3-32 letters, digits, '_', '.' or '-'")]
    InvalidUsername,
    #[error("invalid password: use 8-128 characters with at least one letter and one digit")]
    InvalidPassword,
    #[error("malformed username or password")]
    InvalidCredentialsFormat,
    #[error("username already taken")]
    UsernameTaken,
    #[error("no such user")]
    NoSuchUser,
    #[error("wrong password")]
    WrongPassword,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Registers users and checks their passwords against the stored hashes.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if !is_valid_username(username) {
            warn!("invalid username");
            return Err(AuthError::InvalidUsername);
        }
        if !is_valid_password(password) {
            warn!("invalid password");
            return Err(AuthError::InvalidPassword);
        }

        // Fast path only; the unique key below is what actually decides.
        if self.storage.find_user(username).await?.is_some() {
            warn!("username already registered");
            return Err(AuthError::UsernameTaken);
        }

        let plain = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        match self.storage.insert_user(username, &hash).await {
            Ok(_) => {
                info!("user registered");
                Ok(())
            }
            Err(StorageError::Conflict(_)) => {
                warn!("username taken by a concurrent registration");
                Err(AuthError::UsernameTaken)
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if !is_valid_username(username) || !is_valid_password(password) {
            warn!("malformed credentials");
            return Err(AuthError::InvalidCredentialsFormat);
        }

        let user = match self.storage.find_user(username).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!("login unknown username");
                return Err(AuthError::NoSuchUser);
            }
            Err(e) => {
                error!(error = %e, "find user failed");
                return Err(e.into());
            }
        };

        let plain = password.to_owned();
        let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &user.password_hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !ok {
            warn!("login invalid password");
            return Err(AuthError::WrongPassword);
        }

        info!("user logged in");
        Ok(())
    }
}
