use std::sync::Arc;

use crate::errors::{ApiError, ApiResult};
use crate::password::{hash_password, verify_password};
use crate::store::UserStore;

/// Registration and password checks on top of a [`UserStore`].
#[derive(Clone)]
pub struct Credentials {
    users: Arc<dyn UserStore>,
}

impl Credentials {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Credentials { users }
    }

    /// Creates a user with a salted hash of `password`.
    ///
    /// The existence check and the insert are not atomic; concurrent identical
    /// registrations are caught by the store's uniqueness guarantee instead.
    pub async fn register(&self, username: &str, password: &str) -> ApiResult<i64> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(ApiError::DuplicateUsername);
        }
        let password_hash = hash_password(password)?;
        let id = self.users.insert(username, &password_hash).await?;
        log::info!("Registered user {} with id {}", username, id);
        Ok(id)
    }

    /// Unknown user and wrong password both yield `InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<String> {
        match self.users.find_by_username(username).await? {
            Some(user) if verify_password(&user.password_hash, password) => Ok(user.username),
            _ => Err(ApiError::InvalidCredentials),
        }
    }
}
