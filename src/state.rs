use std::sync::Arc;

use crate::credentials::Credentials;
use crate::store::{ProductStore, UserStore};
use crate::token::TokenService;

/// Everything a handler needs, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Credentials,
    pub products: Arc<dyn ProductStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, tokens: TokenService) -> Self
    where
        S: UserStore + ProductStore + 'static,
    {
        AppState {
            credentials: Credentials::new(store.clone()),
            products: store,
            tokens: Arc::new(tokens),
        }
    }
}
