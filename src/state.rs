use std::sync::Arc;

use crate::auth::token::TokenIssuer;
use crate::config::Config;
use crate::store::{MemoryStore, SessionStore, UserRepository};

/// Everything a handler or middleware needs, built once at startup and
/// registered as `web::Data<AppState>`.
pub struct AppState {
    pub config: Config,
    pub tokens: TokenIssuer,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt);
        Self {
            config,
            tokens,
            users,
            sessions,
        }
    }

    /// State backed by one shared [`MemoryStore`] for users and sessions.
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }
}
