use std::sync::Arc;

use anyhow::{Result, anyhow};
use teamacy_db::Database;
use teamacy_mail::AdminNotifier;
use tracing::error;

use crate::token::TokenKeys;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenKeys,
    pub notifier: AdminNotifier,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenKeys, notifier: AdminNotifier) -> AppState {
        Arc::new(Self { db, tokens, notifier })
    }
}

/// Run blocking work (SQLite, password hashing) off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        anyhow!("blocking task failed: {}", e)
    })?
}
