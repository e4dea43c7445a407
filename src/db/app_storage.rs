use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;

use crate::db::{tasks::TaskStorage, users::CachedUserStorage};

// Composite storage for accounts and their task collections
#[derive(Clone)]
pub struct AppStorage {
    pub users: Arc<CachedUserStorage>,
    pub tasks: Arc<TaskStorage>,
}

impl AppStorage {
    /// Opens `users/` and `tasks/` under `base_path`. Signed-out tokens are
    /// remembered for `token_ttl`, the lifetime of a session.
    pub fn new(base_path: &str, token_ttl: Duration) -> anyhow::Result<Self> {
        Self::with_cache_ttl(base_path, Duration::from_secs(120), token_ttl)
    }

    pub fn with_cache_ttl(
        base_path: &str,
        user_cache_ttl: Duration,
        token_ttl: Duration,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(base_path)
            .with_context(|| format!("Failed to create storage root {}", base_path))?;

        let users_path = PathBuf::from(base_path).join("users");
        let tasks_path = PathBuf::from(base_path).join("tasks");

        let users = Arc::new(CachedUserStorage::new(
            path_str(&users_path)?,
            user_cache_ttl,
            token_ttl,
        )?);
        let tasks = Arc::new(TaskStorage::open(path_str(&tasks_path)?)?);

        Ok(Self { users, tasks })
    }

    /// (cached users, revoked tokens)
    pub fn get_cache_stats(&self) -> (usize, usize) {
        self.users.get_cache_stats()
    }

    pub fn cleanup_expired(&self) {
        self.users.cleanup_expired();
    }
}

fn path_str(path: &Path) -> anyhow::Result<&str> {
    path.to_str()
        .with_context(|| format!("Storage path is not valid UTF-8: {}", path.display()))
}
