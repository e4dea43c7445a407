use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    config::AppConfig, db::app_storage::AppStorage, error::AppError, feed::TaskFeed,
    middleware::auth::Auth, utils::offset_from_minutes,
};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<AppStorage>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<Auth>,
    pub feed: Arc<TaskFeed>,
}

impl AppState {
    pub fn new(storage: AppStorage, config: AppConfig, auth: Auth) -> Self {
        Self {
            storage: Arc::new(storage),
            config: Arc::new(config),
            auth: Arc::new(auth),
            feed: Arc::new(TaskFeed::new()),
        }
    }

    /// Resolves the caller's offset, falling back to the configured default.
    pub fn offset_for(&self, tz_offset: Option<i32>) -> Result<FixedOffset, AppError> {
        match tz_offset {
            Some(minutes) => offset_from_minutes(minutes)
                .ok_or_else(|| AppError::bad_request(format!("tzOffset out of range: {minutes}"))),
            None => Ok(self.config.default_offset()),
        }
    }

    /// Current time on the caller's clock.
    pub fn now_for(&self, tz_offset: Option<i32>) -> Result<DateTime<FixedOffset>, AppError> {
        Ok(Utc::now().with_timezone(&self.offset_for(tz_offset)?))
    }
}
