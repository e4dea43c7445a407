use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{schema::Priority, utils::time_sortable_uid};

/// A single dated task in a user's collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Time-sortable id assigned by the store.
    pub id: String,
    pub description: String,
    /// Local midnight of the day the task is planned for, stored in UTC.
    pub date: DateTime<Utc>,
    pub hours: u8,
    pub minutes: u8,
    pub priority: Priority,
    pub completed: bool,
    /// When the task was created.
    pub timestamp: DateTime<Utc>,
}

impl Task {
    pub fn new(
        description: String,
        date: DateTime<Utc>,
        hours: u8,
        minutes: u8,
        priority: Priority,
    ) -> Self {
        Task {
            id: time_sortable_uid(),
            description,
            date,
            hours,
            minutes,
            priority,
            completed: false,
            timestamp: Utc::now(),
        }
    }

    /// Minutes since midnight, the sort key inside a day.
    pub fn minute_of_day(&self) -> u32 {
        self.hours as u32 * 60 + self.minutes as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        User {
            uid: Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: now,
            last_login_at: now,
        }
    }
}
