//! src/schema.rs
//!
//! Contains all public-facing API data structures.
//! These structs define the JSON contracts between the UI and the task server.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Task;

//=============================================================================
//  Enums & Common Types
//=============================================================================

/// How important a task is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Which slice of the collection a list view shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaskFilter {
    /// Only tasks planned for the current calendar day, ordered by time of day.
    #[default]
    Today,
    /// Every task, ordered by date.
    All,
}

/// Query parameters of the list and agenda endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub filter: TaskFilter,
    /// Minutes east of UTC of the caller's clock.
    pub tz_offset: Option<i32>,
}

/// Query carrying only the caller's clock offset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockQuery {
    pub tz_offset: Option<i32>,
}

/// The live socket cannot send headers from a browser, so the session token
/// travels in the query string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuery {
    pub token: String,
    #[serde(default)]
    pub filter: TaskFilter,
    pub tz_offset: Option<i32>,
}

//=============================================================================
//  Account API
//=============================================================================

/// Body of both sign-up and sign-in requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Session issued after a successful sign-up or sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// The JSON Web Token to send as `Authorization: Bearer ...`.
    pub token: String,
    /// The token's validity period in seconds.
    pub expires_in: u64,
    pub uid: String,
    pub email: String,
}

/// Profile data shown on the settings screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub uid: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub platform: String,
}

//=============================================================================
//  Task API
//=============================================================================

/// Request body for creating a task. Every field is optional on the wire so
/// a half-filled form produces one validation error instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub description: Option<String>,
    /// Calendar day in the caller's clock, `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
    pub hours: Option<u8>,
    pub minutes: Option<u8>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub completed: bool,
}

/// A task as the list shows it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    /// Planned for today and its time has come.
    pub due: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub filter: TaskFilter,
    pub tasks: Vec<TaskView>,
}

/// One calendar day of the agenda.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGroup {
    pub date: NaiveDate,
    /// `D-M-YYYY`
    pub label: String,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaResponse {
    pub filter: TaskFilter,
    pub groups: Vec<DayGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted: usize,
}

//=============================================================================
//  Analytics API
//=============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub label: String,
    pub value: usize,
}

/// A pie chart and whether it has anything to draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChart {
    pub has_data: bool,
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub priority_chart: PieChart,
    pub completion_chart: PieChart,
}

//=============================================================================
//  Live feed
//=============================================================================

/// Messages pushed over the live task socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LiveMessage {
    #[serde(rename_all = "camelCase")]
    Snapshot {
        revision: u64,
        filter: TaskFilter,
        groups: Vec<DayGroup>,
    },
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}
