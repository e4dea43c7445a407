use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    agenda::stats::TaskStats, error::AppError, middleware::AuthenticatedUser,
    schema::AnalyticsResponse, state::AppState,
};

pub async fn get_analytics(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = state.storage.tasks.list_for_user(&user.uid)?;
    let stats = TaskStats::compute(&tasks);
    Ok(Json(AnalyticsResponse::from(stats)))
}
