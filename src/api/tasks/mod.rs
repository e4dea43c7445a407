use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    extract::{
        Path, Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{FixedOffset, Utc};
use futures::{Sink, SinkExt, StreamExt, future};
use log::{debug, info, warn};
use serde_json::json;

use crate::{
    agenda::{TASK_YEARS, build_agenda, filter_tasks, local_midnight, to_views},
    error::AppError,
    middleware::{AuthenticatedUser, authenticate_token},
    models::Task,
    schema::{
        AgendaResponse, ClockQuery, DeletedResponse, ListQuery, LiveMessage, LiveQuery,
        NewTaskRequest, TaskFilter, TaskListResponse, UpdateTaskRequest,
    },
    state::AppState,
};

/// Turns a submitted form into a task. All fields must be present; the date
/// is stored as midnight of that day on the caller's clock.
pub fn task_from_request(req: NewTaskRequest, offset: &FixedOffset) -> Result<Task, AppError> {
    let missing = || AppError::validation("all task fields must be filled in");

    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(missing)?;
    let date = req.date.ok_or_else(missing)?;
    let hours = req.hours.ok_or_else(missing)?;
    let minutes = req.minutes.ok_or_else(missing)?;
    let priority = req.priority.ok_or_else(missing)?;

    if hours > 23 {
        return Err(AppError::validation("hours must be between 0 and 23"));
    }
    if minutes > 59 {
        return Err(AppError::validation("minutes must be between 0 and 59"));
    }

    let midnight = local_midnight(date, offset).ok_or_else(|| {
        AppError::validation(format!(
            "date must fall in years {} to {}",
            TASK_YEARS.start(),
            TASK_YEARS.end()
        ))
    })?;

    Ok(Task::new(
        description.to_string(),
        midnight,
        hours,
        minutes,
        priority,
    ))
}

pub async fn create_task(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Query(clock): Query<ClockQuery>,
    Json(req): Json<NewTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let offset = state.offset_for(clock.tz_offset)?;
    let task = task_from_request(req, &offset)?;
    state.storage.tasks.add(&user.uid, &task)?;
    state.feed.publish(&user.uid);
    debug!("User {} added task {}", user.uid, task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let now = state.now_for(query.tz_offset)?;
    let tasks = state.storage.tasks.list_for_user(&user.uid)?;
    let filtered = filter_tasks(tasks, query.filter, &now);
    Ok(Json(TaskListResponse {
        filter: query.filter,
        tasks: to_views(filtered, &now),
    }))
}

pub async fn get_agenda(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let now = state.now_for(query.tz_offset)?;
    let tasks = state.storage.tasks.list_for_user(&user.uid)?;
    Ok(Json(AgendaResponse {
        filter: query.filter,
        groups: build_agenda(tasks, query.filter, &now),
    }))
}

pub async fn update_task(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let task = state
        .storage
        .tasks
        .set_completed(&user.uid, &id, req.completed)?;
    state.feed.publish(&user.uid);
    Ok(Json(task))
}

pub async fn delete_task(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.storage.tasks.delete(&user.uid, &id)? {
        return Err(AppError::not_found(format!("task {}", id)));
    }
    state.feed.publish(&user.uid);
    Ok(Json(json!({"message": "Task deleted"})))
}

pub async fn delete_all_tasks(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.storage.tasks.delete_all_for_user(&user.uid)?;
    state.feed.publish(&user.uid);
    info!("User {} cleared {} task(s)", user.uid, deleted);
    Ok(Json(DeletedResponse { deleted }))
}

/// What a live subscriber asked for. The token is kept so a signed-out
/// session stops receiving snapshots.
#[derive(Debug, Clone)]
pub struct LiveSession {
    pub uid: String,
    pub token: String,
    pub filter: TaskFilter,
    pub offset: FixedOffset,
}

pub async fn live_tasks_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<LiveQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate_token(&state, &query.token)?;
    let offset = state.offset_for(query.tz_offset)?;
    info!("User {} subscribed to live tasks", user.uid);

    let session = LiveSession {
        uid: user.uid,
        token: query.token,
        filter: query.filter,
        offset,
    };
    Ok(ws.on_upgrade(move |socket| handle_live_socket(socket, state, session)))
}

fn snapshot(state: &AppState, session: &LiveSession, revision: u64) -> LiveMessage {
    let now = Utc::now().with_timezone(&session.offset);
    match state.storage.tasks.list_for_user(&session.uid) {
        Ok(tasks) => LiveMessage::Snapshot {
            revision,
            filter: session.filter,
            groups: build_agenda(tasks, session.filter, &now),
        },
        Err(e) => {
            warn!("Failed to load tasks for live snapshot of {}: {}", session.uid, e);
            LiveMessage::Error {
                message: "failed to load tasks".to_string(),
            }
        }
    }
}

/// Pushes encoded [`LiveMessage`]s into `sink`: a snapshot right away, then
/// after every change of the collection and on each refresh tick so `due`
/// marks follow the clock. Returns when the sink fails, the feed goes away or
/// the session token is revoked; in the last case an error message is sent
/// and the sink closed.
pub async fn push_snapshots<S>(state: Arc<AppState>, session: LiveSession, mut sink: S)
where
    S: Sink<String> + Unpin,
{
    let mut changes = state.feed.subscribe(&session.uid);
    let refresh = Duration::from_secs(state.config.live_refresh_secs.max(1));
    let mut interval = tokio::time::interval(refresh);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let revoked = state.storage.users.is_token_revoked(&session.token);
        let message = if revoked {
            debug!("Live session of {} was signed out", session.uid);
            LiveMessage::Error {
                message: "session ended".to_string(),
            }
        } else {
            let revision = *changes.borrow_and_update();
            snapshot(&state, &session, revision)
        };

        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode live snapshot: {}", e);
                continue;
            }
        };
        if sink.send(text).await.is_err() {
            debug!("Live socket of {} is gone", session.uid);
            break;
        }
        if revoked {
            let _ = sink.close().await;
            break;
        }
    }
}

async fn handle_live_socket(socket: WebSocket, state: Arc<AppState>, session: LiveSession) {
    let uid = session.uid.clone();
    let (sender, mut receiver) = socket.split();
    let sink = sender.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(Message::Text(text.into())))
    });

    let mut send_task = tokio::spawn(push_snapshots(state, session, sink));

    let recv_uid = uid.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Live socket error for {}: {}", recv_uid, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!("User {} left live tasks", uid);
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::schema::Priority;

    fn full_request() -> NewTaskRequest {
        NewTaskRequest {
            description: Some("  buy milk ".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 10, 18),
            hours: Some(9),
            minutes: Some(15),
            priority: Some(Priority::Low),
        }
    }

    #[test]
    fn complete_form_becomes_a_task() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let task = task_from_request(full_request(), &offset).unwrap();
        assert_eq!(task.description, "buy milk");
        assert_eq!(task.date, Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap());
        assert_eq!((task.hours, task.minutes), (9, 15));
        assert!(!task.completed);
    }

    #[test]
    fn any_missing_field_is_rejected() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let cases = [
            NewTaskRequest {
                description: None,
                ..full_request()
            },
            NewTaskRequest {
                description: Some("   ".to_string()),
                ..full_request()
            },
            NewTaskRequest {
                date: None,
                ..full_request()
            },
            NewTaskRequest {
                hours: None,
                ..full_request()
            },
            NewTaskRequest {
                minutes: None,
                ..full_request()
            },
            NewTaskRequest {
                priority: None,
                ..full_request()
            },
        ];
        for req in cases {
            let err = task_from_request(req, &offset).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn zero_hour_and_minute_are_valid() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let req = NewTaskRequest {
            hours: Some(0),
            minutes: Some(0),
            ..full_request()
        };
        assert!(task_from_request(req, &offset).is_ok());
    }

    #[test]
    fn dates_outside_supported_years_are_rejected() {
        let far_east = FixedOffset::east_opt(10 * 3600).unwrap();
        let far_west = FixedOffset::west_opt(10 * 3600).unwrap();
        let cases = [
            (NaiveDate::MIN, far_east),
            (NaiveDate::MAX, far_west),
            (NaiveDate::from_ymd_opt(10000, 1, 1).unwrap(), far_east),
        ];
        for (date, offset) in cases {
            let req = NewTaskRequest {
                date: Some(date),
                ..full_request()
            };
            let err = task_from_request(req, &offset).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        let last = NaiveDate::from_ymd_opt(9999, 12, 31);
        let req = NewTaskRequest {
            date: last,
            ..full_request()
        };
        assert!(task_from_request(req, &far_west).is_ok());
    }

    #[test]
    fn out_of_range_time_is_rejected() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let late = NewTaskRequest {
            hours: Some(24),
            ..full_request()
        };
        let odd = NewTaskRequest {
            minutes: Some(60),
            ..full_request()
        };
        assert!(task_from_request(late, &offset).is_err());
        assert!(task_from_request(odd, &offset).is_err());
    }
}
