//! Server-Sent Events stream for focus sessions.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use hyperfocus::core::types::FocusMode;
use hyperfocus::io::generator::Generator;
use hyperfocus::streamer::SessionMessage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::routes::ApiError;
use crate::state::{AppState, SessionRegistration};

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    mode: FocusMode,
    #[serde(default)]
    target_minutes: Option<u32>,
    #[serde(default)]
    task_title: Option<String>,
}

/// First event of every session stream.
#[derive(Debug, Serialize)]
struct SessionOpened {
    session_id: Uuid,
    mode: FocusMode,
    target_minutes: u32,
}

/// POST /v1/sessions - start a session and stream its guardian messages.
///
/// Event names: `session` (id for the control endpoints), then one event per
/// checkpoint named after its kind (`start`, `mid_check`, `distraction`, `end`).
pub async fn start_session<G: Generator + 'static>(
    State(state): State<AppState<G>>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let target_minutes = request
        .target_minutes
        .unwrap_or(state.app.default_target_minutes());
    let task_title = request
        .task_title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty());
    let session = state
        .app
        .streamer()
        .start(request.mode, target_minutes, task_title)
        .map_err(ApiError::bad_request)?;

    let registration = state.register(session.control().clone());
    info!(session_id = %registration.id(), mode = %request.mode, target_minutes, "session opened");
    let opened = SessionOpened {
        session_id: registration.id(),
        mode: request.mode,
        target_minutes,
    };
    let stream = session_events(registration, opened, session.into_stream());

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}

/// Wrap session messages as SSE events. The registration lives as long as the stream.
fn session_events(
    registration: SessionRegistration,
    opened: SessionOpened,
    messages: impl Stream<Item = SessionMessage> + Send + 'static,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    async_stream::stream! {
        let _registration = registration;
        if let Some(event) = json_event("session", &opened) {
            yield Ok(event);
        }

        let mut messages = Box::pin(messages);
        while let Some(message) = messages.next().await {
            if let Some(event) = json_event(message.kind(), &message) {
                yield Ok(event);
            }
        }
    }
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Option<Event> {
    match serde_json::to_string(payload) {
        Ok(json) => Some(Event::default().event(name).data(json)),
        Err(err) => {
            warn!(event = name, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}
