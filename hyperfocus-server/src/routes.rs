//! HTTP route handlers for the focus-agent API.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use hyperfocus::concepts;
use hyperfocus::core::types::{EnergyLevel, OptimalTaskType, TaskType, TimeOfDay};
use hyperfocus::io::generator::Generator;
use hyperfocus::streamer::ControlError;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::sse;
use crate::state::AppState;

/// Error response: a status code with a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn not_found(message: impl ToString) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }

    fn conflict(message: impl ToString) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Build the versioned API router.
pub fn api_router<G: Generator + 'static>() -> Router<AppState<G>> {
    Router::new()
        .route("/categorize", post(categorize::<G>))
        .route("/coaching", post(coaching::<G>))
        .route("/energy-advice", post(energy_advice::<G>))
        .route("/team", post(team::<G>))
        .route("/concepts/{name}", get(concept))
        .route("/sessions", post(sse::start_session::<G>))
        .route("/sessions/{id}/distraction", post(log_distraction::<G>))
        .route("/sessions/{id}/stop", post(stop_session::<G>))
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "hyperfocus",
    })
}

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    task_title: String,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    category: TaskType,
    reasoning: String,
    suggested_time: TimeOfDay,
    energy_required: EnergyLevel,
}

/// POST /v1/categorize
async fn categorize<G: Generator + 'static>(
    State(state): State<AppState<G>>,
    Json(request): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, ApiError> {
    let task_title = required("task_title", &request.task_title)?;
    let result = state.app.categorizer().categorize(task_title).await;
    Ok(Json(CategorizeResponse {
        category: result.category,
        reasoning: result.reasoning,
        suggested_time: result.suggested_time_of_day,
        energy_required: result.estimated_energy_required,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CoachingRequest {
    user_id: String,
    context: String,
}

#[derive(Debug, Serialize)]
pub struct CoachingResponse {
    advice: String,
}

/// POST /v1/coaching
async fn coaching<G: Generator + 'static>(
    State(state): State<AppState<G>>,
    Json(request): Json<CoachingRequest>,
) -> Result<Json<CoachingResponse>, ApiError> {
    let user_id = required("user_id", &request.user_id)?;
    let context = required("context", &request.context)?;
    let advice = state.app.coach().coach(user_id, context).await;
    Ok(Json(CoachingResponse { advice }))
}

#[derive(Debug, Deserialize)]
pub struct EnergyAdviceRequest {
    current_energy: String,
    hour_of_day: u8,
    #[serde(default)]
    recent_activities: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnergyAdviceResponse {
    recommendation: String,
    optimal_task_type: OptimalTaskType,
    reasoning: String,
    next_shift: Option<String>,
}

/// POST /v1/energy-advice
async fn energy_advice<G: Generator + 'static>(
    State(state): State<AppState<G>>,
    Json(request): Json<EnergyAdviceRequest>,
) -> Result<Json<EnergyAdviceResponse>, ApiError> {
    let current_energy = required("current_energy", &request.current_energy)?;
    if request.hour_of_day > 23 {
        return Err(ApiError::bad_request(format!(
            "hour_of_day must be within 0-23, got {}",
            request.hour_of_day
        )));
    }
    let advice = state
        .app
        .energy_advisor()
        .advise(
            current_energy,
            request.hour_of_day,
            request.recent_activities.as_deref(),
        )
        .await;
    Ok(Json(EnergyAdviceResponse {
        recommendation: advice.current_recommendation,
        optimal_task_type: advice.optimal_task_type,
        reasoning: advice.reasoning,
        next_shift: advice.next_energy_shift,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    user_id: String,
    question: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    answer: String,
}

/// POST /v1/team
async fn team<G: Generator + 'static>(
    State(state): State<AppState<G>>,
    Json(request): Json<TeamRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let user_id = required("user_id", &request.user_id)?;
    let question = required("question", &request.question)?;
    let answer = state.app.team().route(user_id, question).await;
    Ok(Json(TeamResponse { answer }))
}

#[derive(Debug, Serialize)]
pub struct ConceptResponse {
    name: String,
    explanation: String,
}

/// GET /v1/concepts/{name}
async fn concept(Path(name): Path<String>) -> Result<Json<ConceptResponse>, ApiError> {
    match concepts::lookup(&name) {
        Some(text) => Ok(Json(ConceptResponse {
            name: name.trim().to_ascii_lowercase(),
            explanation: text.to_string(),
        })),
        None => Err(ApiError::not_found(concepts::explain(&name))),
    }
}

#[derive(Debug, Serialize)]
pub struct SessionAck {
    session_id: Uuid,
    accepted: &'static str,
}

/// POST /v1/sessions/{id}/distraction
async fn log_distraction<G: Generator + 'static>(
    State(state): State<AppState<G>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionAck>, ApiError> {
    let control = find_session(&state, id)?;
    control.log_distraction().await.map_err(control_error)?;
    info!(session_id = %id, "distraction logged");
    Ok(Json(SessionAck {
        session_id: id,
        accepted: "distraction",
    }))
}

/// POST /v1/sessions/{id}/stop
async fn stop_session<G: Generator + 'static>(
    State(state): State<AppState<G>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionAck>, ApiError> {
    let control = find_session(&state, id)?;
    control.stop().await.map_err(control_error)?;
    info!(session_id = %id, "session stopped");
    Ok(Json(SessionAck {
        session_id: id,
        accepted: "stop",
    }))
}

fn find_session<G>(
    state: &AppState<G>,
    id: Uuid,
) -> Result<hyperfocus::streamer::SessionControl, ApiError> {
    state
        .session(id)
        .ok_or_else(|| ApiError::not_found(format!("no live session {id}")))
}

fn control_error(err: ControlError) -> ApiError {
    ApiError::conflict(err)
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} must be non-empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hyperfocus::Hyperfocus;
    use hyperfocus::core::types::Role;
    use hyperfocus::io::config::HyperfocusConfig;
    use hyperfocus::test_support::{FailingGenerator, ScriptedGenerator};

    fn state<G: Generator + 'static>(generator: G) -> AppState<G> {
        let app = Hyperfocus::new(&HyperfocusConfig::default(), Arc::new(generator)).expect("app");
        AppState::new(app)
    }

    #[tokio::test]
    async fn health_reports_service() {
        let Json(body) = health().await;
        assert_eq!(
            body,
            HealthResponse {
                status: "healthy",
                service: "hyperfocus",
            }
        );
    }

    #[tokio::test]
    async fn categorize_maps_fallback_to_response_fields() {
        let Json(body) = categorize(
            State(state(FailingGenerator)),
            Json(CategorizeRequest {
                task_title: "write report".to_string(),
            }),
        )
        .await
        .expect("categorize");

        let json = serde_json::to_value(&body).expect("json");
        assert_eq!(json["category"], "purposeful");
        assert_eq!(json["reasoning"], "Default categorization - please review");
        assert_eq!(json["suggested_time"], "morning");
        assert_eq!(json["energy_required"], "high");
    }

    #[tokio::test]
    async fn blank_task_title_is_bad_request() {
        let err = categorize(
            State(state(FailingGenerator)),
            Json(CategorizeRequest {
                task_title: "   ".to_string(),
            }),
        )
        .await
        .expect_err("blank title");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn energy_advice_validates_hour() {
        let err = energy_advice(
            State(state(FailingGenerator)),
            Json(EnergyAdviceRequest {
                current_energy: "low".to_string(),
                hour_of_day: 24,
                recent_activities: None,
            }),
        )
        .await
        .expect_err("hour 24");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let Json(body) = energy_advice(
            State(state(FailingGenerator)),
            Json(EnergyAdviceRequest {
                current_energy: "low".to_string(),
                hour_of_day: 15,
                recent_activities: Some("three meetings".to_string()),
            }),
        )
        .await
        .expect("advice");
        let json = serde_json::to_value(&body).expect("json");
        assert_eq!(json["optimal_task_type"], "rest");
        assert_eq!(json["next_shift"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn coaching_and_team_return_text() {
        let generator = ScriptedGenerator::new()
            .reply(Role::Coach, "Single-task the morning.")
            .reply(Role::EnergyAdvisor, "Nap at two.");
        let state = state(generator);

        let Json(coaching) = coaching(
            State(state.clone()),
            Json(CoachingRequest {
                user_id: "ada".to_string(),
                context: "I multitask a lot".to_string(),
            }),
        )
        .await
        .expect("coaching");
        assert_eq!(coaching.advice, "Single-task the morning.");

        let Json(team) = team(
            State(state),
            Json(TeamRequest {
                user_id: "ada".to_string(),
                question: "I'm sleepy after lunch".to_string(),
            }),
        )
        .await
        .expect("team");
        assert_eq!(team.answer, "Nap at two.");
    }

    #[tokio::test]
    async fn concept_lookup_and_miss() {
        let Json(found) = concept(Path("Scatterfocus".to_string()))
            .await
            .expect("concept");
        assert_eq!(found.name, "scatterfocus");
        assert!(found.explanation.starts_with("Scatterfocus is"));

        let err = concept(Path("pomodoro".to_string()))
            .await
            .expect_err("missing");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.starts_with("Concept not found. Try:"));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let err = stop_session(State(state(FailingGenerator)), Path(Uuid::new_v4()))
            .await
            .expect_err("unknown");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_session_rejects_signals_with_conflict() {
        let state = state(FailingGenerator);
        let mut session = state
            .app
            .streamer()
            .start(hyperfocus::core::types::FocusMode::Hyperfocus, 5, None)
            .expect("start");
        let registration = state.register(session.control().clone());
        let id = registration.id();

        while session.next_message().await.is_some() {}

        let err = log_distraction(State(state.clone()), Path(id))
            .await
            .expect_err("finished");
        assert_eq!(err.status, StatusCode::CONFLICT);

        drop(registration);
        assert_eq!(state.live_sessions(), 0);
    }
}
