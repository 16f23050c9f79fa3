//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and backend summary |
//! | `POST` | `/api/onboarding` | Create profile and session |
//! | `GET` | `/api/profile` | Current user's profile |
//! | `PATCH` | `/api/profile` | Partial profile update |
//! | `GET` | `/api/schedule` | One day's events |
//! | `POST` | `/api/schedule/events` | Add an event |
//! | `DELETE` | `/api/schedule/events/{date}/{id}` | Remove an event |
//! | `POST` | `/api/schedule/generate` | Rebuild a day or week with the planner |
//! | `POST` | `/api/schedule/command` | Apply a natural-language instruction |
//! | `GET` | `/api/avatar/tools` | Tool definitions |
//! | `POST` | `/api/avatar/conversations` | Start a voice-avatar conversation |
//! | `POST` | `/api/avatar/tool-call` | Tool invocation from the avatar |

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempo_planner::{ActionDescriptor, Horizon, PlannedDay};
use tempo_store::StoreError;
use tempo_types::{
    ConversationId, Event, EventId, NewEvent, ProfileUpdate, SessionToken, SlotTemplate, UserId,
    UserProfile, WakeRhythm,
};
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::avatar::Conversation;
use crate::error::ApiError;
use crate::state::{today, AppState};
use crate::tools::{describe_day, tool_definitions};

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Onboarding survey answers.
#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    /// Desired user id; generated when absent.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Name to greet the user by.
    pub display_name: String,
    /// Preferred day rhythm.
    #[serde(default)]
    pub wake_rhythm: WakeRhythm,
    /// Activities that must always be scheduled.
    #[serde(default)]
    pub non_negotiables: Vec<String>,
    /// Named recurring slots.
    #[serde(default)]
    pub slot_templates: Vec<SlotTemplate>,
}

/// Result of onboarding.
#[derive(Debug, Serialize)]
pub struct OnboardingResponse {
    /// The new user's id.
    pub user_id: UserId,
    /// Session token for subsequent requests.
    pub token: SessionToken,
    /// The stored profile.
    pub profile: UserProfile,
}

/// Query parameters naming a day.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Day to read; today when absent.
    pub date: Option<NaiveDate>,
}

/// One day's schedule.
#[derive(Debug, Serialize)]
pub struct DayResponse {
    /// The day.
    pub date: NaiveDate,
    /// Events sorted by start.
    pub events: Vec<Event>,
}

/// Result of a remove.
#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    /// Whether an event was deleted.
    pub removed: bool,
    /// The deleted event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    /// Human-readable outcome.
    pub message: String,
}

/// Schedule rebuild request.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// First day to plan; today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Day or week.
    #[serde(default)]
    pub horizon: Horizon,
}

/// Rebuilt days.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// One entry per planned day.
    pub days: Vec<PlannedDay>,
}

/// Natural-language instruction.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    /// What the user said or typed.
    pub instruction: String,
    /// Day the instruction refers to; today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Outcome of an instruction.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The interpreted action.
    pub action: ActionDescriptor,
    /// Confirmation sentence.
    pub result: String,
}

/// Avatar conversation request.
#[derive(Debug, Default, Deserialize)]
pub struct ConversationRequest {
    /// Day to brief the avatar on; today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Avatar conversation outcome.
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    /// Whether the avatar is available.
    pub available: bool,
    /// The conversation, when created.
    #[serde(flatten)]
    pub conversation: Option<Conversation>,
    /// Explanation when unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A tool invocation relayed by the avatar service.
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    /// Conversation the call belongs to.
    pub conversation_id: ConversationId,
    /// Tool name.
    pub tool_name: String,
    /// Tool arguments (object or JSON string).
    #[serde(default)]
    pub arguments: Value,
}

/// Tool result spoken by the avatar.
#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    /// Confirmation sentence.
    pub result: String,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Liveness probe with a backend summary.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "planner": if state.planner.is_online() { "llm" } else { "offline" },
        "avatar": state.avatar.is_enabled(),
    }))
}

// ---------------------------------------------------------------------------
// Onboarding & profile
// ---------------------------------------------------------------------------

/// Create a profile and a session.
pub async fn onboarding(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OnboardingRequest>,
) -> Result<(StatusCode, Json<OnboardingResponse>), ApiError> {
    let display_name = request.display_name.trim().to_owned();
    if display_name.is_empty() {
        return Err(ApiError::InvalidRequest("display_name must not be empty".to_owned()));
    }
    let user_id = request.user_id.unwrap_or_else(UserId::generate);
    if user_id.as_str().trim().is_empty() || user_id.is_demo() {
        return Err(ApiError::InvalidRequest(format!("user id {user_id} is not allowed")));
    }

    let profile = UserProfile {
        id: user_id.clone(),
        display_name,
        wake_rhythm: request.wake_rhythm,
        non_negotiables: request
            .non_negotiables
            .into_iter()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect(),
        slot_templates: request.slot_templates,
        created_at: chrono::Utc::now(),
    };
    state.profiles.create(&profile).await.map_err(|e| match e {
        StoreError::AlreadyExists(what) => ApiError::InvalidRequest(format!("{what} already exists")),
        other => ApiError::Store(other),
    })?;
    let token = state.sessions.create_session(&user_id).await?;
    info!(user_id = %user_id, "user onboarded");

    Ok((
        StatusCode::CREATED,
        Json(OnboardingResponse {
            user_id,
            token,
            profile,
        }),
    ))
}

/// The current user's profile.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .profiles
        .get(&user)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no profile for {user}")))
}

/// Apply a partial profile update.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::InvalidRequest("update changes nothing".to_owned()));
    }
    state
        .profiles
        .update(&user, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no profile for {user}")))
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// One day's events.
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DateQuery>,
) -> Result<Json<DayResponse>, ApiError> {
    let date = query.date.unwrap_or_else(today);
    let events = state.events.read(&user, date).await?;
    Ok(Json(DayResponse { date, events }))
}

/// Add an event. A caller-chosen id already used that day is rejected;
/// an end at or before the start is dropped.
pub async fn add_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::InvalidRequest("title must not be empty".to_owned()));
    }
    let event = state
        .events
        .add(&user, request.into_event())
        .await
        .map_err(|e| match e {
            StoreError::AlreadyExists(what) => ApiError::InvalidRequest(format!("{what} already exists")),
            other => ApiError::Store(other),
        })?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Remove an event. An unknown id is reported, not an error.
pub async fn remove_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((date, id)): Path<(NaiveDate, String)>,
) -> Result<Json<RemoveResponse>, ApiError> {
    let id = EventId::from(id);
    let response = match state.events.remove(&user, date, &id).await? {
        Some(event) => RemoveResponse {
            removed: true,
            message: format!("Removed {}.", event.title),
            event: Some(event),
        },
        None => RemoveResponse {
            removed: false,
            event: None,
            message: format!("event {id} not found on {date}"),
        },
    };
    Ok(Json(response))
}

/// Rebuild a day or week with the planner. Days are replaced without
/// change notifications; the client refetches.
pub async fn generate_schedule(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let start = request.date.unwrap_or_else(today);
    let profile = state.profile_or_placeholder(&user).await?;
    let existing = state.events.read(&user, start).await?;

    let planned = state
        .planner
        .generate(&profile, start, request.horizon, &existing)
        .await;
    let mut days = Vec::with_capacity(planned.len());
    for day in planned {
        let events = state.events.replace_day(&user, day.date, day.events).await?;
        days.push(PlannedDay { events, ..day });
    }
    info!(user_id = %user, start = %start, days = days.len(), "schedule generated");
    Ok(Json(GenerateResponse { days }))
}

/// Interpret and apply a natural-language instruction.
pub async fn schedule_command(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let date = request.date.unwrap_or_else(today);
    let profile = state.profile_or_placeholder(&user).await?;
    let events = state.events.read(&user, date).await?;

    let action = state
        .planner
        .interpret(&profile, date, &events, &request.instruction)
        .await;
    let result = state.tools(date).apply(&user, action.clone()).await?;
    info!(user_id = %user, action = action.name(), "instruction applied");
    Ok(Json(CommandResponse { action, result }))
}

// ---------------------------------------------------------------------------
// Voice avatar
// ---------------------------------------------------------------------------

/// The tool definitions registered with the avatar service.
pub async fn avatar_tools() -> Json<Value> {
    Json(tool_definitions())
}

/// Start an avatar conversation. Upstream failure is reported with
/// `available: false`.
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Option<Json<ConversationRequest>>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let date = body.and_then(|Json(r)| r.date).unwrap_or_else(today);
    let profile = state.profile_or_placeholder(&user).await?;
    let events = state.events.read(&user, date).await?;

    match state
        .avatar
        .create_conversation(&profile, &describe_day(date, &events))
        .await
    {
        Ok(conversation) => {
            state
                .sessions
                .bind_conversation(&conversation.conversation_id, &user)
                .await?;
            info!(user_id = %user, conversation_id = %conversation.conversation_id, "avatar conversation started");
            Ok(Json(ConversationResponse {
                available: true,
                conversation: Some(conversation),
                message: None,
            }))
        }
        Err(e) => {
            warn!(user_id = %user, error = %e, "avatar conversation unavailable");
            Ok(Json(ConversationResponse {
                available: false,
                conversation: None,
                message: Some("The voice assistant is unavailable right now.".to_owned()),
            }))
        }
    }
}

/// Execute a tool call from the avatar service. Unknown conversations act
/// on the demo user's calendar.
pub async fn tool_call(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToolCallRequest>,
) -> Result<Json<ToolCallResponse>, ApiError> {
    let user = state
        .sessions
        .resolve_conversation(&request.conversation_id)
        .await?
        .unwrap_or_else(UserId::demo);
    let result = state
        .tools(today())
        .call(&user, &request.tool_name, &request.arguments)
        .await?;
    info!(
        user_id = %user,
        conversation_id = %request.conversation_id,
        tool = %request.tool_name,
        "tool call handled"
    );
    Ok(Json(ToolCallResponse { result }))
}
