//! HTTP routes.
//!
//! The acting user arrives in headers: `X-User-Id` carries the user's
//! uuid, `X-User-Roles` a comma-separated role list. Authentication
//! itself lives in the reverse proxy in front of this service.

use axum::{
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use interlude_domain::{
    Actor, Character, CharacterId, Declarations, DomainError, DowntimePack, DowntimePeriod, Event,
    EventId, EventTicket, GroupId, PackContents, PackId, PeriodId, Research, ResearchId,
    ResearchKind, ReviewData, Role, StageSpec, UserId,
};

use crate::app::App;
use crate::infrastructure::ports::RepoError;
use crate::use_cases::characters::CapacityView;
use crate::use_cases::funds::FundsBalance;
use crate::use_cases::research::EnrollmentView;
use crate::use_cases::UseCaseError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/events", post(create_event))
        .route("/api/events/latest", get(latest_event))
        .route(
            "/api/events/{id}/tickets",
            get(list_tickets).post(assign_ticket),
        )
        .route("/api/downtime/periods", post(start_period))
        .route("/api/downtime/periods/current", get(current_period))
        .route("/api/downtime/periods/{id}/process", post(process_period))
        .route("/api/downtime/periods/{id}/packs", get(list_packs))
        .route(
            "/api/downtime/periods/{id}/packs/{character_id}",
            get(find_pack),
        )
        .route("/api/downtime/packs/{id}", get(get_pack))
        .route("/api/downtime/packs/{id}/contents", post(enter_pack_contents))
        .route("/api/downtime/packs/{id}/activities", post(submit_activities))
        .route("/api/downtime/packs/{id}/review", post(record_review))
        .route("/api/downtime/packs/{id}/results", get(pack_results))
        .route(
            "/api/characters/{id}/funds",
            get(get_balance).post(adjust_funds),
        )
        .route("/api/characters/{id}/funds/audit", get(funds_audit))
        .route("/api/characters/{id}/slots", get(downtime_slots))
        .route("/api/characters/{id}/research", get(character_research))
        .route(
            "/api/characters/by-reference/{reference}",
            get(character_by_reference),
        )
        .route("/api/groups/{id}/characters", get(group_roster))
        .route("/api/research", get(list_research).post(create_research))
        .route("/api/research/{public_id}", get(get_research))
        .route("/api/research/{id}/enroll", post(enroll))
        .route("/api/research/{id}/advance", post(advance_research))
        .route("/api/research/{id}/regress", post(regress_research))
}

async fn health() -> &'static str {
    "OK"
}

/// The acting user, decoded from request headers.
pub struct ActorContext(pub Actor);

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| ApiError::BadRequest("Missing or invalid X-User-Id header".into()))?;

        let roles: Vec<Role> = parts
            .headers
            .get("x-user-roles")
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .split(',')
                    .filter_map(|role| role.trim().parse().ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self(Actor::new(user_id, roles)))
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(serde::Deserialize)]
struct CreateEvent {
    name: String,
    event_number: i32,
}

async fn create_event(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Json(body): Json<CreateEvent>,
) -> Result<Json<Event>, ApiError> {
    let event = app
        .use_cases
        .events
        .create_event(&actor, body.name, body.event_number)
        .await?;
    Ok(Json(event))
}

async fn latest_event(State(app): State<Arc<App>>) -> Result<Json<Event>, ApiError> {
    let event = app
        .use_cases
        .events
        .latest_event()
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(event))
}

async fn assign_ticket(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<CharacterRef>,
) -> Result<Json<EventTicket>, ApiError> {
    let ticket = app
        .use_cases
        .events
        .assign_ticket(
            &actor,
            EventId::from_uuid(id),
            CharacterId::from_uuid(body.character_id),
        )
        .await?;
    Ok(Json(ticket))
}

async fn list_tickets(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EventTicket>>, ApiError> {
    let tickets = app
        .use_cases
        .events
        .list_tickets(&actor, EventId::from_uuid(id))
        .await?;
    Ok(Json(tickets))
}

// =============================================================================
// Downtime workflow
// =============================================================================

#[derive(serde::Deserialize)]
struct StartPeriodRequest {
    event_id: Uuid,
}

async fn start_period(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Json(body): Json<StartPeriodRequest>,
) -> Result<Json<DowntimePeriod>, ApiError> {
    let period = app
        .use_cases
        .start_period
        .execute(&actor, EventId::from_uuid(body.event_id))
        .await?;
    Ok(Json(period))
}

async fn current_period(
    State(app): State<Arc<App>>,
) -> Result<Json<DowntimePeriod>, ApiError> {
    let period = app
        .repositories
        .downtime
        .pending_period()
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(period))
}

async fn process_period(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<DowntimePeriod>, ApiError> {
    let period = app
        .use_cases
        .process_period
        .execute(&actor, PeriodId::from_uuid(id))
        .await?;
    Ok(Json(period))
}

async fn list_packs(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DowntimePack>>, ApiError> {
    let packs = app
        .repositories
        .downtime
        .list_packs(PeriodId::from_uuid(id))
        .await?;
    Ok(Json(packs))
}

async fn find_pack(
    State(app): State<Arc<App>>,
    Path((id, character_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DowntimePack>, ApiError> {
    let pack = app
        .repositories
        .downtime
        .find_pack(
            PeriodId::from_uuid(id),
            CharacterId::from_uuid(character_id),
        )
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(pack))
}

async fn get_pack(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DowntimePack>, ApiError> {
    let pack = app
        .repositories
        .downtime
        .get_pack(PackId::from_uuid(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(pack))
}

/// Pack edits carry a confirm flag; saving without it keeps the pack in
/// its current phase for further edits.
#[derive(serde::Deserialize)]
struct ContentsSubmission {
    contents: PackContents,
    #[serde(default)]
    confirm: bool,
}

#[derive(serde::Deserialize)]
struct ActivitiesSubmission {
    declarations: Declarations,
    #[serde(default)]
    confirm: bool,
}

#[derive(serde::Deserialize)]
struct ReviewSubmission {
    review: ReviewData,
    #[serde(default)]
    confirm: bool,
}

async fn enter_pack_contents(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ContentsSubmission>,
) -> Result<Json<DowntimePack>, ApiError> {
    let pack = app
        .use_cases
        .enter_pack_contents
        .execute(&actor, PackId::from_uuid(id), body.contents, body.confirm)
        .await?;
    Ok(Json(pack))
}

async fn submit_activities(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ActivitiesSubmission>,
) -> Result<Json<DowntimePack>, ApiError> {
    let pack = app
        .use_cases
        .submit_activities
        .execute(&actor, PackId::from_uuid(id), body.declarations, body.confirm)
        .await?;
    Ok(Json(pack))
}

async fn record_review(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewSubmission>,
) -> Result<Json<DowntimePack>, ApiError> {
    let pack = app
        .use_cases
        .record_review
        .execute(&actor, PackId::from_uuid(id), body.review, body.confirm)
        .await?;
    Ok(Json(pack))
}

/// Player-facing result lines for a resolved pack.
async fn pack_results(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<String>>, ApiError> {
    let pack = app
        .repositories
        .downtime
        .get_pack(PackId::from_uuid(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(pack.results.iter().map(|e| e.render()).collect()))
}

// =============================================================================
// Funds
// =============================================================================

#[derive(serde::Deserialize)]
struct FundsAdjustment {
    /// "add", "remove", or "set".
    operation: String,
    amount: i64,
    reason: String,
}

async fn get_balance(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FundsBalance>, ApiError> {
    let balance = app
        .use_cases
        .funds
        .balance(CharacterId::from_uuid(id))
        .await?;
    Ok(Json(balance))
}

async fn adjust_funds(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<FundsAdjustment>,
) -> Result<Json<FundsBalance>, ApiError> {
    let character_id = CharacterId::from_uuid(id);
    let funds = &app.use_cases.funds;
    let balance = match body.operation.as_str() {
        "add" => funds.add_funds(&actor, character_id, body.amount, &body.reason).await?,
        "remove" => {
            funds
                .remove_funds(&actor, character_id, body.amount, &body.reason)
                .await?
        }
        "set" => funds.set_funds(&actor, character_id, body.amount, &body.reason).await?,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown funds operation: {other}"
            )))
        }
    };
    Ok(Json(balance))
}

async fn funds_audit(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<interlude_domain::AuditEntry>>, ApiError> {
    let entries = app
        .use_cases
        .funds
        .history(&actor, CharacterId::from_uuid(id))
        .await?;
    Ok(Json(entries))
}

// =============================================================================
// Characters
// =============================================================================

async fn downtime_slots(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CapacityView>, ApiError> {
    let view = app
        .use_cases
        .capacity
        .execute(CharacterId::from_uuid(id))
        .await?;
    Ok(Json(view))
}

async fn character_by_reference(
    State(app): State<Arc<App>>,
    Path(reference): Path<String>,
) -> Result<Json<Character>, ApiError> {
    let character = app
        .repositories
        .characters
        .find_by_player_reference(&reference)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(character))
}

async fn group_roster(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Character>>, ApiError> {
    let characters = app
        .repositories
        .characters
        .list_by_group(GroupId::from_uuid(id))
        .await?;
    Ok(Json(characters))
}

// =============================================================================
// Research
// =============================================================================

#[derive(serde::Deserialize)]
struct CreateResearch {
    name: String,
    #[serde(default)]
    kind: Option<ResearchKind>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stages: Vec<StageSpec>,
}

#[derive(serde::Deserialize)]
struct CharacterRef {
    character_id: Uuid,
}

async fn list_research(
    State(app): State<Arc<App>>,
) -> Result<Json<Vec<Research>>, ApiError> {
    Ok(Json(app.use_cases.research.list().await?))
}

async fn create_research(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Json(body): Json<CreateResearch>,
) -> Result<Json<Research>, ApiError> {
    let research = app
        .use_cases
        .research
        .create_project(
            &actor,
            body.name,
            body.kind.unwrap_or(ResearchKind::Invention),
            body.description,
            body.stages,
        )
        .await?;
    Ok(Json(research))
}

async fn get_research(
    State(app): State<Arc<App>>,
    Path(public_id): Path<String>,
) -> Result<Json<Research>, ApiError> {
    Ok(Json(app.use_cases.research.get(&public_id).await?))
}

async fn enroll(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<CharacterRef>,
) -> Result<Json<interlude_domain::CharacterResearch>, ApiError> {
    let enrollment = app
        .use_cases
        .research
        .enroll(
            &actor,
            CharacterId::from_uuid(body.character_id),
            ResearchId::from_uuid(id),
        )
        .await?;
    Ok(Json(enrollment))
}

async fn advance_research(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<CharacterRef>,
) -> Result<Json<EnrollmentView>, ApiError> {
    let view = app
        .use_cases
        .research
        .advance(
            &actor,
            CharacterId::from_uuid(body.character_id),
            ResearchId::from_uuid(id),
        )
        .await?;
    Ok(Json(view))
}

async fn regress_research(
    State(app): State<Arc<App>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
    Json(body): Json<CharacterRef>,
) -> Result<Json<EnrollmentView>, ApiError> {
    let view = app
        .use_cases
        .research
        .regress(
            &actor,
            CharacterId::from_uuid(body.character_id),
            ResearchId::from_uuid(id),
        )
        .await?;
    Ok(Json(view))
}

async fn character_research(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EnrollmentView>>, ApiError> {
    let views = app
        .use_cases
        .research
        .progress_for_character(CharacterId::from_uuid(id))
        .await?;
    Ok(Json(views))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Forbidden(String),
    Conflict(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Forbidden(msg) => {
                (axum::http::StatusCode::FORBIDDEN, msg).into_response()
            }
            ApiError::Conflict(msg) => {
                (axum::http::StatusCode::CONFLICT, msg).into_response()
            }
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        if e.is_not_found() {
            return ApiError::NotFound;
        }
        match e {
            UseCaseError::Forbidden(msg) => ApiError::Forbidden(msg),
            UseCaseError::Domain(err @ DomainError::Constraint(_)) => {
                ApiError::Conflict(err.to_string())
            }
            UseCaseError::Domain(
                err @ (DomainError::Validation(_)
                | DomainError::InvalidStateTransition(_)
                | DomainError::InsufficientFunds { .. }
                | DomainError::InvalidId(_)
                | DomainError::Parse(_)),
            ) => ApiError::BadRequest(err.to_string()),
            UseCaseError::Repo(RepoError::ConstraintViolation(msg)) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            e if e.is_not_found() => ApiError::NotFound,
            RepoError::ConstraintViolation(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn constraint_errors_map_to_conflict() {
        let err: ApiError = UseCaseError::Domain(DomainError::constraint(
            "A downtime period is already pending",
        ))
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let response = err.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    }

    #[test]
    fn storage_constraint_violations_map_to_conflict() {
        let err: ApiError = UseCaseError::Repo(RepoError::constraint(
            "Character already has a ticket for this event",
        ))
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let direct: ApiError = RepoError::constraint("duplicate").into();
        assert!(matches!(direct, ApiError::Conflict(_)));
    }

    #[test]
    fn insufficient_funds_still_map_to_bad_request() {
        let err: ApiError = UseCaseError::Domain(DomainError::InsufficientFunds {
            required: 10,
            available: 3,
        })
        .into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
