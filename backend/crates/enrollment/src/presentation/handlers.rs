//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, header};
use kernel::principal::CurrentAccount;
use std::sync::Arc;

use crate::application::config::EnrollmentConfig;
use crate::application::{
    ActiveEnrollmentUseCase, CatalogueUseCase, CheckAccessUseCase, ExpireSubscriptionsUseCase,
    JoinDisciplineUseCase, JoinInput, JoinOutcome, StopDisciplineUseCase,
};
use crate::domain::access_gate::AccessDecision;
use crate::domain::repository::EnrollmentStore;
use crate::error::{EnrollmentError, EnrollmentResult};
use crate::presentation::dto::{
    ActiveEnrollmentResponse, DisciplineDto, EnrollmentDto, ExpireSubscriptionsResponse,
    JoinRequest, JoinResponse, StopRequest, StopResponse,
};

/// Shared state for enrollment handlers
pub struct EnrollmentAppState<R>
where
    R: EnrollmentStore,
{
    pub repo: Arc<R>,
    pub config: Arc<EnrollmentConfig>,
}

impl<R> Clone for EnrollmentAppState<R>
where
    R: EnrollmentStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Join / Stop
// ============================================================================

/// POST /api/disciplines/join
pub async fn join_discipline<R>(
    State(state): State<EnrollmentAppState<R>>,
    Extension(current): Extension<CurrentAccount>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> EnrollmentResult<Json<JoinResponse>>
where
    R: EnrollmentStore,
{
    let Json(req) = payload.map_err(|_| EnrollmentError::MalformedBody)?;

    let use_case = JoinDisciplineUseCase::new(state.repo.clone(), state.config.clone());

    let outcome = use_case
        .execute(JoinInput {
            account_id: current.account_id,
            discipline_id: req.discipline_id.as_deref(),
            replace_active: req.replace_active,
            confirmation_token: req.confirmation_token.as_deref(),
        })
        .await?;

    let response = match outcome {
        JoinOutcome::Joined {
            enrollment,
            replaced,
        } => JoinResponse {
            success: true,
            already_joined: false,
            message: "Joined successfully".to_string(),
            enrollment_id: enrollment.enrollment_id.to_string(),
            replaced_discipline_ids: replaced
                .iter()
                .map(|e| e.discipline_id.to_string())
                .collect(),
        },
        JoinOutcome::AlreadyJoined(existing) => JoinResponse {
            success: true,
            already_joined: true,
            message: "Already joined this discipline".to_string(),
            enrollment_id: existing.enrollment_id.to_string(),
            replaced_discipline_ids: Vec::new(),
        },
    };

    Ok(Json(response))
}

/// POST /api/disciplines/stop
pub async fn stop_discipline<R>(
    State(state): State<EnrollmentAppState<R>>,
    Extension(current): Extension<CurrentAccount>,
    payload: Result<Json<StopRequest>, JsonRejection>,
) -> EnrollmentResult<Json<StopResponse>>
where
    R: EnrollmentStore,
{
    let Json(req) = payload.map_err(|_| EnrollmentError::MalformedBody)?;

    StopDisciplineUseCase::new(state.repo.clone())
        .execute(current.account_id, req.discipline_id.as_deref())
        .await?;

    Ok(Json(StopResponse {
        success: true,
        message: "Discipline stopped".to_string(),
    }))
}

// ============================================================================
// Queries
// ============================================================================

/// GET /api/enrollments/active
pub async fn active_enrollment<R>(
    State(state): State<EnrollmentAppState<R>>,
    Extension(current): Extension<CurrentAccount>,
) -> EnrollmentResult<Json<ActiveEnrollmentResponse>>
where
    R: EnrollmentStore,
{
    let active = ActiveEnrollmentUseCase::new(state.repo.clone())
        .execute(current.account_id)
        .await?;

    Ok(Json(ActiveEnrollmentResponse {
        enrollment: active.map(|a| EnrollmentDto::new(&a.enrollment, a.discipline.as_ref())),
    }))
}

/// GET /api/subscription/access
pub async fn subscription_access<R>(
    State(state): State<EnrollmentAppState<R>>,
    Extension(current): Extension<CurrentAccount>,
) -> EnrollmentResult<Json<AccessDecision>>
where
    R: EnrollmentStore,
{
    let decision = CheckAccessUseCase::new(state.repo.clone())
        .execute(current.account_id)
        .await?;

    Ok(Json(decision))
}

// ============================================================================
// Catalogue
// ============================================================================

/// GET /api/disciplines
pub async fn list_disciplines<R>(
    State(state): State<EnrollmentAppState<R>>,
) -> EnrollmentResult<Json<Vec<DisciplineDto>>>
where
    R: EnrollmentStore,
{
    let disciplines = CatalogueUseCase::new(state.repo.clone()).list().await?;
    Ok(Json(disciplines.iter().map(DisciplineDto::from).collect()))
}

/// GET /api/disciplines/{slug}
pub async fn get_discipline<R>(
    State(state): State<EnrollmentAppState<R>>,
    Path(slug): Path<String>,
) -> EnrollmentResult<Json<DisciplineDto>>
where
    R: EnrollmentStore,
{
    let discipline = CatalogueUseCase::new(state.repo.clone())
        .get_by_slug(&slug)
        .await?;
    Ok(Json(DisciplineDto::from(&discipline)))
}

// ============================================================================
// Cron
// ============================================================================

/// GET /api/cron/expire-subscriptions
pub async fn expire_subscriptions<R>(
    State(state): State<EnrollmentAppState<R>>,
    headers: HeaderMap,
) -> EnrollmentResult<Json<ExpireSubscriptionsResponse>>
where
    R: EnrollmentStore,
{
    let use_case = ExpireSubscriptionsUseCase::new(state.repo.clone(), state.config.clone());

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    use_case.authorize(authorization)?;

    let report = use_case.execute_now().await?;

    Ok(Json(ExpireSubscriptionsResponse {
        updated: report.updated(),
        message: report.message(),
        ids: report.ids.iter().map(ToString::to_string).collect(),
    }))
}
