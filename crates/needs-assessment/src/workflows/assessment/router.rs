use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::catalog::standard_items;
use super::domain::{
    AssessmentId, OrganizationId, ProfileTarget, SiteAssessmentId, SiteId, SitePageId,
};
use super::repository::AssessmentRepository;
use super::service::{AssessmentService, WorkflowError};
use super::template::TemplateStore;
use super::validation::ResponseInput;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePageRequest {
    #[serde(default)]
    pub responses: Vec<ResponseInput>,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileRequest {
    #[serde(default)]
    pub responses: Vec<ResponseInput>,
}

type SharedService<T, R> = State<Arc<AssessmentService<T, R>>>;

/// Router builder exposing the questionnaire endpoints.
pub fn assessment_router<T, R>(service: Arc<AssessmentService<T, R>>) -> Router
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route("/api/status", get(status_handler))
        .route(
            "/api/sites/:site_id/site-assessment",
            get(latest_instance_handler::<T, R>).post(ensure_instance_handler::<T, R>),
        )
        .route(
            "/api/sites/:site_id/profile",
            get(site_profile_handler::<T, R>).post(save_site_profile_handler::<T, R>),
        )
        .route(
            "/api/organizations/:organization_id/profile",
            get(organization_profile_handler::<T, R>)
                .post(save_organization_profile_handler::<T, R>),
        )
        .route(
            "/api/site-assessment/:site_assessment_id",
            get(instance_handler::<T, R>),
        )
        .route(
            "/api/site-assessment/:site_assessment_id/summary",
            get(summary_handler::<T, R>),
        )
        .route(
            "/api/site-assessment/:site_assessment_id/site-page/:site_page_id",
            get(page_handler::<T, R>),
        )
        .route(
            "/api/site-assessment/:site_assessment_id/site-page/:site_page_id/save",
            post(save_page_handler::<T, R>),
        )
        .route(
            "/api/assessments/:assessment_id/pages",
            get(template_pages_handler::<T, R>),
        )
        .route("/api/standard-items/:page", get(standard_items_handler))
        .with_state(service)
}

async fn status_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn standard_items_handler(Path(page): Path<String>) -> Json<serde_json::Value> {
    let items = standard_items(&page);
    Json(json!({ "page": page, "items": items }))
}

pub(crate) async fn ensure_instance_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(site_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let today = Utc::now().date_naive();
    let instance = service.ensure_current_instance(SiteId(site_id), today)?;
    let view = service.instance_view(instance.id)?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn latest_instance_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(site_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let view = service.latest_instance_view(SiteId(site_id))?;
    Ok(Json(view).into_response())
}

pub(crate) async fn instance_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(site_assessment_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let view = service.instance_view(SiteAssessmentId(site_assessment_id))?;
    Ok(Json(view).into_response())
}

pub(crate) async fn summary_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(site_assessment_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let view = service.summary(SiteAssessmentId(site_assessment_id))?;
    Ok(Json(view).into_response())
}

pub(crate) async fn page_handler<T, R>(
    State(service): SharedService<T, R>,
    Path((site_assessment_id, site_page_id)): Path<(u64, u64)>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let view = service.page_view(
        SiteAssessmentId(site_assessment_id),
        SitePageId(site_page_id),
    )?;
    Ok(Json(view).into_response())
}

pub(crate) async fn save_page_handler<T, R>(
    State(service): SharedService<T, R>,
    Path((site_assessment_id, site_page_id)): Path<(u64, u64)>,
    Json(request): Json<SavePageRequest>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let outcome = service.save_page(
        SiteAssessmentId(site_assessment_id),
        SitePageId(site_page_id),
        request.responses,
        request.confirmed,
    )?;
    Ok(Json(outcome).into_response())
}

pub(crate) async fn template_pages_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(assessment_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let pages = service.template_pages(AssessmentId(assessment_id))?;
    Ok(Json(pages).into_response())
}

pub(crate) async fn site_profile_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(site_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let view = service.profile_page(ProfileTarget::Site(SiteId(site_id)))?;
    Ok(Json(view).into_response())
}

pub(crate) async fn save_site_profile_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(site_id): Path<u64>,
    Json(request): Json<SaveProfileRequest>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let outcome =
        service.save_profile(ProfileTarget::Site(SiteId(site_id)), request.responses)?;
    Ok(Json(outcome).into_response())
}

pub(crate) async fn organization_profile_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(organization_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let target = ProfileTarget::Organization(OrganizationId(organization_id));
    let view = service.profile_page(target)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn save_organization_profile_handler<T, R>(
    State(service): SharedService<T, R>,
    Path(organization_id): Path<u64>,
    Json(request): Json<SaveProfileRequest>,
) -> Result<Response, WorkflowError>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    let target = ProfileTarget::Organization(OrganizationId(organization_id));
    let outcome = service.save_profile(target, request.responses)?;
    Ok(Json(outcome).into_response())
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        match self {
            WorkflowError::ValidationFailed(errors) => {
                let payload = json!({
                    "error": "validation failed",
                    "errors": errors,
                });
                (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
            }
            other => {
                let status = match &other {
                    WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                    WorkflowError::TemplateMissing { .. } => StatusCode::BAD_REQUEST,
                    WorkflowError::PageLocked(_) => StatusCode::CONFLICT,
                    WorkflowError::ValidationFailed(_) | WorkflowError::Repository(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                if status.is_server_error() {
                    error!(error = %other, "assessment request failed");
                }
                let payload = json!({ "error": other.to_string() });
                (status, Json(payload)).into_response()
            }
        }
    }
}
