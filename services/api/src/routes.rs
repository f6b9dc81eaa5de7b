use crate::infra::{blocking, intake, interest_forms, AppState};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use faculty_roles::error::AppError;
use faculty_roles::workflows::forms::{
    FormManagementInfo, FormView, PrefilledListing, ProvisionedForm,
};
use faculty_roles::workflows::listings::{DashboardSummary, Listing};
use faculty_roles::workflows::notifications::{Delivery, Submission};
use faculty_roles::workflows::profiles::RespondentProfile;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub(crate) struct PrefillQuery {
    pub(crate) role_title: String,
    pub(crate) division: String,
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespondentQuery {
    pub(crate) email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct FormUrlResponse {
    pub(crate) url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationResponse {
    pub(crate) delivery: Option<Delivery>,
}

/// Health, metrics and listing routes, plus the interest form routes when the
/// dashboard has them enabled.
pub(crate) fn dashboard_routes(forms_enabled: bool) -> Router {
    let router = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/roles", get(roles_endpoint))
        .route("/api/v1/roles/divisions", get(divisions_endpoint))
        .route("/api/v1/roles/summary", get(summary_endpoint));

    if !forms_enabled {
        return router;
    }

    router
        .route("/api/v1/forms", get(form_info_endpoint))
        .route("/api/v1/forms/provision", post(provision_endpoint))
        .route("/api/v1/forms/url", get(form_url_endpoint))
        .route("/api/v1/forms/prefill", get(prefill_endpoint))
        .route("/api/v1/roles/prefilled", get(prefilled_roles_endpoint))
        .route("/api/v1/profiles/:email", get(profile_endpoint))
        .route("/api/v1/notifications", post(notify_endpoint))
        .route("/api/v1/notifications/latest", post(notify_latest_endpoint))
        .route("/forms/d/e/:form_id/viewform", get(form_view_endpoint))
        .route("/forms/d/e/:form_id/formResponse", post(form_response_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn roles_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let roles = blocking(state.dashboard, |dashboard| Ok(dashboard.list_open_roles())).await?;
    Ok(Json(roles))
}

pub(crate) async fn divisions_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let divisions = blocking(state.dashboard, |dashboard| Ok(dashboard.list_divisions())).await?;
    Ok(Json(divisions))
}

pub(crate) async fn summary_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<DashboardSummary>, AppError> {
    let summary = blocking(state.dashboard, |dashboard| Ok(dashboard.summary())).await?;
    Ok(Json(summary))
}

pub(crate) async fn provision_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<ProvisionedForm>, AppError> {
    let provisioned = blocking(state.dashboard, |dashboard| {
        Ok(interest_forms(dashboard)?.provision_form()?)
    })
    .await?;
    Ok(Json(provisioned))
}

pub(crate) async fn form_info_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<FormManagementInfo>, AppError> {
    let info = blocking(state.dashboard, |dashboard| {
        Ok(interest_forms(dashboard)?.management_info()?)
    })
    .await?;
    Ok(Json(info))
}

pub(crate) async fn form_url_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<FormUrlResponse>, AppError> {
    let url = blocking(state.dashboard, |dashboard| {
        Ok(interest_forms(dashboard)?.interest_form_url())
    })
    .await?;
    Ok(Json(FormUrlResponse { url }))
}

pub(crate) async fn prefill_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<PrefillQuery>,
) -> Result<Json<FormUrlResponse>, AppError> {
    let email = required_email(&query.email)?.to_string();
    let url = blocking(state.dashboard, move |dashboard| {
        Ok(interest_forms(dashboard)?.prefilled_url(&query.role_title, &query.division, &email))
    })
    .await?;
    Ok(Json(FormUrlResponse { url }))
}

pub(crate) async fn prefilled_roles_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<RespondentQuery>,
) -> Result<Json<Vec<PrefilledListing>>, AppError> {
    let email = required_email(&query.email)?.to_string();
    let listings = blocking(state.dashboard, move |dashboard| {
        Ok(interest_forms(dashboard)?.listings_with_prefilled_urls(&email))
    })
    .await?;
    Ok(Json(listings))
}

pub(crate) async fn profile_endpoint(
    Extension(state): Extension<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RespondentProfile>, AppError> {
    required_email(&email)?;
    let profile = blocking(state.dashboard, move |dashboard| {
        Ok(interest_forms(dashboard)?.resolve_profile(&email))
    })
    .await?;
    Ok(Json(profile))
}

pub(crate) async fn notify_endpoint(
    Extension(state): Extension<AppState>,
    Json(submission): Json<Submission>,
) -> Result<Json<NotificationResponse>, AppError> {
    let delivery = blocking(state.dashboard, move |dashboard| {
        Ok(interest_forms(dashboard)?.notify_hr(&submission))
    })
    .await?;
    Ok(Json(NotificationResponse {
        delivery: Some(delivery),
    }))
}

pub(crate) async fn notify_latest_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<NotificationResponse>, AppError> {
    let delivery = blocking(state.dashboard, |dashboard| {
        Ok(interest_forms(dashboard)?.notify_latest_response())
    })
    .await?;
    Ok(Json(NotificationResponse { delivery }))
}

/// Respondent page data. Query pairs from a pre-filled link become the
/// questions' initial values.
pub(crate) async fn form_view_endpoint(
    Extension(state): Extension<AppState>,
    Path(form_id): Path<String>,
    Query(prefilled): Query<BTreeMap<String, String>>,
) -> Result<Json<FormView>, AppError> {
    let view = blocking(intake(&state)?, move |intake| {
        Ok(intake.view(&form_id, &prefilled)?)
    })
    .await?;
    Ok(Json(view))
}

/// Records a submission in the response spreadsheet, then notifies HR.
pub(crate) async fn form_response_endpoint(
    Extension(state): Extension<AppState>,
    Path(form_id): Path<String>,
    Json(submission): Json<Submission>,
) -> Result<Json<NotificationResponse>, AppError> {
    let dashboard = state.dashboard.clone();
    let delivery = blocking(intake(&state)?, move |intake| {
        let stored = intake.submit_now(&form_id, &submission)?;
        Ok(interest_forms(&dashboard)?.notify_hr(&stored))
    })
    .await?;
    Ok(Json(NotificationResponse {
        delivery: Some(delivery),
    }))
}

fn required_email(raw: &str) -> Result<&str, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }
    Ok(raw)
}
