use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::service::{DashboardError, FleetDashboardService};
use crate::fleet::domain::{TenantId, UserId};
use crate::fleet::fetch::{FetchError, FleetRepository};
use crate::fleet::tenancy::{Module, ScopeStore, SessionError, TenantScope};

/// Header carrying the authenticated user id, set by the upstream auth layer.
pub const USER_HEADER: &str = "x-user-id";

/// Router builder exposing the dashboard, alert and scope endpoints.
pub fn dashboard_router<R, S>(service: Arc<FleetDashboardService<R, S>>) -> Router
where
    R: FleetRepository + 'static,
    S: ScopeStore + 'static,
{
    Router::new()
        .route("/api/v1/fleet/dashboard", get(dashboard_handler::<R, S>))
        .route("/api/v1/fleet/alerts", get(alerts_handler::<R, S>))
        .route(
            "/api/v1/fleet/scope",
            get(scope_handler::<R, S>).put(select_scope_handler::<R, S>),
        )
        .route("/api/v1/fleet/access/:module", get(access_handler::<R, S>))
        .with_state(service)
}

/// Calendar date on the server's local clock; every default "today" reads from here.
pub fn current_date() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AsOfQuery {
    today: Option<NaiveDate>,
}

impl AsOfQuery {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(current_date)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AccessQuery {
    tenant_id: Option<String>,
}

fn user_from(headers: &HeaderMap) -> Result<UserId, Response> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::new)
        .ok_or_else(|| {
            let payload = json!({ "error": format!("missing {USER_HEADER} header") });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
}

fn error_response(error: DashboardError) -> Response {
    let status = match &error {
        DashboardError::UnknownUser(_) => StatusCode::UNAUTHORIZED,
        DashboardError::Scope(_) | DashboardError::Session(SessionError::Scope(_)) => {
            StatusCode::FORBIDDEN
        }
        DashboardError::Fetch(FetchError::EmptyScope) => StatusCode::FORBIDDEN,
        DashboardError::Fetch(_) => StatusCode::BAD_GATEWAY,
        DashboardError::Session(SessionError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn dashboard_handler<R, S>(
    State(service): State<Arc<FleetDashboardService<R, S>>>,
    headers: HeaderMap,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    R: FleetRepository + 'static,
    S: ScopeStore + 'static,
{
    let user_id = match user_from(&headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match service.dashboard(&user_id, query.today()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn alerts_handler<R, S>(
    State(service): State<Arc<FleetDashboardService<R, S>>>,
    headers: HeaderMap,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    R: FleetRepository + 'static,
    S: ScopeStore + 'static,
{
    let user_id = match user_from(&headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match service.alerts(&user_id, query.today()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn scope_handler<R, S>(
    State(service): State<Arc<FleetDashboardService<R, S>>>,
    headers: HeaderMap,
) -> Response
where
    R: FleetRepository + 'static,
    S: ScopeStore + 'static,
{
    let user_id = match user_from(&headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match service.scope(&user_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn select_scope_handler<R, S>(
    State(service): State<Arc<FleetDashboardService<R, S>>>,
    headers: HeaderMap,
    Json(requested): Json<TenantScope>,
) -> Response
where
    R: FleetRepository + 'static,
    S: ScopeStore + 'static,
{
    let user_id = match user_from(&headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match service.select_scope(&user_id, &requested).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn access_handler<R, S>(
    State(service): State<Arc<FleetDashboardService<R, S>>>,
    headers: HeaderMap,
    Path(module): Path<String>,
    Query(query): Query<AccessQuery>,
) -> Response
where
    R: FleetRepository + 'static,
    S: ScopeStore + 'static,
{
    let user_id = match user_from(&headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let module: Module = match module.parse() {
        Ok(module) => module,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::NOT_FOUND, Json(payload)).into_response();
        }
    };
    let tenant = query.tenant_id.map(TenantId::new);

    match service
        .module_access(&user_id, module, tenant.as_ref())
        .await
    {
        Ok(access) => {
            let payload = json!({
                "module": module.key(),
                "tenant_id": tenant,
                "access": access,
                "can_read": access.allows_read(),
                "can_write": access.allows_write(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
