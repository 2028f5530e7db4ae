use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use crate::infra::AppState;
use school_ledger::workflows::admit::{admit_router, AdminNotifier, AdmitCardService};
use school_ledger::workflows::fees::{fee_router, FeeLedgerService};
use school_ledger::workflows::roster::{roster_router, RosterService};
use school_ledger::workflows::store::LedgerStore;

/// Every workflow router plus the operational endpoints.
pub(crate) fn with_portal_routes<S, N>(
    roster: Arc<RosterService<S>>,
    fees: Arc<FeeLedgerService<S>>,
    admit: Arc<AdmitCardService<S, N>>,
) -> Router
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    Router::new()
        .merge(roster_router(roster))
        .merge(fee_router(fees))
        .merge(admit_router(admit))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
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
