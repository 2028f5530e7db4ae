use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::domain::{FeeStatement, MonthlyFeeInput, MonthlyFeeRecord};
use super::service::FeeLedgerService;
use crate::workflows::error::LedgerServiceError;
use crate::workflows::store::LedgerStore;

/// Router exposing the monthly fee ledger.
pub fn fee_router<S>(service: Arc<FeeLedgerService<S>>) -> Router
where
    S: LedgerStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/students/:student_id/fees",
            get(statement_handler::<S>).put(save_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn save_handler<S>(
    State(service): State<Arc<FeeLedgerService<S>>>,
    Path(student_id): Path<String>,
    Json(input): Json<MonthlyFeeInput>,
) -> Result<(StatusCode, Json<MonthlyFeeRecord>), LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    let record = service.save_monthly_fee(&student_id, input).await?;
    Ok((StatusCode::OK, Json(record)))
}

pub(crate) async fn statement_handler<S>(
    State(service): State<Arc<FeeLedgerService<S>>>,
    Path(student_id): Path<String>,
) -> Result<Json<FeeStatement>, LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    let statement = service.statement(&student_id).await?;
    Ok(Json(statement))
}
