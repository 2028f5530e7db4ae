use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::dashboard::GuardianDashboard;
use super::domain::{Student, StudentDraft};
use super::service::RosterService;
use crate::workflows::error::LedgerServiceError;
use crate::workflows::store::LedgerStore;

/// Router exposing student administration and the guardian dashboard.
pub fn roster_router<S>(service: Arc<RosterService<S>>) -> Router
where
    S: LedgerStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/students",
            get(list_handler::<S>).post(register_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/guardians/:uid/dashboard",
            get(dashboard_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<RosterService<S>>>,
) -> Result<Json<Vec<Student>>, LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    Ok(Json(service.list_students().await?))
}

pub(crate) async fn register_handler<S>(
    State(service): State<Arc<RosterService<S>>>,
    Json(draft): Json<StudentDraft>,
) -> Result<(StatusCode, Json<Student>), LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    let student = service.register_student(draft).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<RosterService<S>>>,
    Path(student_id): Path<String>,
) -> Result<Json<Student>, LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    Ok(Json(service.get_student(&student_id).await?))
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<RosterService<S>>>,
    Path(student_id): Path<String>,
    Json(draft): Json<StudentDraft>,
) -> Result<Json<Student>, LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    Ok(Json(service.update_student(&student_id, draft).await?))
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<RosterService<S>>>,
    Path(student_id): Path<String>,
) -> Result<StatusCode, LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    service.delete_student(&student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn dashboard_handler<S>(
    State(service): State<Arc<RosterService<S>>>,
    Path(uid): Path<String>,
) -> Result<Json<GuardianDashboard>, LedgerServiceError>
where
    S: LedgerStore + 'static,
{
    Ok(Json(service.guardian_dashboard(&uid).await?))
}
