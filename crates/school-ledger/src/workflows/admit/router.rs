use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{
    AdmitPermission, ClassSchedule, Exam, ExamDraft, PaymentRequest, ScheduleRowInput,
};
use super::eligibility::EligibilityView;
use super::notifier::AdminNotifier;
use super::payment::{PaymentSubmission, ReviewDecision};
use super::service::AdmitCardService;
use crate::workflows::error::LedgerServiceError;
use crate::workflows::store::LedgerStore;

type SharedService<S, N> = State<Arc<AdmitCardService<S, N>>>;

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleBody {
    #[serde(default)]
    rows: Vec<ScheduleRowInput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverrideBody {
    allow_download: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PayAtSchoolBody {
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewBody {
    decision: ReviewDecision,
}

/// Router exposing exams, timetables and the per-student admit card workflow.
pub fn admit_router<S, N>(service: Arc<AdmitCardService<S, N>>) -> Router
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/exams",
            get(list_exams_handler::<S, N>).post(create_exam_handler::<S, N>),
        )
        .route("/api/v1/exams/:exam_id", put(update_exam_handler::<S, N>))
        .route(
            "/api/v1/exams/:exam_id/schedules/:class_name",
            get(schedule_handler::<S, N>).put(save_schedule_handler::<S, N>),
        )
        .route(
            "/api/v1/exams/:exam_id/students/:student_id/eligibility",
            get(eligibility_handler::<S, N>),
        )
        .route(
            "/api/v1/exams/:exam_id/students/:student_id/issue",
            post(issue_handler::<S, N>),
        )
        .route(
            "/api/v1/exams/:exam_id/students/:student_id/override",
            put(override_handler::<S, N>),
        )
        .route(
            "/api/v1/exams/:exam_id/students/:student_id/payment",
            post(submit_payment_handler::<S, N>),
        )
        .route(
            "/api/v1/exams/:exam_id/students/:student_id/payment/pay-at-school",
            post(pay_at_school_handler::<S, N>),
        )
        .route(
            "/api/v1/exams/:exam_id/students/:student_id/payment/review",
            post(review_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn list_exams_handler<S, N>(
    State(service): SharedService<S, N>,
) -> Result<Json<Vec<Exam>>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    Ok(Json(service.list_exams().await?))
}

pub(crate) async fn create_exam_handler<S, N>(
    State(service): SharedService<S, N>,
    Json(draft): Json<ExamDraft>,
) -> Result<(StatusCode, Json<Exam>), LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    let exam = service.create_exam(draft).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

pub(crate) async fn update_exam_handler<S, N>(
    State(service): SharedService<S, N>,
    Path(exam_id): Path<String>,
    Json(draft): Json<ExamDraft>,
) -> Result<Json<Exam>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    Ok(Json(service.update_exam(&exam_id, draft).await?))
}

pub(crate) async fn schedule_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, class_name)): Path<(String, String)>,
) -> Result<Json<ClassSchedule>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    Ok(Json(service.schedule(&exam_id, &class_name).await?))
}

pub(crate) async fn save_schedule_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, class_name)): Path<(String, String)>,
    Json(body): Json<ScheduleBody>,
) -> Result<Json<ClassSchedule>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    let schedule = service
        .save_schedule(&exam_id, &class_name, body.rows)
        .await?;
    Ok(Json(schedule))
}

pub(crate) async fn eligibility_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, student_id)): Path<(String, String)>,
) -> Result<Json<EligibilityView>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    Ok(Json(service.eligibility(&student_id, &exam_id).await?))
}

pub(crate) async fn issue_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, student_id)): Path<(String, String)>,
) -> Result<Json<AdmitPermission>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    Ok(Json(service.issue_admit_card(&student_id, &exam_id).await?))
}

pub(crate) async fn override_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, student_id)): Path<(String, String)>,
    Json(body): Json<OverrideBody>,
) -> Result<Json<AdmitPermission>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    let permission = service
        .set_admin_override(&student_id, &exam_id, body.allow_download)
        .await?;
    Ok(Json(permission))
}

pub(crate) async fn submit_payment_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, student_id)): Path<(String, String)>,
    Json(submission): Json<PaymentSubmission>,
) -> Result<(StatusCode, Json<PaymentRequest>), LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    let request = service
        .submit_payment(&student_id, &exam_id, submission)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub(crate) async fn pay_at_school_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, student_id)): Path<(String, String)>,
    body: Option<Json<PayAtSchoolBody>>,
) -> Result<(StatusCode, Json<PaymentRequest>), LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    let Json(body) = body.unwrap_or_default();
    let request = service
        .request_pay_at_school(&student_id, &exam_id, body.note)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub(crate) async fn review_handler<S, N>(
    State(service): SharedService<S, N>,
    Path((exam_id, student_id)): Path<(String, String)>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<AdmitPermission>, LedgerServiceError>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    let permission = service
        .review_payment(&student_id, &exam_id, body.decision)
        .await?;
    Ok(Json(permission))
}
