//! Guardian sign-in flow over the merged HTTP surface: registration, the fee
//! ledger, the latest exam and the dashboard, then removal of the student.

mod common {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::Router;

    use school_ledger::workflows::admit::{
        admit_router, AdminAlert, AdminNotifier, AdmitCardService, NotifierError,
    };
    use school_ledger::workflows::fees::{fee_router, FeeLedgerService};
    use school_ledger::workflows::roster::{roster_router, RosterService};
    use school_ledger::workflows::store::InMemoryLedgerStore;

    pub(super) struct SilentNotifier;

    #[async_trait]
    impl AdminNotifier for SilentNotifier {
        async fn notify(&self, _alert: AdminAlert) -> Result<(), NotifierError> {
            Ok(())
        }
    }

    pub(super) fn portal(store: Arc<InMemoryLedgerStore>) -> Router {
        Router::new()
            .merge(roster_router(Arc::new(RosterService::new(store.clone()))))
            .merge(fee_router(Arc::new(FeeLedgerService::new(store.clone()))))
            .merge(admit_router(Arc::new(AdmitCardService::new(
                store,
                Arc::new(SilentNotifier),
            ))))
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use school_ledger::workflows::store::{InMemoryLedgerStore, LedgerStore};

async fn call(router: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn guardian_sees_fees_timetable_and_gate() {
    let store = Arc::new(InMemoryLedgerStore::default());
    let portal = common::portal(store.clone());

    let response = call(
        &portal,
        "POST",
        "/api/v1/students",
        Some(json!({
            "name": "Tara Pal",
            "class_name": "UKG (B)",
            "roll_no": "3",
            "father_name": "Sujit Pal",
            "transport_mode": "toto",
            "guardian_uid": "uid-tara"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let student_id = json_body(response).await["student_id"]
        .as_str()
        .expect("id")
        .to_string();

    let response = call(
        &portal,
        "PUT",
        &format!("/api/v1/students/{student_id}/fees"),
        Some(json!({
            "month": 1, "year": 2026, "tuition_charge": 1800,
            "transport_charge": 300, "paid_amount": 1000
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(
        &portal,
        "POST",
        "/api/v1/exams",
        Some(json!({
            "name": "Annual", "session": "2025-26", "date": "02/03/2026",
            "time": "10:00 AM", "venue": "Main Hall"
        })),
    )
    .await;
    let exam_id = json_body(response).await["exam_id"]
        .as_str()
        .expect("exam id")
        .to_string();

    let response = call(
        &portal,
        "PUT",
        &format!("/api/v1/exams/{exam_id}/schedules/ukg"),
        Some(json!({ "rows": [
            { "day": "Monday", "date": "2026-03-02", "subject": "Rhymes" },
            { "day": "Tuesday", "date": "2026-03-03", "subject": "Numbers" }
        ] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&portal, "GET", "/api/v1/guardians/uid-tara/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = json_body(response).await;
    assert_eq!(dashboard["total_due"], json!(1100.0));
    assert_eq!(dashboard["exam"]["exam_id"], exam_id.as_str());
    assert_eq!(dashboard["schedule"]["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(dashboard["eligibility"]["can_download"], false);
    assert_eq!(dashboard["eligibility"]["block_reason"], "not_issued");

    let response = call(
        &portal,
        "DELETE",
        &format!("/api/v1/students/{student_id}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(store.fetch_account("uid-tara").await.expect("read").is_none());
    assert!(store.list_fees(&student_id).await.expect("read").is_empty());

    let response = call(&portal, "GET", "/api/v1/guardians/uid-tara/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
