//! Fixtures and store doubles shared by the workflow unit tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::admit::domain::{AdmitPermission, ClassSchedule, Exam, PermissionKey};
use super::admit::notifier::{AdminAlert, AdminNotifier, NotifierError};
use super::fees::domain::{MonthKey, MonthlyFeeRecord};
use super::roster::domain::{Student, TransportMode, UserAccount};
use super::store::{InMemoryLedgerStore, LedgerStore, RepositoryError, Versioned};

pub(crate) fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn fee_record(
    year: i32,
    month: u32,
    tuition: i64,
    transport: i64,
    paid: i64,
) -> MonthlyFeeRecord {
    let net = Decimal::from(tuition + transport);
    MonthlyFeeRecord {
        month_key: MonthKey::new(year, month),
        year,
        month,
        tuition_charge: Decimal::from(tuition),
        transport_charge: Decimal::from(transport),
        paid_amount: Decimal::from(paid),
        net_charge: Some(net),
        due_amount: Some(net - Decimal::from(paid)),
        updated_at: None,
    }
}

pub(crate) fn permission_for(exam_id: &str, student_id: &str) -> AdmitPermission {
    AdmitPermission::new(&PermissionKey::new(exam_id, student_id))
}

pub(crate) fn student(student_id: &str, transport_mode: TransportMode) -> Student {
    Student {
        student_id: student_id.to_string(),
        name: "Asha Roy".to_string(),
        class_name: "Class 5".to_string(),
        section: Some("A".to_string()),
        roll_no: "12".to_string(),
        date_of_birth: Some("2015-06-01".to_string()),
        father_name: "Bimal Roy".to_string(),
        mother_name: None,
        gender: None,
        blood_group: None,
        contact_no: Some("9800000000".to_string()),
        address: None,
        transport_mode,
        photo_url: None,
        documents: Vec::new(),
        guardian_uid: format!("guardian-{student_id}"),
    }
}

pub(crate) fn exam(exam_id: &str, created_at: DateTime<Utc>) -> Exam {
    Exam {
        exam_id: exam_id.to_string(),
        name: "Half Yearly".to_string(),
        session: "2025-26".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 9, 15).expect("valid date"),
        time: "10:00 AM".to_string(),
        reporting_time: Some("9:30 AM".to_string()),
        venue: "Main Hall".to_string(),
        created_at,
        updated_at: created_at,
    }
}

/// In-memory store holding `student-1` (by school van) and `exam-1`.
pub(crate) async fn seeded_store() -> Arc<InMemoryLedgerStore> {
    let store = Arc::new(InMemoryLedgerStore::default());
    store
        .put_student(student("student-1", TransportMode::SchoolVan))
        .await
        .expect("seed student");
    store
        .put_account(UserAccount::guardian("guardian-student-1", "student-1"))
        .await
        .expect("seed account");
    store
        .put_exam(exam("exam-1", at(0)))
        .await
        .expect("seed exam");
    store
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(crate) fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

pub(crate) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[derive(Default, Clone)]
pub(crate) struct MemoryNotifier {
    events: Arc<Mutex<Vec<AdminAlert>>>,
}

impl MemoryNotifier {
    pub(crate) fn events(&self) -> Vec<AdminAlert> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl AdminNotifier for MemoryNotifier {
    async fn notify(&self, alert: AdminAlert) -> Result<(), NotifierError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(crate) struct FailingNotifier;

#[async_trait]
impl AdminNotifier for FailingNotifier {
    async fn notify(&self, _alert: AdminAlert) -> Result<(), NotifierError> {
        Err(NotifierError::Transport("smtp relay offline".to_string()))
    }
}

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

pub(crate) struct UnavailableStore;

#[async_trait]
impl LedgerStore for UnavailableStore {
    async fn fetch_student(&self, _student_id: &str) -> Result<Option<Student>, RepositoryError> {
        Err(offline())
    }

    async fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        Err(offline())
    }

    async fn put_student(&self, _student: Student) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn delete_student(&self, _student_id: &str) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn fetch_account(&self, _uid: &str) -> Result<Option<UserAccount>, RepositoryError> {
        Err(offline())
    }

    async fn put_account(&self, _account: UserAccount) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn delete_account(&self, _uid: &str) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn upsert_fee(
        &self,
        _student_id: &str,
        _record: MonthlyFeeRecord,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn list_fees(&self, _student_id: &str) -> Result<Vec<MonthlyFeeRecord>, RepositoryError> {
        Err(offline())
    }

    async fn delete_fees(&self, _student_id: &str) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn fetch_exam(&self, _exam_id: &str) -> Result<Option<Exam>, RepositoryError> {
        Err(offline())
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, RepositoryError> {
        Err(offline())
    }

    async fn put_exam(&self, _exam: Exam) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn fetch_schedule(
        &self,
        _exam_id: &str,
        _class_key: &str,
    ) -> Result<Option<ClassSchedule>, RepositoryError> {
        Err(offline())
    }

    async fn put_schedule(&self, _schedule: ClassSchedule) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn fetch_permission(
        &self,
        _key: &PermissionKey,
    ) -> Result<Option<Versioned<AdmitPermission>>, RepositoryError> {
        Err(offline())
    }

    async fn put_permission(
        &self,
        _permission: AdmitPermission,
        _expected_revision: Option<u64>,
    ) -> Result<u64, RepositoryError> {
        Err(offline())
    }

    async fn delete_permissions_for_student(
        &self,
        _student_id: &str,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }
}

/// Delegates to an in-memory store after failing the first `n` reads.
/// Writes always go through.
pub(crate) struct FlakyStore {
    inner: Arc<InMemoryLedgerStore>,
    failing_reads: AtomicU32,
    reads: AtomicU32,
}

impl FlakyStore {
    pub(crate) fn new(inner: Arc<InMemoryLedgerStore>, failing_reads: u32) -> Self {
        Self {
            inner,
            failing_reads: AtomicU32::new(failing_reads),
            reads: AtomicU32::new(0),
        }
    }

    pub(crate) fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<(), RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let tripped = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if tripped {
            Err(RepositoryError::Unavailable("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn fetch_student(&self, student_id: &str) -> Result<Option<Student>, RepositoryError> {
        self.read()?;
        self.inner.fetch_student(student_id).await
    }

    async fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.read()?;
        self.inner.list_students().await
    }

    async fn put_student(&self, student: Student) -> Result<(), RepositoryError> {
        self.inner.put_student(student).await
    }

    async fn delete_student(&self, student_id: &str) -> Result<(), RepositoryError> {
        self.inner.delete_student(student_id).await
    }

    async fn fetch_account(&self, uid: &str) -> Result<Option<UserAccount>, RepositoryError> {
        self.read()?;
        self.inner.fetch_account(uid).await
    }

    async fn put_account(&self, account: UserAccount) -> Result<(), RepositoryError> {
        self.inner.put_account(account).await
    }

    async fn delete_account(&self, uid: &str) -> Result<(), RepositoryError> {
        self.inner.delete_account(uid).await
    }

    async fn upsert_fee(
        &self,
        student_id: &str,
        record: MonthlyFeeRecord,
    ) -> Result<(), RepositoryError> {
        self.inner.upsert_fee(student_id, record).await
    }

    async fn list_fees(&self, student_id: &str) -> Result<Vec<MonthlyFeeRecord>, RepositoryError> {
        self.read()?;
        self.inner.list_fees(student_id).await
    }

    async fn delete_fees(&self, student_id: &str) -> Result<(), RepositoryError> {
        self.inner.delete_fees(student_id).await
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>, RepositoryError> {
        self.read()?;
        self.inner.fetch_exam(exam_id).await
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, RepositoryError> {
        self.read()?;
        self.inner.list_exams().await
    }

    async fn put_exam(&self, exam: Exam) -> Result<(), RepositoryError> {
        self.inner.put_exam(exam).await
    }

    async fn fetch_schedule(
        &self,
        exam_id: &str,
        class_key: &str,
    ) -> Result<Option<ClassSchedule>, RepositoryError> {
        self.read()?;
        self.inner.fetch_schedule(exam_id, class_key).await
    }

    async fn put_schedule(&self, schedule: ClassSchedule) -> Result<(), RepositoryError> {
        self.inner.put_schedule(schedule).await
    }

    async fn fetch_permission(
        &self,
        key: &PermissionKey,
    ) -> Result<Option<Versioned<AdmitPermission>>, RepositoryError> {
        self.read()?;
        self.inner.fetch_permission(key).await
    }

    async fn put_permission(
        &self,
        permission: AdmitPermission,
        expected_revision: Option<u64>,
    ) -> Result<u64, RepositoryError> {
        self.inner
            .put_permission(permission, expected_revision)
            .await
    }

    async fn delete_permissions_for_student(
        &self,
        student_id: &str,
    ) -> Result<(), RepositoryError> {
        self.inner.delete_permissions_for_student(student_id).await
    }
}

/// Simulates a second admin tab: right before the first permission write
/// lands, another writer issues the admit card for the same document.
pub(crate) struct RacingStore {
    inner: Arc<InMemoryLedgerStore>,
    raced: AtomicBool,
    permission_writes: AtomicU32,
}

impl RacingStore {
    pub(crate) fn new(inner: Arc<InMemoryLedgerStore>) -> Self {
        Self {
            inner,
            raced: AtomicBool::new(false),
            permission_writes: AtomicU32::new(0),
        }
    }

    pub(crate) fn permission_writes(&self) -> u32 {
        self.permission_writes.load(Ordering::SeqCst)
    }

    async fn race(&self, key: &PermissionKey) -> Result<(), RepositoryError> {
        let current = self.inner.fetch_permission(key).await?;
        let (mut competing, revision) = match current {
            Some(stored) => (stored.value, Some(stored.revision)),
            None => (AdmitPermission::new(key), None),
        };
        competing.issue(at(30));
        self.inner.put_permission(competing, revision).await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for RacingStore {
    async fn fetch_student(&self, student_id: &str) -> Result<Option<Student>, RepositoryError> {
        self.inner.fetch_student(student_id).await
    }

    async fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.inner.list_students().await
    }

    async fn put_student(&self, student: Student) -> Result<(), RepositoryError> {
        self.inner.put_student(student).await
    }

    async fn delete_student(&self, student_id: &str) -> Result<(), RepositoryError> {
        self.inner.delete_student(student_id).await
    }

    async fn fetch_account(&self, uid: &str) -> Result<Option<UserAccount>, RepositoryError> {
        self.inner.fetch_account(uid).await
    }

    async fn put_account(&self, account: UserAccount) -> Result<(), RepositoryError> {
        self.inner.put_account(account).await
    }

    async fn delete_account(&self, uid: &str) -> Result<(), RepositoryError> {
        self.inner.delete_account(uid).await
    }

    async fn upsert_fee(
        &self,
        student_id: &str,
        record: MonthlyFeeRecord,
    ) -> Result<(), RepositoryError> {
        self.inner.upsert_fee(student_id, record).await
    }

    async fn list_fees(&self, student_id: &str) -> Result<Vec<MonthlyFeeRecord>, RepositoryError> {
        self.inner.list_fees(student_id).await
    }

    async fn delete_fees(&self, student_id: &str) -> Result<(), RepositoryError> {
        self.inner.delete_fees(student_id).await
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>, RepositoryError> {
        self.inner.fetch_exam(exam_id).await
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, RepositoryError> {
        self.inner.list_exams().await
    }

    async fn put_exam(&self, exam: Exam) -> Result<(), RepositoryError> {
        self.inner.put_exam(exam).await
    }

    async fn fetch_schedule(
        &self,
        exam_id: &str,
        class_key: &str,
    ) -> Result<Option<ClassSchedule>, RepositoryError> {
        self.inner.fetch_schedule(exam_id, class_key).await
    }

    async fn put_schedule(&self, schedule: ClassSchedule) -> Result<(), RepositoryError> {
        self.inner.put_schedule(schedule).await
    }

    async fn fetch_permission(
        &self,
        key: &PermissionKey,
    ) -> Result<Option<Versioned<AdmitPermission>>, RepositoryError> {
        self.inner.fetch_permission(key).await
    }

    async fn put_permission(
        &self,
        permission: AdmitPermission,
        expected_revision: Option<u64>,
    ) -> Result<u64, RepositoryError> {
        self.permission_writes.fetch_add(1, Ordering::SeqCst);
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.race(&permission.key()).await?;
        }
        self.inner
            .put_permission(permission, expected_revision)
            .await
    }

    async fn delete_permissions_for_student(
        &self,
        student_id: &str,
    ) -> Result<(), RepositoryError> {
        self.inner.delete_permissions_for_student(student_id).await
    }
}
