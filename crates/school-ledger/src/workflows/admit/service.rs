use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::class_key;
use super::domain::{
    latest_exam, validate_schedule_rows, AdmitPermission, ClassSchedule, Exam, ExamDraft,
    PaymentMethod, PaymentRequest, PermissionKey, ScheduleRowInput,
};
use super::eligibility::EligibilityView;
use super::notifier::{AdminAlert, AdminNotifier};
use super::payment::{
    generate_reference_id, sanitize_utr, NewPaymentRequest, PaymentSubmission, ReviewDecision,
};
use crate::workflows::error::LedgerServiceError;
use crate::workflows::fees::compute_total_due;
use crate::workflows::roster::domain::Student;
use crate::workflows::store::{
    read_with_retry, LedgerStore, RepositoryError, RetryPolicy, Versioned,
};
use crate::workflows::validation::{optional_text, ValidationError};

/// Compare-and-swap cycles attempted before a permission write gives up.
const MAX_PERMISSION_WRITE_ATTEMPTS: u32 = 5;

/// Service composing exams, timetables, admit permissions and the payment
/// verification workflow.
pub struct AdmitCardService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    retry: RetryPolicy,
}

impl<S, N> AdmitCardService<S, N>
where
    S: LedgerStore + 'static,
    N: AdminNotifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self::with_retry_policy(store, notifier, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: Arc<S>, notifier: Arc<N>, retry: RetryPolicy) -> Self {
        Self {
            store,
            notifier,
            retry,
        }
    }

    pub async fn create_exam(&self, draft: ExamDraft) -> Result<Exam, LedgerServiceError> {
        let now = Utc::now();
        let exam = draft.into_exam(Uuid::new_v4().to_string(), now, now)?;
        self.store.put_exam(exam.clone()).await?;
        info!(exam_id = %exam.exam_id, name = %exam.name, "exam created");
        Ok(exam)
    }

    pub async fn update_exam(
        &self,
        exam_id: &str,
        draft: ExamDraft,
    ) -> Result<Exam, LedgerServiceError> {
        let existing = self.fetch_exam(exam_id).await?;
        let exam = draft.into_exam(existing.exam_id, existing.created_at, Utc::now())?;
        self.store.put_exam(exam.clone()).await?;
        info!(exam_id, "exam updated");
        Ok(exam)
    }

    /// Newest exam first.
    pub async fn list_exams(&self) -> Result<Vec<Exam>, LedgerServiceError> {
        let mut exams =
            read_with_retry(&self.retry, "list_exams", || self.store.list_exams()).await?;
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(exams)
    }

    /// The exam guardians are shown, if any exists.
    pub async fn latest_exam(&self) -> Result<Option<Exam>, LedgerServiceError> {
        let exams =
            read_with_retry(&self.retry, "list_exams", || self.store.list_exams()).await?;
        Ok(latest_exam(exams))
    }

    /// Replace the timetable for a class. The class label is normalised so
    /// lookups from a student's free-text class land on the same document.
    pub async fn save_schedule(
        &self,
        exam_id: &str,
        class_name: &str,
        rows: Vec<ScheduleRowInput>,
    ) -> Result<ClassSchedule, LedgerServiceError> {
        let class_key = class_key::normalize(class_name);
        if class_key.is_empty() {
            return Err(ValidationError::Missing {
                field: "class_name",
            }
            .into());
        }
        let rows = validate_schedule_rows(&rows)?;
        self.fetch_exam(exam_id).await?;

        let schedule = ClassSchedule {
            exam_id: exam_id.to_string(),
            class_key,
            rows,
            updated_at: Utc::now(),
        };
        self.store.put_schedule(schedule.clone()).await?;
        info!(exam_id, class_key = %schedule.class_key, rows = schedule.rows.len(), "timetable saved");
        Ok(schedule)
    }

    pub async fn schedule(
        &self,
        exam_id: &str,
        class_name: &str,
    ) -> Result<ClassSchedule, LedgerServiceError> {
        let class_key = class_key::normalize(class_name);
        let schedule = read_with_retry(&self.retry, "fetch_schedule", || {
            self.store.fetch_schedule(exam_id, &class_key)
        })
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(schedule)
    }

    /// Current permission, or the not-issued default when none is stored.
    pub async fn permission(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> Result<AdmitPermission, LedgerServiceError> {
        let key = PermissionKey::new(exam_id, student_id);
        let permission = self
            .load_permission(&key)
            .await?
            .map(|stored| stored.value)
            .unwrap_or_else(|| AdmitPermission::new(&key));
        Ok(permission)
    }

    /// Whether the guardian may download the admit card, and why not.
    pub async fn eligibility(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> Result<EligibilityView, LedgerServiceError> {
        self.fetch_student(student_id).await?;
        self.fetch_exam(exam_id).await?;

        let total_due = self.total_due(student_id).await?;
        let permission = self.permission(student_id, exam_id).await?;
        Ok(EligibilityView::new(&permission, total_due))
    }

    pub async fn issue_admit_card(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> Result<AdmitPermission, LedgerServiceError> {
        self.fetch_student(student_id).await?;
        self.fetch_exam(exam_id).await?;

        let key = PermissionKey::new(exam_id, student_id);
        let now = Utc::now();
        let (permission, ()) = self
            .mutate_permission(&key, |permission| {
                permission.issue(now);
                Ok(())
            })
            .await?;
        info!(exam_id, student_id, "admit card issued");
        Ok(permission)
    }

    /// Manual download unlock, independent of the ledger.
    pub async fn set_admin_override(
        &self,
        student_id: &str,
        exam_id: &str,
        allow_download: bool,
    ) -> Result<AdmitPermission, LedgerServiceError> {
        self.fetch_student(student_id).await?;
        self.fetch_exam(exam_id).await?;

        let key = PermissionKey::new(exam_id, student_id);
        let now = Utc::now();
        let (permission, ()) = self
            .mutate_permission(&key, |permission| {
                permission.set_allow_download(allow_download, now);
                Ok(())
            })
            .await?;
        info!(exam_id, student_id, allow_download, "download override updated");
        Ok(permission)
    }

    /// Record a UPI payment claim. The UTR is checked before anything is read
    /// or written.
    pub async fn submit_payment(
        &self,
        student_id: &str,
        exam_id: &str,
        submission: PaymentSubmission,
    ) -> Result<PaymentRequest, LedgerServiceError> {
        let utr = sanitize_utr(submission.utr.as_deref().unwrap_or_default())?;
        self.record_payment_claim(
            student_id,
            exam_id,
            PaymentMethod::Upi,
            Some(utr),
            submission.note,
        )
        .await
    }

    /// Record the guardian's intent to settle the due at the school office.
    pub async fn request_pay_at_school(
        &self,
        student_id: &str,
        exam_id: &str,
        note: Option<String>,
    ) -> Result<PaymentRequest, LedgerServiceError> {
        self.record_payment_claim(student_id, exam_id, PaymentMethod::PayAtSchool, None, note)
            .await
    }

    /// Admin verdict on the latest claim. Verifying unlocks the download.
    pub async fn review_payment(
        &self,
        student_id: &str,
        exam_id: &str,
        decision: ReviewDecision,
    ) -> Result<AdmitPermission, LedgerServiceError> {
        self.fetch_student(student_id).await?;
        self.fetch_exam(exam_id).await?;

        let key = PermissionKey::new(exam_id, student_id);
        let now = Utc::now();
        let (permission, ()) = self
            .mutate_permission(&key, |permission| {
                permission
                    .review_payment(decision, now)
                    .map_err(LedgerServiceError::from)
            })
            .await?;
        info!(
            exam_id,
            student_id,
            status = decision.status().label(),
            allow_download = permission.allow_download,
            "payment request reviewed"
        );

        let mut details = BTreeMap::new();
        details.insert("status".to_string(), decision.status().label().to_string());
        self.notifier
            .notify(AdminAlert {
                template: AdminAlert::PAYMENT_REVIEWED.to_string(),
                exam_id: exam_id.to_string(),
                student_id: student_id.to_string(),
                details,
            })
            .await?;

        Ok(permission)
    }

    async fn record_payment_claim(
        &self,
        student_id: &str,
        exam_id: &str,
        method: PaymentMethod,
        utr: Option<String>,
        note: Option<String>,
    ) -> Result<PaymentRequest, LedgerServiceError> {
        let student = self.fetch_student(student_id).await?;
        let exam = self.fetch_exam(exam_id).await?;
        let amount = self.total_due(student_id).await?;

        let now = Utc::now();
        let reference_id = generate_reference_id(now, &mut rand::thread_rng());
        let note = optional_text(note.as_deref())
            .unwrap_or_else(|| format!("School fee {} {}", student.name, exam.session));
        let claim = NewPaymentRequest {
            method,
            utr,
            reference_id,
            note,
            amount,
        };

        let key = PermissionKey::new(exam_id, student_id);
        let (_, request) = self
            .mutate_permission(&key, |permission| {
                permission
                    .submit_payment(claim.clone(), now)
                    .cloned()
                    .map_err(LedgerServiceError::from)
            })
            .await?;
        info!(
            exam_id,
            student_id,
            reference_id = %request.reference_id,
            amount = %request.amount,
            "payment request submitted"
        );

        self.notifier
            .notify(submission_alert(&student, &request, exam_id))
            .await?;
        Ok(request)
    }

    async fn fetch_student(&self, student_id: &str) -> Result<Student, LedgerServiceError> {
        let student = read_with_retry(&self.retry, "fetch_student", || {
            self.store.fetch_student(student_id)
        })
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(student)
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, LedgerServiceError> {
        let exam = read_with_retry(&self.retry, "fetch_exam", || self.store.fetch_exam(exam_id))
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(exam)
    }

    async fn total_due(&self, student_id: &str) -> Result<Decimal, LedgerServiceError> {
        let records = read_with_retry(&self.retry, "list_fees", || {
            self.store.list_fees(student_id)
        })
        .await?;
        Ok(compute_total_due(&records)?)
    }

    async fn load_permission(
        &self,
        key: &PermissionKey,
    ) -> Result<Option<Versioned<AdmitPermission>>, LedgerServiceError> {
        let stored = read_with_retry(&self.retry, "fetch_permission", || {
            self.store.fetch_permission(key)
        })
        .await?;
        Ok(stored)
    }

    /// Read-modify-write of one permission document. A concurrent writer
    /// makes the compare-and-swap fail, in which case the whole cycle runs
    /// again against the fresh document.
    async fn mutate_permission<T, F>(
        &self,
        key: &PermissionKey,
        mut apply: F,
    ) -> Result<(AdmitPermission, T), LedgerServiceError>
    where
        F: FnMut(&mut AdmitPermission) -> Result<T, LedgerServiceError> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_PERMISSION_WRITE_ATTEMPTS {
            let (mut permission, expected_revision) = match self.load_permission(key).await? {
                Some(stored) => (stored.value, Some(stored.revision)),
                None => (AdmitPermission::new(key), None),
            };

            let outcome = apply(&mut permission)?;
            match self
                .store
                .put_permission(permission.clone(), expected_revision)
                .await
            {
                Ok(_) => return Ok((permission, outcome)),
                Err(RepositoryError::Conflict) => {
                    warn!(
                        exam_id = %key.exam_id,
                        student_id = %key.student_id,
                        attempt,
                        "admit permission changed concurrently, retrying"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(RepositoryError::Conflict.into())
    }
}

fn submission_alert(student: &Student, request: &PaymentRequest, exam_id: &str) -> AdminAlert {
    let mut details = BTreeMap::new();
    details.insert("student".to_string(), student.name.clone());
    details.insert("class".to_string(), student.class_label());
    details.insert("amount".to_string(), request.amount.to_string());
    details.insert("reference_id".to_string(), request.reference_id.clone());
    details.insert(
        "method".to_string(),
        match request.method {
            PaymentMethod::Upi => "upi".to_string(),
            PaymentMethod::PayAtSchool => "pay_at_school".to_string(),
        },
    );
    if let Some(utr) = &request.utr {
        details.insert("utr".to_string(), utr.clone());
    }

    AdminAlert {
        template: AdminAlert::PAYMENT_SUBMITTED.to_string(),
        exam_id: exam_id.to_string(),
        student_id: student.student_id.clone(),
        details,
    }
}
