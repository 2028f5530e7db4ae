use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::dashboard::GuardianDashboard;
use super::domain::{AccountRole, Student, StudentDraft, UserAccount};
use crate::workflows::admit::class_key;
use crate::workflows::admit::domain::{latest_exam, AdmitPermission, PermissionKey};
use crate::workflows::error::LedgerServiceError;
use crate::workflows::store::{read_with_retry, LedgerStore, RepositoryError, RetryPolicy};

/// Service owning student profiles, guardian accounts and the guardian view.
pub struct RosterService<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S> RosterService<S>
where
    S: LedgerStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Create the student profile and link the guardian account to it. A
    /// guardian already linked to another live student is a conflict.
    pub async fn register_student(
        &self,
        draft: StudentDraft,
    ) -> Result<Student, LedgerServiceError> {
        let student = draft.into_student(Uuid::new_v4().to_string(), None)?;

        let existing = read_with_retry(&self.retry, "fetch_account", || {
            self.store.fetch_account(&student.guardian_uid)
        })
        .await?;
        if let Some(account) = existing {
            if account.role == AccountRole::Admin {
                return Err(LedgerServiceError::NotGuardian(account.uid));
            }
            if let Some(linked) = account.student_id.as_deref() {
                let still_enrolled = read_with_retry(&self.retry, "fetch_student", || {
                    self.store.fetch_student(linked)
                })
                .await?
                .is_some();
                if still_enrolled {
                    warn!(guardian_uid = %account.uid, linked, "guardian already linked");
                    return Err(RepositoryError::Conflict.into());
                }
            }
        }

        self.store.put_student(student.clone()).await?;
        self.store
            .put_account(UserAccount::guardian(
                student.guardian_uid.clone(),
                student.student_id.clone(),
            ))
            .await?;
        info!(
            student_id = %student.student_id,
            class = %student.class_name,
            "student registered"
        );
        Ok(student)
    }

    /// Overwrite the profile. The id and guardian link never change here.
    pub async fn update_student(
        &self,
        student_id: &str,
        draft: StudentDraft,
    ) -> Result<Student, LedgerServiceError> {
        let existing = self.get_student(student_id).await?;
        let student = draft.into_student(existing.student_id, Some(existing.guardian_uid))?;
        self.store.put_student(student.clone()).await?;
        info!(student_id, "student updated");
        Ok(student)
    }

    pub async fn get_student(&self, student_id: &str) -> Result<Student, LedgerServiceError> {
        let student = read_with_retry(&self.retry, "fetch_student", || {
            self.store.fetch_student(student_id)
        })
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(student)
    }

    /// All students ordered by class, then roll number.
    pub async fn list_students(&self) -> Result<Vec<Student>, LedgerServiceError> {
        let mut students =
            read_with_retry(&self.retry, "list_students", || self.store.list_students()).await?;
        students.sort_by(|a, b| {
            compare_class_names(&a.class_name, &b.class_name)
                .then_with(|| compare_roll_numbers(&a.roll_no, &b.roll_no))
        });
        Ok(students)
    }

    /// Remove the student together with their fee ledger, every admit
    /// permission and the guardian account linked to them.
    pub async fn delete_student(&self, student_id: &str) -> Result<(), LedgerServiceError> {
        let student = self.get_student(student_id).await?;

        self.store.delete_fees(student_id).await?;
        self.store.delete_permissions_for_student(student_id).await?;

        let account = read_with_retry(&self.retry, "fetch_account", || {
            self.store.fetch_account(&student.guardian_uid)
        })
        .await?;
        if let Some(account) = account {
            if account.student_id.as_deref() == Some(student_id) {
                self.store.delete_account(&account.uid).await?;
            }
        }

        self.store.delete_student(student_id).await?;
        info!(student_id, "student deleted");
        Ok(())
    }

    /// The student a guardian account is linked to.
    pub async fn resolve_guardian(&self, uid: &str) -> Result<Student, LedgerServiceError> {
        let account = read_with_retry(&self.retry, "fetch_account", || {
            self.store.fetch_account(uid)
        })
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if account.role != AccountRole::Guardian {
            return Err(LedgerServiceError::NotGuardian(uid.to_string()));
        }
        let student_id = account
            .student_id
            .ok_or_else(|| LedgerServiceError::NotLinked(uid.to_string()))?;

        read_with_retry(&self.retry, "fetch_student", || {
            self.store.fetch_student(&student_id)
        })
        .await?
        .ok_or_else(|| {
            warn!(uid, student_id = %student_id, "guardian linked to a missing student");
            LedgerServiceError::NotLinked(uid.to_string())
        })
    }

    pub async fn guardian_dashboard(
        &self,
        uid: &str,
    ) -> Result<GuardianDashboard, LedgerServiceError> {
        let student = self.resolve_guardian(uid).await?;
        let student_id = student.student_id.clone();

        let fees = read_with_retry(&self.retry, "list_fees", || {
            self.store.list_fees(&student_id)
        })
        .await?;
        let exams =
            read_with_retry(&self.retry, "list_exams", || self.store.list_exams()).await?;
        let exam = latest_exam(exams);

        let (schedule, permission) = match &exam {
            Some(exam) => {
                let class_key = class_key::normalize(&student.class_name);
                let schedule = read_with_retry(&self.retry, "fetch_schedule", || {
                    self.store.fetch_schedule(&exam.exam_id, &class_key)
                })
                .await?;
                let key = PermissionKey::new(exam.exam_id.clone(), student_id.clone());
                let permission = read_with_retry(&self.retry, "fetch_permission", || {
                    self.store.fetch_permission(&key)
                })
                .await?
                .map(|stored| stored.value)
                .unwrap_or_else(|| AdmitPermission::new(&key));
                (schedule, Some(permission))
            }
            None => (None, None),
        };

        Ok(GuardianDashboard::assemble(
            student, fees, exam, schedule, permission,
        )?)
    }
}

/// Classes order by their grade number ("Class 2" before "Class 10"), with
/// unnumbered classes such as "UKG" ahead of numbered ones. Ties fall back to
/// the label text.
fn compare_class_names(a: &str, b: &str) -> Ordering {
    class_grade(a).cmp(&class_grade(b)).then_with(|| a.cmp(b))
}

fn class_grade(class_name: &str) -> Option<u32> {
    let digits: String = class_name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Numeric roll numbers sort numerically; anything else falls back to text.
fn compare_roll_numbers(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}
