//! Persistence seam for the portal's document store.
//!
//! Documents are addressed the same way the hosted backend lays them out:
//! `students/{id}`, `users/{uid}`, `fees/{id}/months/{YYYY-MM}`, `exams/{id}`,
//! `exams/{id}/schedules/{classKey}` and `exams/{id}/permissions/{studentId}`.
//! Admit permissions carry a revision so callers can perform
//! compare-and-swap writes instead of blind merges.

mod memory;
mod retry;

pub use memory::InMemoryLedgerStore;
pub use retry::{read_with_retry, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::admit::domain::{AdmitPermission, ClassSchedule, Exam, PermissionKey};
use super::fees::domain::MonthlyFeeRecord;
use super::roster::domain::{Student, UserAccount};

/// A stored document together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub revision: u64,
    pub value: T,
}

/// Storage abstraction so the workflow services can be exercised in isolation.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn fetch_student(&self, student_id: &str) -> Result<Option<Student>, RepositoryError>;
    async fn list_students(&self) -> Result<Vec<Student>, RepositoryError>;
    async fn put_student(&self, student: Student) -> Result<(), RepositoryError>;
    async fn delete_student(&self, student_id: &str) -> Result<(), RepositoryError>;

    async fn fetch_account(&self, uid: &str) -> Result<Option<UserAccount>, RepositoryError>;
    async fn put_account(&self, account: UserAccount) -> Result<(), RepositoryError>;
    async fn delete_account(&self, uid: &str) -> Result<(), RepositoryError>;

    /// Upsert keyed by `(student_id, record.month_key)`; the last write wins.
    async fn upsert_fee(
        &self,
        student_id: &str,
        record: MonthlyFeeRecord,
    ) -> Result<(), RepositoryError>;
    async fn list_fees(&self, student_id: &str) -> Result<Vec<MonthlyFeeRecord>, RepositoryError>;
    async fn delete_fees(&self, student_id: &str) -> Result<(), RepositoryError>;

    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>, RepositoryError>;
    async fn list_exams(&self) -> Result<Vec<Exam>, RepositoryError>;
    async fn put_exam(&self, exam: Exam) -> Result<(), RepositoryError>;

    async fn fetch_schedule(
        &self,
        exam_id: &str,
        class_key: &str,
    ) -> Result<Option<ClassSchedule>, RepositoryError>;
    async fn put_schedule(&self, schedule: ClassSchedule) -> Result<(), RepositoryError>;

    async fn fetch_permission(
        &self,
        key: &PermissionKey,
    ) -> Result<Option<Versioned<AdmitPermission>>, RepositoryError>;

    /// Compare-and-swap write. `expected_revision` of `None` means the
    /// document must not exist yet. Returns the new revision, or
    /// [`RepositoryError::Conflict`] when the stored revision moved on.
    async fn put_permission(
        &self,
        permission: AdmitPermission,
        expected_revision: Option<u64>,
    ) -> Result<u64, RepositoryError>;
    async fn delete_permissions_for_student(
        &self,
        student_id: &str,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was modified concurrently or already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}
