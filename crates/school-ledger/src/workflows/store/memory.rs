use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{LedgerStore, RepositoryError, Versioned};
use crate::workflows::admit::domain::{AdmitPermission, ClassSchedule, Exam, PermissionKey};
use crate::workflows::fees::domain::{MonthKey, MonthlyFeeRecord};
use crate::workflows::roster::domain::{Student, UserAccount};

#[derive(Debug, Default)]
struct LedgerState {
    students: HashMap<String, Student>,
    accounts: HashMap<String, UserAccount>,
    fees: HashMap<String, BTreeMap<MonthKey, MonthlyFeeRecord>>,
    exams: HashMap<String, Exam>,
    schedules: HashMap<(String, String), ClassSchedule>,
    permissions: HashMap<PermissionKey, Versioned<AdmitPermission>>,
}

/// Process-local [`LedgerStore`] used by the service binary, demos and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn fetch_student(&self, student_id: &str) -> Result<Option<Student>, RepositoryError> {
        Ok(self.lock()?.students.get(student_id).cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        Ok(self.lock()?.students.values().cloned().collect())
    }

    async fn put_student(&self, student: Student) -> Result<(), RepositoryError> {
        self.lock()?
            .students
            .insert(student.student_id.clone(), student);
        Ok(())
    }

    async fn delete_student(&self, student_id: &str) -> Result<(), RepositoryError> {
        self.lock()?.students.remove(student_id);
        Ok(())
    }

    async fn fetch_account(&self, uid: &str) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.lock()?.accounts.get(uid).cloned())
    }

    async fn put_account(&self, account: UserAccount) -> Result<(), RepositoryError> {
        self.lock()?.accounts.insert(account.uid.clone(), account);
        Ok(())
    }

    async fn delete_account(&self, uid: &str) -> Result<(), RepositoryError> {
        self.lock()?.accounts.remove(uid);
        Ok(())
    }

    async fn upsert_fee(
        &self,
        student_id: &str,
        record: MonthlyFeeRecord,
    ) -> Result<(), RepositoryError> {
        self.lock()?
            .fees
            .entry(student_id.to_string())
            .or_default()
            .insert(record.month_key.clone(), record);
        Ok(())
    }

    async fn list_fees(&self, student_id: &str) -> Result<Vec<MonthlyFeeRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .fees
            .get(student_id)
            .map(|months| months.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_fees(&self, student_id: &str) -> Result<(), RepositoryError> {
        self.lock()?.fees.remove(student_id);
        Ok(())
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>, RepositoryError> {
        Ok(self.lock()?.exams.get(exam_id).cloned())
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, RepositoryError> {
        Ok(self.lock()?.exams.values().cloned().collect())
    }

    async fn put_exam(&self, exam: Exam) -> Result<(), RepositoryError> {
        self.lock()?.exams.insert(exam.exam_id.clone(), exam);
        Ok(())
    }

    async fn fetch_schedule(
        &self,
        exam_id: &str,
        class_key: &str,
    ) -> Result<Option<ClassSchedule>, RepositoryError> {
        Ok(self
            .lock()?
            .schedules
            .get(&(exam_id.to_string(), class_key.to_string()))
            .cloned())
    }

    async fn put_schedule(&self, schedule: ClassSchedule) -> Result<(), RepositoryError> {
        self.lock()?.schedules.insert(
            (schedule.exam_id.clone(), schedule.class_key.clone()),
            schedule,
        );
        Ok(())
    }

    async fn fetch_permission(
        &self,
        key: &PermissionKey,
    ) -> Result<Option<Versioned<AdmitPermission>>, RepositoryError> {
        Ok(self.lock()?.permissions.get(key).cloned())
    }

    async fn put_permission(
        &self,
        permission: AdmitPermission,
        expected_revision: Option<u64>,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.lock()?;
        let key = permission.key();
        let current = state.permissions.get(&key).map(|stored| stored.revision);
        if current != expected_revision {
            return Err(RepositoryError::Conflict);
        }

        let revision = current.map_or(1, |revision| revision + 1);
        state.permissions.insert(
            key,
            Versioned {
                revision,
                value: permission,
            },
        );
        Ok(revision)
    }

    async fn delete_permissions_for_student(
        &self,
        student_id: &str,
    ) -> Result<(), RepositoryError> {
        self.lock()?
            .permissions
            .retain(|key, _| key.student_id != student_id);
        Ok(())
    }
}
