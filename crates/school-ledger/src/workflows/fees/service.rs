use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use super::compute::{compute_due, compute_net_charge, compute_total_due, sort_newest_first};
use super::domain::{FeeStatement, MonthlyFeeInput, MonthlyFeeRecord};
use crate::workflows::error::LedgerServiceError;
use crate::workflows::store::{read_with_retry, LedgerStore, RepositoryError, RetryPolicy};

/// Service owning the monthly fee ledger.
pub struct FeeLedgerService<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S> FeeLedgerService<S>
where
    S: LedgerStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Validate and upsert one month of the student's ledger. Nothing is
    /// written when validation fails.
    pub async fn save_monthly_fee(
        &self,
        student_id: &str,
        input: MonthlyFeeInput,
    ) -> Result<MonthlyFeeRecord, LedgerServiceError> {
        let entry = input.validate()?;

        let student = read_with_retry(&self.retry, "fetch_student", || {
            self.store.fetch_student(student_id)
        })
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let transport_charge = if student.transport_mode.is_on_foot() {
            Decimal::ZERO
        } else {
            entry.transport_charge
        };
        let net_charge = compute_net_charge(
            entry.tuition_charge,
            entry.transport_charge,
            student.transport_mode,
        )?;
        let due_amount = compute_due(net_charge, entry.paid_amount)?;

        let record = MonthlyFeeRecord {
            month_key: entry.month_key(),
            year: entry.year,
            month: entry.month,
            tuition_charge: entry.tuition_charge,
            transport_charge,
            paid_amount: entry.paid_amount,
            net_charge: Some(net_charge),
            due_amount: Some(due_amount),
            updated_at: Some(Utc::now()),
        };

        self.store.upsert_fee(student_id, record.clone()).await?;
        info!(
            student_id,
            month = %record.month_key,
            net = %net_charge,
            due = %due_amount,
            "monthly fee saved"
        );
        Ok(record)
    }

    /// Every month on file for the student, newest first.
    pub async fn monthly_fees(
        &self,
        student_id: &str,
    ) -> Result<Vec<MonthlyFeeRecord>, LedgerServiceError> {
        let mut records = read_with_retry(&self.retry, "list_fees", || {
            self.store.list_fees(student_id)
        })
        .await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Ledger plus the clamped total due, for an existing student.
    pub async fn statement(&self, student_id: &str) -> Result<FeeStatement, LedgerServiceError> {
        read_with_retry(&self.retry, "fetch_student", || {
            self.store.fetch_student(student_id)
        })
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let records = self.monthly_fees(student_id).await?;
        let total_due = compute_total_due(&records)?;
        Ok(FeeStatement {
            student_id: student_id.to_string(),
            records,
            total_due,
        })
    }
}
