use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::Student;
use crate::workflows::admit::domain::{AdmitPermission, ClassSchedule, Exam, PaymentRequest};
use crate::workflows::admit::eligibility::EligibilityView;
use crate::workflows::fees::compute::{compute_total_due, sort_newest_first, FeeArithmeticError};
use crate::workflows::fees::domain::MonthlyFeeRecord;

/// Everything the guardian portal renders after sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardianDashboard {
    pub student: Student,
    pub fees: Vec<MonthlyFeeRecord>,
    pub total_due: Decimal,
    pub exam: Option<Exam>,
    pub schedule: Option<ClassSchedule>,
    pub payment_request: Option<PaymentRequest>,
    pub eligibility: Option<EligibilityView>,
}

impl GuardianDashboard {
    /// `permission` is only consulted when there is an exam to gate.
    pub fn assemble(
        student: Student,
        mut fees: Vec<MonthlyFeeRecord>,
        exam: Option<Exam>,
        schedule: Option<ClassSchedule>,
        permission: Option<AdmitPermission>,
    ) -> Result<Self, FeeArithmeticError> {
        sort_newest_first(&mut fees);
        let total_due = compute_total_due(&fees)?;

        let (payment_request, eligibility) = match (&exam, permission) {
            (Some(_), Some(permission)) => (
                permission.payment_request.clone(),
                Some(EligibilityView::new(&permission, total_due)),
            ),
            _ => (None, None),
        };

        Ok(Self {
            student,
            fees,
            total_due,
            exam,
            schedule,
            payment_request,
            eligibility,
        })
    }
}
