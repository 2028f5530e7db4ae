//! Admit-card download gate.
//!
//! The checks run in a fixed order: issuance gates everything, a cleared
//! ledger unlocks, and the admin override and a verified payment are two
//! alternative unlocks that ignore the outstanding amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{AdmitPermission, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    NotIssued,
    AwaitingVerification,
    DueNotCleared,
}

impl BlockReason {
    pub const fn message(self) -> &'static str {
        match self {
            BlockReason::NotIssued => "Admit card not yet issued by administrator.",
            BlockReason::AwaitingVerification => "Payment submitted, awaiting verification.",
            BlockReason::DueNotCleared => {
                "Due not cleared: the admit card unlocks once the due is paid."
            }
        }
    }
}

/// Which rule let the guardian through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockPath {
    DueCleared,
    AdminOverride,
    PaymentVerified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Allowed(UnlockPath),
    Blocked(BlockReason),
}

impl Eligibility {
    pub fn can_download(&self) -> bool {
        matches!(self, Eligibility::Allowed(_))
    }

    pub fn reason(&self) -> Option<BlockReason> {
        match self {
            Eligibility::Allowed(_) => None,
            Eligibility::Blocked(reason) => Some(*reason),
        }
    }
}

/// Decide whether the admit card may be downloaded. `total_due` is the
/// clamped ledger total.
pub fn evaluate(permission: &AdmitPermission, total_due: Decimal) -> Eligibility {
    if !permission.issued {
        return Eligibility::Blocked(BlockReason::NotIssued);
    }
    if total_due <= Decimal::ZERO {
        return Eligibility::Allowed(UnlockPath::DueCleared);
    }
    if permission.allow_download {
        return Eligibility::Allowed(UnlockPath::AdminOverride);
    }
    match permission.payment_status() {
        Some(PaymentStatus::Verified) => Eligibility::Allowed(UnlockPath::PaymentVerified),
        Some(PaymentStatus::Submitted) => Eligibility::Blocked(BlockReason::AwaitingVerification),
        Some(PaymentStatus::Rejected) | None => Eligibility::Blocked(BlockReason::DueNotCleared),
    }
}

/// Wire form of an eligibility decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityView {
    pub exam_id: String,
    pub student_id: String,
    pub can_download: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_by: Option<UnlockPath>,
    pub total_due: Decimal,
}

impl EligibilityView {
    pub fn new(permission: &AdmitPermission, total_due: Decimal) -> Self {
        let eligibility = evaluate(permission, total_due);
        let unlocked_by = match eligibility {
            Eligibility::Allowed(path) => Some(path),
            Eligibility::Blocked(_) => None,
        };
        Self {
            exam_id: permission.exam_id.clone(),
            student_id: permission.student_id.clone(),
            can_download: eligibility.can_download(),
            reason: eligibility
                .reason()
                .map(|reason| reason.message().to_string())
                .unwrap_or_default(),
            block_reason: eligibility.reason(),
            unlocked_by,
            total_due,
        }
    }
}
