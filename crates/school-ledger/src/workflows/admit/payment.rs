//! Payment verification state machine.
//!
//! `none -> submitted -> {verified, rejected}`, with `rejected -> submitted`
//! on resubmission. `verified` is terminal; verifying again only refreshes
//! the review time.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{AdmitPermission, PaymentMethod, PaymentRequest, PaymentStatus};
use crate::workflows::validation::ValidationError;

const UTR_MIN_LEN: usize = 8;
const UTR_MAX_LEN: usize = 30;
const REFERENCE_PREFIX: &str = "FBW";
const REFERENCE_MAX_LEN: usize = 24;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Uppercase the reference, drop anything that is not an ASCII letter or
/// digit, and require 8 to 30 characters.
pub fn sanitize_utr(raw: &str) -> Result<String, ValidationError> {
    let utr: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();

    if utr.is_empty() {
        return Err(ValidationError::Missing { field: "utr" });
    }
    if !(UTR_MIN_LEN..=UTR_MAX_LEN).contains(&utr.len()) {
        return Err(ValidationError::ReferenceShape { length: utr.len() });
    }
    Ok(utr)
}

/// Short alphanumeric payment reference: prefix, the last eight digits of the
/// epoch milliseconds, and six random base-36 characters.
pub fn generate_reference_id<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    let millis = now.timestamp_millis().unsigned_abs().to_string();
    let time_part = &millis[millis.len().saturating_sub(8)..];
    let random_part: String = (0..6)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    let mut reference = format!("{REFERENCE_PREFIX}{time_part}{random_part}");
    reference.truncate(REFERENCE_MAX_LEN);
    reference
}

/// Guardian-side claim body for a UPI transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSubmission {
    pub utr: Option<String>,
    pub note: Option<String>,
}

/// Admin review outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Verified,
    Rejected,
}

impl ReviewDecision {
    pub const fn status(self) -> PaymentStatus {
        match self {
            ReviewDecision::Verified => PaymentStatus::Verified,
            ReviewDecision::Rejected => PaymentStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("no payment request has been submitted for this exam")]
    NoPaymentRequest,
    #[error("payment is already verified")]
    AlreadyVerified,
    #[error("a {from} payment request cannot be marked {to}")]
    Invalid {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

/// Fields captured when a guardian submits a claim.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentRequest {
    pub method: PaymentMethod,
    pub utr: Option<String>,
    pub reference_id: String,
    pub note: String,
    pub amount: Decimal,
}

impl AdmitPermission {
    /// Replace the current claim with a fresh `submitted` one.
    pub fn submit_payment(
        &mut self,
        request: NewPaymentRequest,
        at: DateTime<Utc>,
    ) -> Result<&PaymentRequest, TransitionError> {
        if self.payment_status() == Some(PaymentStatus::Verified) {
            return Err(TransitionError::AlreadyVerified);
        }

        self.updated_at = Some(at);
        let request: &PaymentRequest = self.payment_request.insert(PaymentRequest {
            method: request.method,
            utr: request.utr,
            reference_id: request.reference_id,
            note: request.note,
            amount: request.amount.max(Decimal::ZERO),
            status: PaymentStatus::Submitted,
            submitted_at: at,
            reviewed_at: None,
        });
        Ok(request)
    }

    /// Apply an admin review. Verifying also unlocks the download; rejecting
    /// leaves the override untouched.
    pub fn review_payment(
        &mut self,
        decision: ReviewDecision,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        let request = self
            .payment_request
            .as_mut()
            .ok_or(TransitionError::NoPaymentRequest)?;

        let target = decision.status();
        match (request.status, target) {
            (PaymentStatus::Submitted, _)
            | (PaymentStatus::Verified, PaymentStatus::Verified)
            | (PaymentStatus::Rejected, PaymentStatus::Rejected) => {}
            (from, to) => return Err(TransitionError::Invalid { from, to }),
        }

        request.status = target;
        request.reviewed_at = Some(at);
        if decision == ReviewDecision::Verified {
            self.allow_download = true;
        }
        self.updated_at = Some(at);
        Ok(())
    }
}
