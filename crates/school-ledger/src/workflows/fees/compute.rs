//! Money figures derived from raw ledger input.

use rust_decimal::Decimal;

use super::domain::MonthlyFeeRecord;
use crate::workflows::roster::domain::TransportMode;

/// A ledger figure left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FeeArithmeticError {
    #[error("{0} overflowed while computing the fee ledger")]
    Overflow(&'static str),
}

/// Tuition plus transport; students who walk are never charged transport.
pub fn compute_net_charge(
    tuition_charge: Decimal,
    transport_charge: Decimal,
    transport_mode: TransportMode,
) -> Result<Decimal, FeeArithmeticError> {
    if transport_mode.is_on_foot() {
        Ok(tuition_charge)
    } else {
        tuition_charge
            .checked_add(transport_charge)
            .ok_or(FeeArithmeticError::Overflow("net_charge"))
    }
}

/// Record-level due. Not clamped: a negative result is a credit.
pub fn compute_due(
    net_charge: Decimal,
    paid_amount: Decimal,
) -> Result<Decimal, FeeArithmeticError> {
    net_charge
        .checked_sub(paid_amount)
        .ok_or(FeeArithmeticError::Overflow("due_amount"))
}

/// Sum of every month's due, then clamped at zero.
pub fn compute_total_due(records: &[MonthlyFeeRecord]) -> Result<Decimal, FeeArithmeticError> {
    let total = records.iter().try_fold(Decimal::ZERO, |total, record| {
        total
            .checked_add(record.due()?)
            .ok_or(FeeArithmeticError::Overflow("total_due"))
    })?;
    Ok(total.max(Decimal::ZERO))
}

/// Newest month first.
pub fn sort_newest_first(records: &mut [MonthlyFeeRecord]) {
    records.sort_by(|a, b| b.year.cmp(&a.year).then(b.month.cmp(&a.month)));
}
