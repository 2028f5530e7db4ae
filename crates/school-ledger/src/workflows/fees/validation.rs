use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::domain::{FeeEntry, MonthlyFeeInput, NumericInput};
use crate::workflows::validation::ValidationError;

const MONEY_DECIMAL_PLACES: u32 = 2;
const MIN_YEAR: f64 = 1900.0;
const MAX_YEAR: f64 = 9999.0;
/// Upper bound for any single money field. Keeps ledger sums well inside
/// `Decimal` range.
const MAX_MONEY: f64 = 1_000_000_000_000.0;

impl MonthlyFeeInput {
    /// Coerce and check every field. Month, year, tuition and paid amount are
    /// required; a missing transport charge counts as zero.
    pub fn validate(&self) -> Result<FeeEntry, ValidationError> {
        let month = whole_number("month", self.month.as_ref(), 1.0, 12.0)?;
        let year = whole_number("year", self.year.as_ref(), MIN_YEAR, MAX_YEAR)?;
        let tuition_charge = money("tuition_charge", self.tuition_charge.as_ref())?;
        let transport_charge = match self.transport_charge.as_ref() {
            Some(input) if input.coerce().is_some() => money("transport_charge", Some(input))?,
            _ => Decimal::ZERO,
        };
        let paid_amount = money("paid_amount", self.paid_amount.as_ref())?;

        Ok(FeeEntry {
            year: year as i32,
            month: month as u32,
            tuition_charge,
            transport_charge,
            paid_amount,
        })
    }
}

fn finite(field: &'static str, input: Option<&NumericInput>) -> Result<f64, ValidationError> {
    let input = input.ok_or(ValidationError::Missing { field })?;
    let value = input.coerce().ok_or(ValidationError::Missing { field })?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber {
            field,
            raw: input.to_string(),
        });
    }
    Ok(value)
}

fn whole_number(
    field: &'static str,
    input: Option<&NumericInput>,
    min: f64,
    max: f64,
) -> Result<f64, ValidationError> {
    let value = finite(field, input)?;
    if value.fract() != 0.0 || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            raw: value.to_string(),
        });
    }
    Ok(value)
}

fn money(field: &'static str, input: Option<&NumericInput>) -> Result<Decimal, ValidationError> {
    let value = finite(field, input)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field });
    }
    if value > MAX_MONEY {
        return Err(ValidationError::OutOfRange {
            field,
            raw: value.to_string(),
        });
    }

    let exact = match input {
        Some(NumericInput::Text(raw)) => Decimal::from_str(raw.trim()).ok(),
        _ => None,
    };
    exact
        .or_else(|| Decimal::from_f64(value))
        .map(|amount| {
            amount.round_dp_with_strategy(
                MONEY_DECIMAL_PLACES,
                RoundingStrategy::MidpointAwayFromZero,
            )
        })
        .ok_or(ValidationError::OutOfRange {
            field,
            raw: value.to_string(),
        })
}
