use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::compute::{compute_due, FeeArithmeticError};

/// Ledger document id within a student's fee subcollection: `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self(format!("{year}-{month:02}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One month of charges and payments for a student.
///
/// `net_charge` and `due_amount` are persisted alongside the raw figures but
/// older documents may lack them, so reads go through [`MonthlyFeeRecord::net`]
/// and [`MonthlyFeeRecord::due`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFeeRecord {
    pub month_key: MonthKey,
    pub year: i32,
    pub month: u32,
    pub tuition_charge: Decimal,
    #[serde(default)]
    pub transport_charge: Decimal,
    pub paid_amount: Decimal,
    #[serde(default)]
    pub net_charge: Option<Decimal>,
    #[serde(default)]
    pub due_amount: Option<Decimal>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MonthlyFeeRecord {
    pub fn net(&self) -> Result<Decimal, FeeArithmeticError> {
        match self.net_charge {
            Some(net) => Ok(net),
            None => self
                .tuition_charge
                .checked_add(self.transport_charge)
                .ok_or(FeeArithmeticError::Overflow("net_charge")),
        }
    }

    /// Stored due amount, recomputed when absent. Negative values are credit.
    pub fn due(&self) -> Result<Decimal, FeeArithmeticError> {
        match self.due_amount {
            Some(due) => Ok(due),
            None => compute_due(self.net()?, self.paid_amount),
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self.due(), Ok(due) if due <= Decimal::ZERO)
    }
}

/// Raw numeric field as typed into the admin form: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// `None` for blank text. Unparseable text coerces to NaN so the caller's
    /// finiteness check rejects it.
    pub fn coerce(&self) -> Option<f64> {
        match self {
            NumericInput::Number(value) => Some(*value),
            NumericInput::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.parse::<f64>().unwrap_or(f64::NAN))
                }
            }
        }
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Number(value) => write!(f, "{value}"),
            NumericInput::Text(raw) => f.write_str(raw),
        }
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

/// Admin-submitted monthly fee entry prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFeeInput {
    #[serde(default)]
    pub month: Option<NumericInput>,
    #[serde(default)]
    pub year: Option<NumericInput>,
    #[serde(default)]
    pub tuition_charge: Option<NumericInput>,
    #[serde(default)]
    pub transport_charge: Option<NumericInput>,
    #[serde(default)]
    pub paid_amount: Option<NumericInput>,
}

/// Fee entry that passed boundary validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEntry {
    pub year: i32,
    pub month: u32,
    pub tuition_charge: Decimal,
    pub transport_charge: Decimal,
    pub paid_amount: Decimal,
}

impl FeeEntry {
    pub fn month_key(&self) -> MonthKey {
        MonthKey::new(self.year, self.month)
    }
}

/// Ledger listing returned to the admin and guardian views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeStatement {
    pub student_id: String,
    pub records: Vec<MonthlyFeeRecord>,
    pub total_due: Decimal,
}
