/// Boundary validation failures. Raised before any write and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be a number (got '{raw}')")]
    NotANumber { field: &'static str, raw: String },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("{field} is out of range (got {raw})")]
    OutOfRange { field: &'static str, raw: String },
    #[error("enter a valid UTR/reference number: 8-30 letters or digits (got {length})")]
    ReferenceShape { length: usize },
    #[error("{field} must be a date in YYYY-MM-DD or DD/MM/YYYY form (got '{raw}')")]
    InvalidDate { field: &'static str, raw: String },
    #[error("a timetable needs at least one row")]
    EmptySchedule,
    #[error("timetable row {row} needs day, date and subject")]
    IncompleteScheduleRow { row: usize },
}

/// Trimmed, non-blank text or a [`ValidationError::Missing`].
pub(crate) fn required_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<String, ValidationError> {
    optional_text(value).ok_or(ValidationError::Missing { field })
}

/// Trimmed text, with blank values collapsed to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}
