use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflows::validation::{optional_text, required_text, ValidationError};

/// Examination event the admit card is printed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub exam_id: String,
    pub name: String,
    pub session: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub reporting_time: Option<String>,
    pub venue: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The exam guardians see: the most recently created one.
pub fn latest_exam(exams: Vec<Exam>) -> Option<Exam> {
    exams.into_iter().max_by_key(|exam| exam.created_at)
}

/// Admin-submitted exam details prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamDraft {
    pub name: Option<String>,
    pub session: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub reporting_time: Option<String>,
    pub venue: Option<String>,
}

impl ExamDraft {
    pub fn into_exam(
        self,
        exam_id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Exam, ValidationError> {
        let name = required_text("name", self.name.as_deref())?;
        let session = required_text("session", self.session.as_deref())?;
        let raw_date = required_text("date", self.date.as_deref())?;
        let date = parse_exam_date(&raw_date).ok_or(ValidationError::InvalidDate {
            field: "date",
            raw: raw_date.clone(),
        })?;
        let time = required_text("time", self.time.as_deref())?;
        let venue = required_text("venue", self.venue.as_deref())?;

        Ok(Exam {
            exam_id,
            name,
            session,
            date,
            time,
            reporting_time: optional_text(self.reporting_time.as_deref()),
            venue,
            created_at,
            updated_at,
        })
    }
}

/// Accepts ISO `YYYY-MM-DD` or the form's `DD/MM/YYYY`.
pub fn parse_exam_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

/// One line of a class timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub day: String,
    pub date: NaiveDate,
    pub subject: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleRowInput {
    pub day: Option<String>,
    pub date: Option<String>,
    pub subject: Option<String>,
}

impl ScheduleRowInput {
    fn validate(&self, row: usize) -> Result<ScheduleRow, ValidationError> {
        let incomplete = ValidationError::IncompleteScheduleRow { row };
        let day = optional_text(self.day.as_deref()).ok_or(incomplete.clone())?;
        let date = self
            .date
            .as_deref()
            .and_then(parse_exam_date)
            .ok_or(incomplete.clone())?;
        let subject = optional_text(self.subject.as_deref()).ok_or(incomplete)?;
        Ok(ScheduleRow { day, date, subject })
    }
}

/// Validate timetable rows in order; row numbers in errors are 1-based.
pub fn validate_schedule_rows(
    rows: &[ScheduleRowInput],
) -> Result<Vec<ScheduleRow>, ValidationError> {
    if rows.is_empty() {
        return Err(ValidationError::EmptySchedule);
    }
    rows.iter()
        .enumerate()
        .map(|(index, row)| row.validate(index + 1))
        .collect()
}

/// Timetable for one class of one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSchedule {
    pub exam_id: String,
    pub class_key: String,
    pub rows: Vec<ScheduleRow>,
    pub updated_at: DateTime<Utc>,
}

/// Address of an admit permission document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionKey {
    pub exam_id: String,
    pub student_id: String,
}

impl PermissionKey {
    pub fn new(exam_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            student_id: student_id.into(),
        }
    }
}

/// Per-exam, per-student admit card state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmitPermission {
    pub exam_id: String,
    pub student_id: String,
    #[serde(default)]
    pub issued: bool,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allow_download: bool,
    #[serde(default)]
    pub payment_request: Option<PaymentRequest>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AdmitPermission {
    /// The state assumed when no permission document exists.
    pub fn new(key: &PermissionKey) -> Self {
        Self {
            exam_id: key.exam_id.clone(),
            student_id: key.student_id.clone(),
            issued: false,
            issued_at: None,
            allow_download: false,
            payment_request: None,
            updated_at: None,
        }
    }

    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.exam_id.clone(), self.student_id.clone())
    }

    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment_request.as_ref().map(|request| request.status)
    }

    /// Issuing is sticky; re-issuing keeps the first issue time.
    pub fn issue(&mut self, at: DateTime<Utc>) {
        if !self.issued {
            self.issued = true;
            self.issued_at = Some(at);
        }
        self.updated_at = Some(at);
    }

    /// Manual override set from the admin checkbox.
    pub fn set_allow_download(&mut self, allow_download: bool, at: DateTime<Utc>) {
        self.allow_download = allow_download;
        self.updated_at = Some(at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    PayAtSchool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Submitted,
    Verified,
    Rejected,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Submitted => "submitted",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Guardian's latest payment claim. Only the most recent one is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utr: Option<String>,
    pub reference_id: String,
    pub note: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}
