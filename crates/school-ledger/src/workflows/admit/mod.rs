//! Exams, class timetables and the admit-card gate, including the guardian
//! payment claim and its admin review.

pub mod class_key;
pub mod domain;
pub mod eligibility;
pub mod notifier;
pub mod payment;
pub mod router;
pub mod service;


pub use domain::{
    latest_exam, AdmitPermission, ClassSchedule, Exam, ExamDraft, PaymentMethod, PaymentRequest,
    PaymentStatus, PermissionKey, ScheduleRow, ScheduleRowInput,
};
pub use eligibility::{evaluate, BlockReason, Eligibility, EligibilityView, UnlockPath};
pub use notifier::{AdminAlert, AdminNotifier, NotifierError};
pub use payment::{PaymentSubmission, ReviewDecision, TransitionError};
pub use router::admit_router;
pub use service::AdmitCardService;
