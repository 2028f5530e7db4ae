//! Student roster, guardian accounts and the guardian dashboard.

pub mod dashboard;
pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use dashboard::GuardianDashboard;
pub use domain::{
    AccountRole, Student, StudentDocument, StudentDraft, TransportMode, UserAccount,
};
pub use router::roster_router;
pub use service::RosterService;
