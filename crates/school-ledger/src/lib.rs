//! Fee ledger, admit-card eligibility and payment verification for a school
//! administration portal.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
