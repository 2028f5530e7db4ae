//! Monthly fee ledger: validation of admin input, the fee computation engine
//! and the service that persists ledger entries.

pub mod compute;
pub mod domain;
pub mod router;
pub mod service;
mod validation;


pub use compute::{
    compute_due, compute_net_charge, compute_total_due, sort_newest_first, FeeArithmeticError,
};
pub use domain::{
    FeeEntry, FeeStatement, MonthKey, MonthlyFeeInput, MonthlyFeeRecord, NumericInput,
};
pub use router::fee_router;
pub use service::FeeLedgerService;
