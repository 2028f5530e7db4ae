//! Fee ledger, admit-card and roster workflows backed by a [`store::LedgerStore`].

pub mod admit;
pub mod error;
pub mod fees;
pub mod roster;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::LedgerServiceError;
pub use validation::ValidationError;
