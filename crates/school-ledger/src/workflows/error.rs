use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::admit::notifier::NotifierError;
use super::admit::payment::TransitionError;
use super::fees::compute::FeeArithmeticError;
use super::store::RepositoryError;
use super::validation::ValidationError;

/// Error raised by the ledger, admit-card and roster services.
#[derive(Debug, thiserror::Error)]
pub enum LedgerServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Notifier(#[from] NotifierError),
    #[error(transparent)]
    Arithmetic(#[from] FeeArithmeticError),
    #[error("account {0} is not linked to a student profile")]
    NotLinked(String),
    #[error("account {0} is not a guardian account")]
    NotGuardian(String),
}

impl LedgerServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerServiceError::Validation(_) => "validation",
            LedgerServiceError::Repository(RepositoryError::NotFound) => "not_found",
            LedgerServiceError::Repository(RepositoryError::Conflict) => "conflict",
            LedgerServiceError::Repository(RepositoryError::Unavailable(_)) => {
                "backend_unavailable"
            }
            LedgerServiceError::Transition(_) => "invalid_transition",
            LedgerServiceError::Notifier(_) => "notification_failed",
            LedgerServiceError::Arithmetic(_) => "ledger_overflow",
            LedgerServiceError::NotLinked(_) => "not_linked",
            LedgerServiceError::NotGuardian(_) => "not_guardian",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            LedgerServiceError::Repository(RepositoryError::Conflict)
            | LedgerServiceError::Transition(_) => StatusCode::CONFLICT,
            LedgerServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LedgerServiceError::Notifier(_) => StatusCode::BAD_GATEWAY,
            LedgerServiceError::Arithmetic(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerServiceError::NotLinked(_) | LedgerServiceError::NotGuardian(_) => {
                StatusCode::FORBIDDEN
            }
        }
    }
}

impl IntoResponse for LedgerServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (status, body).into_response()
    }
}
