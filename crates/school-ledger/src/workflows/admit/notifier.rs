use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outbound hook telling the school office that a payment needs attention
/// (e.g. a messaging or e-mail adapter).
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify(&self, alert: AdminAlert) -> Result<(), NotifierError>;
}

/// Alert payload so routes and tests can assert the integration boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAlert {
    pub template: String,
    pub exam_id: String,
    pub student_id: String,
    pub details: BTreeMap<String, String>,
}

impl AdminAlert {
    pub const PAYMENT_SUBMITTED: &'static str = "payment_submitted";
    pub const PAYMENT_REVIEWED: &'static str = "payment_reviewed";
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifierError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
