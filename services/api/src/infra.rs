use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use school_ledger::workflows::admit::{AdminAlert, AdminNotifier, NotifierError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Admin notifier that logs each alert and keeps it in memory until a
/// messaging integration is wired in.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAdminNotifier {
    events: Arc<Mutex<Vec<AdminAlert>>>,
}

impl InMemoryAdminNotifier {
    pub(crate) fn events(&self) -> Vec<AdminAlert> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AdminNotifier for InMemoryAdminNotifier {
    async fn notify(&self, alert: AdminAlert) -> Result<(), NotifierError> {
        info!(
            template = %alert.template,
            exam_id = %alert.exam_id,
            student_id = %alert.student_id,
            "admin alert queued"
        );
        self.events
            .lock()
            .map_err(|_| NotifierError::Transport("alert queue poisoned".to_string()))?
            .push(alert);
        Ok(())
    }
}
