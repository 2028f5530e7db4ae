use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use school_ledger::config::AppConfig;
use school_ledger::error::AppError;
use school_ledger::telemetry;
use school_ledger::workflows::admit::AdmitCardService;
use school_ledger::workflows::fees::FeeLedgerService;
use school_ledger::workflows::roster::RosterService;
use school_ledger::workflows::store::{InMemoryLedgerStore, RetryPolicy};
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAdminNotifier};
use crate::routes::with_portal_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryLedgerStore::default());
    let notifier = Arc::new(InMemoryAdminNotifier::default());
    let retry = RetryPolicy::from(&config.store);

    let app = with_portal_routes(
        Arc::new(RosterService::with_retry_policy(store.clone(), retry)),
        Arc::new(FeeLedgerService::with_retry_policy(store.clone(), retry)),
        Arc::new(AdmitCardService::with_retry_policy(store, notifier, retry)),
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        read_attempts = retry.attempts(),
        "school ledger service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
