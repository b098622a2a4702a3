use crate::cli::ServeArgs;
use crate::infra::{seed_demo_catalog, AppState};
use crate::routes::with_adoption_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use pawhaven::config::{AppConfig, AppEnvironment};
use pawhaven::error::AppError;
use pawhaven::telemetry;
use pawhaven::workflows::adoption::{
    AdoptionApi, ApplicationWorkflow, InMemoryAdoptionStore, InMemoryAssetStore, PaymentWorkflow,
};
use tracing::info;

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryAdoptionStore::new());
    let assets = Arc::new(InMemoryAssetStore::new());
    if config.environment == AppEnvironment::Development {
        seed_demo_catalog(&store).map_err(|err| AppError::Workflow(err.into()))?;
        info!("seeded development catalog");
    }
    let api = Arc::new(AdoptionApi {
        applications: ApplicationWorkflow::new(store.clone(), config.workflow),
        payments: PaymentWorkflow::new(store, assets, config.workflow),
    });

    let app = with_adoption_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "adoption service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
