use crate::cli::ServeArgs;
use crate::infra::{demo_dataset, AppState};
use crate::routes::with_fleet_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fleet_ops::config::AppConfig;
use fleet_ops::error::AppError;
use fleet_ops::fleet::alerts::AlertPolicy;
use fleet_ops::fleet::dashboard::{current_date, FleetDashboardService};
use fleet_ops::fleet::fetch::InMemoryFleetRepository;
use fleet_ops::fleet::tenancy::{InMemoryScopeStore, JsonFileScopeStore, ScopeStore};
use fleet_ops::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    match config.fleet.scope_store_dir.clone() {
        Some(dir) => {
            info!(dir = %dir.display(), "persisting scope preferences to disk");
            serve(config, Arc::new(JsonFileScopeStore::new(dir))).await
        }
        None => serve(config, Arc::new(InMemoryScopeStore::default())).await,
    }
}

async fn serve<S>(config: AppConfig, store: Arc<S>) -> Result<(), AppError>
where
    S: ScopeStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryFleetRepository::new(demo_dataset(current_date())));
    let policy =
        AlertPolicy::default().with_maintenance_lookback(config.fleet.maintenance_lookback_days);
    let dashboard_service = Arc::new(FleetDashboardService::new(repository, store, policy));

    let app = with_fleet_routes(dashboard_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "fleet dashboard service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
