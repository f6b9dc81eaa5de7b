use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState};
use crate::routes::dashboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use faculty_roles::config::AppConfig;
use faculty_roles::error::AppError;
use faculty_roles::telemetry;
use std::sync::atomic::Ordering;
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

    let services = build_services(&config).await?;
    let forms_enabled = services.dashboard.interest_forms().is_some();
    let app_state = AppState::new(services, prometheus_handle);
    let readiness_flag = app_state.readiness.clone();

    let app = dashboard_routes(forms_enabled)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, forms_enabled, "faculty roles dashboard ready");

    axum::serve(listener, app).await?;
    Ok(())
}
