use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use personeltak::config::AppConfig;
use personeltak::error::AppError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(
    mut config: AppConfig,
    workbook: PathBuf,
    mut args: ServeArgs,
) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let addr = config.server.socket_addr()?;
    let environment = config.environment;

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        config: Arc::new(config),
        workbook: Arc::new(workbook),
    };
    let workbook_display = app_state.workbook.display().to_string();

    let app = router(app_state).layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?environment, %addr, workbook = %workbook_display, "personeltak service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
