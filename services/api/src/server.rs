use crate::cli::ServeArgs;
use crate::infra::{
    default_notification_rules, AppState, InMemorySheetStore, InMemorySmsGateway,
};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use taxprep::config::AppConfig;
use taxprep::error::AppError;
use taxprep::telemetry;
use taxprep::workflows::intake::{default_auto_replies, InboundLog, IntakeService, IntakeState, SmsOutbox};
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

    let store = Arc::new(InMemorySheetStore::with_standard_worksheets());
    let outbox = Arc::new(SmsOutbox::default());
    let gateway = Arc::new(InMemorySmsGateway::default());
    let intake_service = Arc::new(IntakeService::new(
        store,
        outbox.clone(),
        default_notification_rules(),
    ));
    let intake_state = IntakeState {
        service: intake_service,
        outbox,
        gateway,
        inbound: Arc::new(InboundLog::default()),
        auto_replies: Arc::new(default_auto_replies()),
    };

    let app = with_intake_routes(intake_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tax prep collection service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
