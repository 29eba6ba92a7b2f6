use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_delivery_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use delivery_hub::config::AppConfig;
use delivery_hub::error::AppError;
use delivery_hub::telemetry;
use delivery_hub::DeliveryHub;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.apply(&mut config.server);
    telemetry::init(&config.telemetry)?;

    let (metrics_layer, metrics_handle) = PrometheusMetricLayer::pair();
    let ready = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: Arc::clone(&ready),
        metrics: Arc::new(metrics_handle),
    };

    let hub = DeliveryHub::builder()
        .billing(config.billing)
        .wizard(config.wizard)
        .build();

    let app = with_delivery_routes(hub)
        .layer(Extension(state))
        .layer(metrics_layer);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    ready.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        vat_percent = config.billing.vat_percent,
        wizard_ttl_minutes = config.wizard.ttl_minutes,
        "delivery hub ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
