use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_pulse::config::PulseConfig;
use order_pulse::dashboard::{DashboardSession, SystemClock};
use order_pulse::domain::order::{
    DeliveryAddress, NewOrder, OrderCommand, OrderLifecycleManager, OrderStatus,
};
use order_pulse::hub::{Broadcaster, NotifyKind};
use order_pulse::metrics::{self, Metrics};
use order_pulse::store::InMemoryOrderStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_pulse=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order pulse");

    // === 1. Configuration ===
    let config = PulseConfig::load()?;
    tracing::info!(
        window_width_ms = config.window.window_width_ms,
        bucket_width_ms = config.window.bucket_width_ms,
        tick_interval_ms = config.window.tick_interval_ms,
        subscriber_buffer = config.hub.subscriber_buffer,
        "Configuration loaded"
    );

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    if config.metrics.enabled {
        let served = metrics.clone();
        let port = config.metrics.port;
        std::thread::spawn(move || {
            let system = actix_web::rt::System::new();
            if let Err(e) = system.block_on(metrics::start_metrics_server(served, port)) {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    }

    // === 3. Hub, store and lifecycle manager ===
    let hub = Broadcaster::spawn(&config.hub, metrics.clone());
    let store = Arc::new(InMemoryOrderStore::new());
    let manager = OrderLifecycleManager::new(store, hub.clone(), metrics.clone());

    // === 4. Two dashboards watching the same hub ===
    let clock = Arc::new(SystemClock);
    let first = DashboardSession::spawn(&hub, &config.window, clock.clone(), metrics.clone()).await?;
    let second = DashboardSession::spawn(&hub, &config.window, clock, metrics.clone()).await?;

    // === 5. Demonstrate the order lifecycle ===
    tracing::info!("📝 Demonstrating order lifecycle");

    let order = manager
        .create(NewOrder {
            order_number: "ORD-1".to_string(),
            description: "Two boxes of ceramic tiles".to_string(),
            value: Decimal::new(12990, 2),
            delivery_address: DeliveryAddress {
                cep: "01001-000".to_string(),
                street: "Praca da Se".to_string(),
                number: "100".to_string(),
                neighborhood: "Se".to_string(),
                city: "Sao Paulo".to_string(),
                state: "SP".to_string(),
            },
            owner_id: "demo-user".to_string(),
            owner_name: Some("Demo".to_string()),
        })
        .await?;

    if let Err(e) = manager.create(NewOrder {
        order_number: order.order_number.clone(),
        description: "Same number again".to_string(),
        value: Decimal::ONE,
        delivery_address: order.delivery_address.clone(),
        owner_id: "demo-user".to_string(),
        owner_name: None,
    })
    .await
    {
        tracing::info!("Second create rejected as expected: {}", e);
    }

    manager
        .handle(OrderCommand::SetStatus {
            order_id: order.id,
            status: OrderStatus::Delivered,
        })
        .await?;

    // Let a few ticks pass so both sessions redraw.
    tokio::time::sleep(Duration::from_millis(config.window.tick_interval_ms * 2)).await;

    for (name, session) in [("first", &first), ("second", &second)] {
        let frame = session.latest();
        tracing::info!(
            dashboard = name,
            range = %frame.time_range,
            new_orders = frame.total(NotifyKind::NewOrder),
            delivered = frame.total(NotifyKind::Delivered),
            y_max = frame.y_max,
            "Dashboard frame"
        );
    }

    tracing::info!("📦 {} order(s) in store", manager.list().await?.len());

    // === 6. Shutdown ===
    first.shutdown().await;
    second.shutdown().await;
    hub.shutdown().await;

    tracing::info!("👋 Order pulse stopped");
    Ok(())
}
