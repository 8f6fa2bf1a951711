//! OpenSASE Orders - Self-hosted Order Management Service

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_orders::api::{self, AppState};
use opensase_orders::inventory::InventoryService;
use opensase_orders::notify::{EventPublisher, NoopNotifier, NotificationSink, WhatsAppSender};
use opensase_orders::orders::OrderService;
use opensase_orders::payment::PaymentService;
use opensase_orders::store::postgres::PgStore;
use opensase_orders::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let store = Arc::new(PgStore::new(db));

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!(error = %err, "NATS connect failed, events disabled");
                None
            }
        },
        None => None,
    };
    let events = EventPublisher::new(nats);

    let whatsapp_verify_token = config
        .whatsapp
        .as_ref()
        .map(|w| w.verify_token.clone())
        .unwrap_or_default();
    let notifier: Arc<dyn NotificationSink> = match config.whatsapp.clone() {
        Some(cfg) => Arc::new(WhatsAppSender::new(cfg)),
        None => {
            tracing::warn!("WhatsApp credentials not set, customer messages disabled");
            Arc::new(NoopNotifier)
        }
    };

    let inventory = Arc::new(InventoryService::new(store.clone(), store.clone()));
    let orders = Arc::new(OrderService::new(
        store.clone(),
        store.clone(),
        config.pricing.clone(),
        notifier.clone(),
        events.clone(),
    ));
    let payments = Arc::new(PaymentService::new(
        store.clone(),
        inventory.clone(),
        notifier.clone(),
        events,
    ));

    let state = AppState {
        catalog: store,
        orders,
        inventory,
        payments,
        notifier,
        currency: config.pricing.currency.clone(),
        whatsapp_verify_token,
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("🚀 OpenSASE Orders listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
