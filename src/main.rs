//! Nashra Sync Engine — Binary Entrypoint
//! Boots the Axum HTTP server and the sync scheduler, wiring the store,
//! source adapters, and admin routes.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nashra_sync_engine::classify::Classifier;
use nashra_sync_engine::enrich::{DisabledRewriteProvider, Enricher, HttpRewriteProvider};
use nashra_sync_engine::image::{HttpImageProbe, ImageAssurance};
use nashra_sync_engine::ingest::adapters::{
    rss::RssAdapter, sheets::SheetsAdapter, social::SocialPageAdapter, webhook::WebhookAdapter,
    webhook::WebhookQueue, SourceAdapter,
};
use nashra_sync_engine::metrics::Metrics;
use nashra_sync_engine::similarity::SimilarityParams;
use nashra_sync_engine::{
    create_router, AppState, ArticleStore, EventBus, JsonFileStore, Pipeline, SyncConfig,
    SyncScheduler,
};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - SYNC_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("SYNC_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sync=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Build the adapter set: live feeds when URLs are configured, embedded
/// fixtures otherwise so local runs work offline.
fn build_adapters(webhook: Arc<WebhookQueue>) -> Vec<Arc<dyn SourceAdapter>> {
    let rss: Arc<dyn SourceAdapter> = match std::env::var("NASHRA_RSS_URL") {
        Ok(url) => Arc::new(RssAdapter::from_url("وكالة الأنباء", url)),
        Err(_) => Arc::new(RssAdapter::from_fixture_str(
            "وكالة الأنباء",
            include_str!("../tests/fixtures/rss_news.xml"),
        )),
    };

    let social: Arc<dyn SourceAdapter> = Arc::new(
        SocialPageAdapter::from_fixture_str(include_str!("../tests/fixtures/social_pages.json"))
            .expect("embedded social fixture parses"),
    );

    let mut adapters = vec![rss, social, Arc::new(WebhookAdapter::new(webhook)) as _];
    if let Ok(url) = std::env::var("NASHRA_SHEETS_URL") {
        adapters.push(Arc::new(SheetsAdapter::from_url(url)) as _);
    }
    adapters
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // --- Store and persisted config ---
    let store: nashra_sync_engine::DynArticleStore = Arc::new(JsonFileStore::new("state"));
    let config = match store.load_config().await {
        Ok(Some(cfg)) => cfg,
        Ok(None) => SyncConfig::default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load persisted config, using defaults");
            SyncConfig::default()
        }
    };

    let metrics = Metrics::init(config.interval_minutes);

    // --- Pipeline wiring ---
    let webhook = WebhookQueue::new();
    let bus = EventBus::new();
    let rewriter: nashra_sync_engine::enrich::DynRewriteProvider =
        match HttpRewriteProvider::from_env() {
            Some(p) => Arc::new(p),
            None => Arc::new(DisabledRewriteProvider),
        };
    let pipeline = Pipeline::new(
        store.clone(),
        Classifier::offline(),
        Enricher::new(rewriter, "خبري"),
        ImageAssurance::new(Arc::new(HttpImageProbe::new())),
        SimilarityParams::default(),
        bus.clone(),
        build_adapters(webhook.clone()),
    );

    // --- Scheduler (owned here, passed by handle) ---
    let scheduler = Arc::new(SyncScheduler::new(pipeline, store.clone(), config));
    scheduler.start();

    let state = AppState::new(scheduler, store, webhook, bus);
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
