//! Admin and UI-facing HTTP surface: article read/CRUD, sync configuration,
//! manual sync, status, and the webhook intake endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::article::{make_article_id, Article, Category};
use crate::config::{SyncConfig, SyncConfigPatch};
use crate::enrich::{derive_excerpt, reading_time_minutes, EXCERPT_MAX_CHARS};
use crate::error::SyncError;
use crate::events::{EventBus, SyncEvent};
use crate::image::{fallback_image, is_valid_image_url};
use crate::ingest::adapters::webhook::{WebhookPayload, WebhookQueue};
use crate::scheduler::SyncScheduler;
use crate::store::{ArticleStore, DynArticleStore};

#[derive(Clone)]
pub struct AppState {
    scheduler: Arc<SyncScheduler>,
    store: DynArticleStore,
    webhook: Arc<WebhookQueue>,
    bus: EventBus,
}

impl AppState {
    pub fn new(
        scheduler: Arc<SyncScheduler>,
        store: DynArticleStore,
        webhook: Arc<WebhookQueue>,
        bus: EventBus,
    ) -> Self {
        Self {
            scheduler,
            store,
            webhook,
            bus,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/articles",
            get(list_articles).post(create_article).delete(clear_articles),
        )
        .route("/api/articles/{id}", put(update_article).delete(delete_article))
        .route("/api/articles/{id}/feature", post(toggle_featured))
        .route("/api/config", get(get_config).put(update_config))
        .route("/api/sync", post(manual_sync))
        .route("/api/status", get(get_status))
        .route("/api/webhook", post(receive_webhook))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

fn err(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { error: msg.into() }))
}

type ApiError = (StatusCode, Json<ErrorBody>);

async fn list_articles(State(state): State<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    state
        .store
        .get_all()
        .await
        .map(Json)
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Manual admin create. Bypasses classification and enrichment: the admin's
/// fields are taken as-is; only derived fields (excerpt, reading time) and
/// the image invariant are filled in.
#[derive(serde::Deserialize)]
struct CreateArticleReq {
    title: String,
    content: String,
    category: Category,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    tags: Vec<String>,
}

async fn create_article(
    State(state): State<AppState>,
    Json(req): Json<CreateArticleReq>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(err(StatusCode::UNPROCESSABLE_ENTITY, "title must not be empty"));
    }
    let now = Utc::now();
    let source = req.source.unwrap_or_else(|| "الإدارة".to_string());
    let image = match req.image {
        Some(url) if is_valid_image_url(&url) => url,
        _ => fallback_image(req.category, &req.title).to_string(),
    };
    let article = Article {
        id: make_article_id(&req.title, &source, now),
        title: req.title.trim().to_string(),
        excerpt: derive_excerpt(&req.content, EXCERPT_MAX_CHARS),
        reading_time: reading_time_minutes(&req.content),
        content: req.content,
        category: req.category,
        date: now,
        source,
        image,
        featured: req.featured,
        video_url: req.video_url,
        tags: req.tags,
        original_link: None,
        is_translated: None,
    };

    let mut all = state
        .store
        .get_all()
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    all.insert(0, article.clone());
    let cap = state.scheduler.get_config().max_articles;
    crate::retention::trim(&mut all, cap);
    state
        .store
        .replace_all(all)
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    state.bus.emit(SyncEvent {
        new_count: 1,
        first_run: false,
        cleared: false,
    });
    Ok((StatusCode::CREATED, Json(article)))
}

#[derive(serde::Deserialize, Default)]
struct ArticlePatch {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    featured: Option<bool>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ArticlePatch>,
) -> Result<Json<Article>, ApiError> {
    let mut all = state
        .store
        .get_all()
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let Some(article) = all.iter_mut().find(|a| a.id == id) else {
        return Err(err(StatusCode::NOT_FOUND, "article not found"));
    };
    if let Some(title) = patch.title {
        if title.trim().is_empty() {
            return Err(err(StatusCode::UNPROCESSABLE_ENTITY, "title must not be empty"));
        }
        article.title = title.trim().to_string();
    }
    if let Some(content) = patch.content {
        article.excerpt = derive_excerpt(&content, EXCERPT_MAX_CHARS);
        article.reading_time = reading_time_minutes(&content);
        article.content = content;
    }
    if let Some(category) = patch.category {
        article.category = category;
    }
    if let Some(image) = patch.image {
        if !is_valid_image_url(&image) {
            return Err(err(StatusCode::UNPROCESSABLE_ENTITY, "invalid image url"));
        }
        article.image = image;
    }
    if let Some(video_url) = patch.video_url {
        article.video_url = Some(video_url);
    }
    if let Some(featured) = patch.featured {
        article.featured = featured;
    }
    if let Some(tags) = patch.tags {
        article.tags = tags;
    }
    let updated = article.clone();

    state
        .store
        .replace_all(all)
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(updated))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut all = state
        .store
        .get_all()
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let before = all.len();
    all.retain(|a| a.id != id);
    if all.len() == before {
        return Err(err(StatusCode::NOT_FOUND, "article not found"));
    }
    state
        .store
        .replace_all(all)
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_articles(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .store
        .replace_all(Vec::new())
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    state.bus.emit(SyncEvent {
        new_count: 0,
        first_run: false,
        cleared: true,
    });
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_featured(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let mut all = state
        .store
        .get_all()
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let Some(article) = all.iter_mut().find(|a| a.id == id) else {
        return Err(err(StatusCode::NOT_FOUND, "article not found"));
    };
    article.featured = !article.featured;
    let updated = article.clone();
    state
        .store
        .replace_all(all)
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(updated))
}

async fn get_config(State(state): State<AppState>) -> Json<SyncConfig> {
    Json(state.scheduler.get_config())
}

async fn update_config(
    State(state): State<AppState>,
    Json(patch): Json<SyncConfigPatch>,
) -> Result<Json<SyncConfig>, ApiError> {
    // Persistence failures are surfaced, never swallowed: silently losing a
    // config change would confuse the admin more than an error toast.
    state
        .scheduler
        .update_config(patch)
        .await
        .map(Json)
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn manual_sync(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<crate::ingest::RunReport>), ApiError> {
    match state.scheduler.manual_sync().await {
        Ok(report) => Ok((StatusCode::ACCEPTED, Json(report))),
        Err(SyncError::AlreadyRunning) => Err(err(StatusCode::CONFLICT, "already syncing")),
        Err(e) => Err(err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn get_status(State(state): State<AppState>) -> Json<crate::scheduler::SyncStatus> {
    Json(state.scheduler.get_status().await)
}

async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<StatusCode, ApiError> {
    if state.webhook.push(payload) {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(err(StatusCode::UNPROCESSABLE_ENTITY, "title must not be empty"))
    }
}
