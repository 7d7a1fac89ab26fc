// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod article;
pub mod classify;
pub mod config;
pub mod enrich;
pub mod error;
pub mod events;
pub mod image;
pub mod metrics;
pub mod retention;
pub mod retry;
pub mod scheduler;
pub mod similarity;
pub mod store;

// The ingestion pipeline and its source adapters.
pub mod ingest;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::article::{Article, Candidate, Category};
pub use crate::config::{SyncConfig, SyncConfigPatch};
pub use crate::error::{SyncError, SyncResult};
pub use crate::events::{EventBus, SyncEvent};
pub use crate::ingest::{Pipeline, RunReport};
pub use crate::scheduler::{SyncScheduler, SyncStatus};
pub use crate::store::{ArticleStore, DynArticleStore, JsonFileStore, MemoryStore};
