//! Typed failure taxonomy for the sync engine.
//!
//! Nothing below the scheduler throws past its own boundary: adapter,
//! classification, enrichment, and image failures are recovered locally and
//! downgraded to warnings. The variants here are what crosses a boundary on
//! purpose: whole-run failures (retried per cadence policy) and config
//! persistence failures (surfaced to the admin caller).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A single source's fetch failed or timed out. Recovered locally.
    #[error("adapter `{adapter}` failed: {reason}")]
    AdapterFailure { adapter: String, reason: String },

    /// A whole pipeline run failed after per-call recovery.
    #[error("sync run failed: {0}")]
    RunFailure(String),

    /// All retries for a cadence were exhausted.
    #[error("cadence `{cadence}` gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        cadence: String,
        attempts: u32,
        last_error: String,
    },

    /// Persisting the configuration failed. Surfaced to the admin UI,
    /// never retried silently.
    #[error("config persistence failed: {0}")]
    ConfigPersistence(String),

    /// A manual sync was requested while a run is already in flight.
    #[error("a sync is already running")]
    AlreadyRunning,

    /// Reading or writing the article collection failed.
    #[error("store error: {0}")]
    Store(String),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
