//! Source adapters: pluggable, independently failing candidate producers.

pub mod rss;
pub mod sheets;
pub mod social;
pub mod webhook;

use anyhow::Result;

use crate::article::Candidate;

/// Which config toggle governs an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Rss,
    Social,
    Webhook,
    Sheets,
}

/// One origin of raw candidates. Internal errors should resolve to an `Err`
/// the pipeline catches and logs; an adapter never takes the batch down.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Candidate>>;
    fn name(&self) -> &str;
    fn kind(&self) -> SourceKind;
}
