//! Sync configuration: the persisted settings the admin surface edits, and
//! the typed patch used to change them. Merging is a pure function so the
//! update path is independently testable.

use serde::{Deserialize, Serialize};

/// Per-adapter enable flags. Each source fails and is toggled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceToggles {
    pub rss: bool,
    pub social: bool,
    pub webhook: bool,
    pub sheets: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            rss: true,
            social: true,
            webhook: true,
            sheets: false,
        }
    }
}

/// Process-wide sync settings, persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Master switch for scheduled runs. Manual sync works regardless.
    pub enabled: bool,
    /// Minutes between priority-cadence runs.
    pub interval_minutes: u32,
    /// Retention cap on the persisted collection.
    pub max_articles: usize,
    pub sources: SourceToggles,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 30,
            max_articles: 200,
            sources: SourceToggles::default(),
        }
    }
}

impl SyncConfig {
    /// Keep intervals and caps positive whatever the input said.
    pub fn sanitized(mut self) -> Self {
        if self.interval_minutes == 0 {
            self.interval_minutes = 1;
        }
        if self.max_articles == 0 {
            self.max_articles = 1;
        }
        self
    }
}

/// The fields an admin update may change. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_articles: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<SourceToggles>,
}

/// Pure merge: apply the patch over the old config, then sanitize.
pub fn merge(old: &SyncConfig, patch: &SyncConfigPatch) -> SyncConfig {
    SyncConfig {
        enabled: patch.enabled.unwrap_or(old.enabled),
        interval_minutes: patch.interval_minutes.unwrap_or(old.interval_minutes),
        max_articles: patch.max_articles.unwrap_or(old.max_articles),
        sources: patch.sources.unwrap_or(old.sources),
    }
    .sanitized()
}
